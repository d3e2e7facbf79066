//! Language unit presentation object
//!
//! A named, sized piece of text (chapter, paragraph, ...) bound to the UI.
//! Saved as an element named after its category:
//!
//! ```text
//! <Chapter Id="..."><Name>Intro</Name><Length>12</Length></Chapter>
//! ```

use crate::field_enum;
use crate::models::config::BindingConfig;
use crate::models::observable::ObservableObject;
use crate::parser::extract::{FieldEnum, FieldReader};
use crate::parser::node::Node;
use uuid::Uuid;

pub const ID_ATTRIBUTE: &str = "Id";
pub const NAME_FIELD: &str = "Name";
pub const LENGTH_FIELD: &str = "Length";
pub const LANGUAGE_TYPE_FIELD: &str = "LanguageType";

field_enum! {
    /// Category of a language unit
    #[derive(Default)]
    pub enum LanguageType {
        Chapter,
        Paragraph,
        Sentence,
        Phrase,
        Word,
        #[default]
        Other,
    }
}

/// Language unit with change tracking and field validation
#[derive(Debug)]
pub struct LanguageUnit {
    base: ObservableObject,
    language_type: LanguageType,
    name: String,
    length: i32,
}

impl LanguageUnit {
    pub fn new() -> Self {
        Self::with_base(ObservableObject::new())
    }

    pub fn with_config(config: &BindingConfig) -> Self {
        Self::with_base(ObservableObject::with_config(config))
    }

    fn with_base(base: ObservableObject) -> Self {
        Self {
            base,
            language_type: LanguageType::default(),
            name: String::new(),
            length: 0,
        }
    }

    pub fn base(&self) -> &ObservableObject {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut ObservableObject {
        &mut self.base
    }

    pub fn id(&self) -> Uuid {
        self.base.id()
    }

    pub fn language_type(&self) -> LanguageType {
        self.language_type
    }

    pub fn set_language_type(&mut self, value: LanguageType) {
        self.base.set_changed_state(&self.language_type, &value);
        self.language_type = value;
        self.base.notify_property_changed(LANGUAGE_TYPE_FIELD);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.base.set_changed_state(&self.name, &value);
        self.name = value;
        self.base.notify_property_changed(NAME_FIELD);
    }

    pub fn length(&self) -> i32 {
        self.length
    }

    pub fn set_length(&mut self, value: i32) {
        self.base.set_changed_state(&self.length, &value);
        self.length = value;
        self.base.notify_property_changed(LENGTH_FIELD);
    }

    /// Element representation of the unit
    pub fn to_node(&self) -> Node {
        Node::new(self.language_type.name())
            .with_attribute(ID_ATTRIBUTE, self.base.id().to_string())
            .with_child(Node::new(NAME_FIELD).with_text(self.name.as_str()))
            .with_child(Node::new(LENGTH_FIELD).with_text(self.length.to_string()))
    }

    /// Load a unit from its element using default binding settings
    pub fn from_node(node: &Node) -> Self {
        Self::from_node_with_config(node, &BindingConfig::default())
    }

    /// Load a unit from its element.
    ///
    /// Never fails: invalid fields fall back to defaults and are listed in
    /// `base().error_fields()`. An `Id` that is not a UUID is replaced by a
    /// fresh identity.
    pub fn from_node_with_config(node: &Node, config: &BindingConfig) -> Self {
        let base = match node.attribute(ID_ATTRIBUTE).map(|id| Uuid::parse_str(id.trim())) {
            Some(Ok(id)) => {
                let mut base = ObservableObject::with_id(id);
                base.set_track_changes(config.track_changes);
                base
            }
            Some(Err(e)) => {
                tracing::warn!(element = node.name(), error = %e, "ignoring non-UUID Id attribute");
                ObservableObject::with_config(config)
            }
            None => ObservableObject::with_config(config),
        };
        let mut unit = Self::with_base(base);

        match LanguageType::from_name(node.name()) {
            Some(language_type) => unit.language_type = language_type,
            None => unit.base.set_error_state(LANGUAGE_TYPE_FIELD, true),
        }

        let mut reader = FieldReader::with_config(node, &mut unit.base, config);
        let name = reader.string_or_empty(NAME_FIELD, true);
        let length = reader.value(LENGTH_FIELD, 0i32);
        if reader.had_error() {
            tracing::debug!(element = node.name(), "language unit loaded with errors");
        }

        unit.name = name;
        unit.length = length;
        unit
    }
}

impl Default for LanguageUnit {
    fn default() -> Self {
        Self::new()
    }
}
