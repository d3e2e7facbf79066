//! Typed field extraction
//!
//! Reads a named child element of a parent [`Node`] and converts its text to
//! the requested type. Extraction never fails: a missing or unparseable child
//! yields the caller's default (or the type's zero value) and records the
//! field name in the owner's error ledger through [`ErrorReporter`].
//!
//! A successful extraction never clears a previously recorded error. Errors
//! are cleared explicitly with `set_error_state(name, false)`.
//!
//! Scalars are converted by their [`FieldText::parse_text`] impl;
//! [`FieldText::KIND`] only names the kind in failure logs. Enumerations go
//! through [`FieldEnum`] and strings have their own required/optional rules.

use crate::models::config::BindingConfig;
use crate::models::observable::ErrorReporter;
use crate::parser::node::Node;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::fmt;
use uuid::Uuid;

/// Type descriptor used to pick a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
    Boolean,
    Character,
    DateTime,
    Identifier,
    Enumeration,
    Text,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Boolean => "boolean",
            FieldKind::Character => "character",
            FieldKind::DateTime => "date/time",
            FieldKind::Identifier => "identifier",
            FieldKind::Enumeration => "enumeration",
            FieldKind::Text => "text",
        };
        f.write_str(name)
    }
}

/// Scalar that can be read from element text
pub trait FieldText: Sized {
    const KIND: FieldKind;

    /// Parse already-trimmed text, `None` when it is not a valid value
    fn parse_text(text: &str) -> Option<Self>;
}

macro_rules! impl_field_text_from_str {
    ($kind:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl FieldText for $ty {
                const KIND: FieldKind = $kind;

                fn parse_text(text: &str) -> Option<Self> {
                    text.parse().ok()
                }
            }
        )+
    };
}

impl_field_text_from_str!(FieldKind::Integer => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
impl_field_text_from_str!(FieldKind::Float => f32, f64);

impl FieldText for bool {
    const KIND: FieldKind = FieldKind::Boolean;

    fn parse_text(text: &str) -> Option<Self> {
        if text.eq_ignore_ascii_case("true") {
            Some(true)
        } else if text.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }
}

impl FieldText for char {
    const KIND: FieldKind = FieldKind::Character;

    fn parse_text(text: &str) -> Option<Self> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }
}

impl FieldText for Uuid {
    const KIND: FieldKind = FieldKind::Identifier;

    fn parse_text(text: &str) -> Option<Self> {
        Uuid::parse_str(text).ok()
    }
}

impl FieldText for DateTime<Utc> {
    const KIND: FieldKind = FieldKind::DateTime;

    fn parse_text(text: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl FieldText for NaiveDateTime {
    const KIND: FieldKind = FieldKind::DateTime;

    fn parse_text(text: &str) -> Option<Self> {
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    }
}

impl FieldText for NaiveDate {
    const KIND: FieldKind = FieldKind::DateTime;

    fn parse_text(text: &str) -> Option<Self> {
        NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
    }
}

impl FieldText for NaiveTime {
    const KIND: FieldKind = FieldKind::DateTime;

    fn parse_text(text: &str) -> Option<Self> {
        ["%H:%M:%S%.f", "%H:%M"]
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
    }
}

/// Enumeration read from element text by exact, case-sensitive variant name.
///
/// Usually implemented through [`field_enum!`](crate::field_enum).
pub trait FieldEnum: Sized + Copy {
    /// Variant names in declaration order
    const VARIANTS: &'static [&'static str];

    fn from_name(name: &str) -> Option<Self>;

    fn name(&self) -> &'static str;
}

/// Declare an enum together with its [`FieldEnum`] name table.
///
/// The enum derives `Debug, Clone, Copy, PartialEq, Eq, Hash`; extra
/// attributes are passed through.
///
/// ```
/// viewbind::field_enum! {
///     pub enum Tone { Neutral, Formal }
/// }
///
/// use viewbind::FieldEnum;
/// assert_eq!(Tone::from_name("Formal"), Some(Tone::Formal));
/// assert_eq!(Tone::from_name("formal"), None);
/// ```
#[macro_export]
macro_rules! field_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $crate::parser::extract::FieldEnum for $name {
            const VARIANTS: &'static [&'static str] = &[$(stringify!($variant)),+];

            fn from_name(name: &str) -> Option<Self> {
                match name {
                    $(stringify!($variant) => Some(Self::$variant),)+
                    _ => None,
                }
            }

            fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)+
                }
            }
        }
    };
}

/// Why a field was flagged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Missing,
    Unparseable,
    Required,
}

impl Failure {
    fn reason(self) -> &'static str {
        match self {
            Failure::Missing => "missing",
            Failure::Unparseable => "unparseable",
            Failure::Required => "required",
        }
    }
}

/// Reads a batch of fields from one parent element into one owner.
///
/// Besides updating the owner's ledger, the reader remembers whether any
/// field in the batch was flagged.
pub struct FieldReader<'a, R: ErrorReporter + ?Sized> {
    parent: &'a Node,
    owner: &'a mut R,
    trim: bool,
    had_error: bool,
}

impl<'a, R: ErrorReporter + ?Sized> FieldReader<'a, R> {
    pub fn new(parent: &'a Node, owner: &'a mut R) -> Self {
        Self::with_config(parent, owner, &BindingConfig::default())
    }

    pub fn with_config(parent: &'a Node, owner: &'a mut R, config: &BindingConfig) -> Self {
        Self {
            parent,
            owner,
            trim: config.trim_scalar_text,
            had_error: false,
        }
    }

    /// Whether any extraction through this reader flagged an error
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    /// Required scalar with an explicit default
    pub fn value<T: FieldText>(&mut self, name: &str, default: T) -> T {
        match self.scalar(name) {
            Ok(value) => value,
            Err(failure) => {
                self.flag(name, T::KIND, failure);
                default
            }
        }
    }

    /// Nullable scalar; the default may itself be `None`
    pub fn optional<T: FieldText>(&mut self, name: &str, default: Option<T>) -> Option<T> {
        match self.scalar(name) {
            Ok(value) => Some(value),
            Err(failure) => {
                self.flag(name, T::KIND, failure);
                default
            }
        }
    }

    /// Scalar that falls back to the type's zero value
    pub fn value_or_zero<T: FieldText + Default>(&mut self, name: &str) -> T {
        self.value(name, T::default())
    }

    /// Enumeration matched by exact variant name
    pub fn enumeration<E: FieldEnum>(&mut self, name: &str, default: E) -> E {
        let parsed = match self.parent.child(name) {
            None => Err(Failure::Missing),
            Some(child) => {
                let text = child.value();
                E::from_name(self.scalar_text(&text)).ok_or(Failure::Unparseable)
            }
        };

        match parsed {
            Ok(value) => value,
            Err(failure) => {
                self.flag(name, FieldKind::Enumeration, failure);
                default
            }
        }
    }

    /// String field. Absent or empty text is an error only when `required`.
    pub fn string(&mut self, name: &str, default: &str, required: bool) -> String {
        let text = self
            .parent
            .child(name)
            .map(Node::value)
            .filter(|text| !text.is_empty());

        match text {
            Some(text) => text,
            None => {
                if required {
                    self.flag(name, FieldKind::Text, Failure::Required);
                }
                default.to_string()
            }
        }
    }

    /// String field with an empty default
    pub fn string_or_empty(&mut self, name: &str, required: bool) -> String {
        self.string(name, "", required)
    }

    fn scalar<T: FieldText>(&self, name: &str) -> Result<T, Failure> {
        let child = self.parent.child(name).ok_or(Failure::Missing)?;
        let text = child.value();
        T::parse_text(self.scalar_text(&text)).ok_or(Failure::Unparseable)
    }

    fn scalar_text<'t>(&self, text: &'t str) -> &'t str {
        if self.trim {
            text.trim()
        } else {
            text
        }
    }

    fn flag(&mut self, name: &str, kind: FieldKind, failure: Failure) {
        tracing::debug!(
            element = self.parent.name(),
            field = name,
            kind = %kind,
            reason = failure.reason(),
            "field extraction failed"
        );
        self.had_error = true;
        self.owner.set_error_state(name, true);
    }
}

/// Required scalar: the child's parsed text, or `default` with an error recorded
pub fn child_value<T: FieldText, R: ErrorReporter + ?Sized>(
    parent: &Node,
    name: &str,
    owner: &mut R,
    default: T,
) -> T {
    FieldReader::new(parent, owner).value(name, default)
}

/// Nullable scalar: like [`child_value`] with an optional default
pub fn child_value_opt<T: FieldText, R: ErrorReporter + ?Sized>(
    parent: &Node,
    name: &str,
    owner: &mut R,
    default: Option<T>,
) -> Option<T> {
    FieldReader::new(parent, owner).optional(name, default)
}

/// Scalar falling back to `T::default()` on failure
pub fn child_value_or_zero<T: FieldText + Default, R: ErrorReporter + ?Sized>(
    parent: &Node,
    name: &str,
    owner: &mut R,
) -> T {
    FieldReader::new(parent, owner).value_or_zero(name)
}

/// Enumeration by exact variant name, or `default` with an error recorded
pub fn child_enum<E: FieldEnum, R: ErrorReporter + ?Sized>(
    parent: &Node,
    name: &str,
    owner: &mut R,
    default: E,
) -> E {
    FieldReader::new(parent, owner).enumeration(name, default)
}

/// String with a default; absent/empty text is flagged only when `required`
pub fn child_string<R: ErrorReporter + ?Sized>(
    parent: &Node,
    name: &str,
    owner: &mut R,
    default: &str,
    required: bool,
) -> String {
    FieldReader::new(parent, owner).string(name, default, required)
}

/// String with an empty default
pub fn child_string_or_empty<R: ErrorReporter + ?Sized>(
    parent: &Node,
    name: &str,
    owner: &mut R,
    required: bool,
) -> String {
    FieldReader::new(parent, owner).string_or_empty(name, required)
}
