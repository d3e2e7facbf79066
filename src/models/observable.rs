//! Observable base for presentation objects
//!
//! `ObservableObject` is embedded in any object that is bound to a UI. It
//! carries the object's identity, the changed flag, the error ledger and the
//! listener registry. Listeners subscribe to a single [`Channel`] and receive
//! [`ChangeEvent`]s synchronously, in registration order, at the moment the
//! owning object raises them.

use crate::models::config::BindingConfig;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use std::sync::mpsc::Sender;
use uuid::Uuid;

/// Field name raised on `PropertyChanged` after a change comparison
pub const IS_CHANGED: &str = "IsChanged";

/// Field name raised on `PropertyChanged` after every error state update
pub const HAS_ERROR: &str = "HasError";

/// Notification channel a listener subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// A field's value or derived state was updated
    PropertyChanged,
    /// A whole collection should be refreshed
    CollectionChanged,
    /// An item was added to a collection
    CollectionItemAdded,
    /// An item was removed from a collection
    CollectionItemRemoved,
    /// A field entered the error ledger
    ErrorExists,
}

impl Channel {
    /// Collection action carried by the collection channels
    pub fn collection_action(&self) -> Option<CollectionAction> {
        match self {
            Channel::CollectionChanged => Some(CollectionAction::Refresh),
            Channel::CollectionItemAdded => Some(CollectionAction::Add),
            Channel::CollectionItemRemoved => Some(CollectionAction::Remove),
            Channel::PropertyChanged | Channel::ErrorExists => None,
        }
    }
}

/// Kind of collection mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionAction {
    Refresh,
    Add,
    Remove,
}

/// Event delivered to listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Identity of the object that raised the event
    pub source: Uuid,
    /// Channel the event was raised on
    pub channel: Channel,
    /// Field or collection name
    pub name: String,
}

impl ChangeEvent {
    pub fn action(&self) -> Option<CollectionAction> {
        self.channel.collection_action()
    }
}

/// Listener that receives change events
pub trait ChangeObserver {
    /// Called for every event raised on the subscribed channel
    fn on_event(&self, event: &ChangeEvent);
}

/// Closure-based listener for simple cases
pub struct FnObserver<F: Fn(&ChangeEvent)>(pub F);

impl<F: Fn(&ChangeEvent)> ChangeObserver for FnObserver<F> {
    fn on_event(&self, event: &ChangeEvent) {
        (self.0)(event);
    }
}

/// Channel-based listener - forwards events to an mpsc sender
pub struct ChannelObserver {
    sender: Sender<ChangeEvent>,
}

impl ChannelObserver {
    pub fn new(sender: Sender<ChangeEvent>) -> Self {
        Self { sender }
    }
}

impl ChangeObserver for ChannelObserver {
    fn on_event(&self, event: &ChangeEvent) {
        // A dropped receiver just means nobody is listening anymore
        let _ = self.sender.send(event.clone());
    }
}

/// Handle returned by [`ObservableObject::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    channel: Channel,
    observer: Rc<dyn ChangeObserver>,
}

/// Sink for per-field validation results.
///
/// Field extraction only ever talks to its owner through this trait.
pub trait ErrorReporter {
    fn set_error_state(&mut self, field: &str, error_state: bool);
}

/// Change-tracking base embedded in presentation objects
pub struct ObservableObject {
    id: Uuid,
    object_type_name: Option<String>,
    track_changes: bool,
    is_changed: bool,
    error_fields: HashSet<String>,
    subscriptions: Vec<Subscription>,
    next_subscription: u64,
}

impl ObservableObject {
    /// Create a new object with a fresh identity
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    /// Create an object around an existing identity, typically one read back
    /// from persisted data
    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            object_type_name: None,
            track_changes: true,
            is_changed: false,
            error_fields: HashSet::new(),
            subscriptions: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Create an object with a fresh identity and config-driven defaults
    pub fn with_config(config: &BindingConfig) -> Self {
        let mut object = Self::new();
        object.track_changes = config.track_changes;
        object
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Full object type description, e.g. "Document.Section.Chapter"
    pub fn object_type_name(&self) -> Option<&str> {
        self.object_type_name.as_deref()
    }

    pub fn set_object_type_name(&mut self, name: impl Into<String>) {
        self.object_type_name = Some(name.into());
    }

    pub fn track_changes(&self) -> bool {
        self.track_changes
    }

    pub fn set_track_changes(&mut self, enabled: bool) {
        self.track_changes = enabled;
    }

    pub fn is_changed(&self) -> bool {
        self.is_changed
    }

    /// Whether any field is currently in the error ledger
    pub fn has_error(&self) -> bool {
        !self.error_fields.is_empty()
    }

    /// Names of the fields currently failing validation
    pub fn error_fields(&self) -> &HashSet<String> {
        &self.error_fields
    }

    pub fn has_field_error(&self, field: &str) -> bool {
        self.error_fields.contains(field)
    }

    /// Error fields in name order, for stable display
    pub fn sorted_error_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self.error_fields.iter().map(String::as_str).collect();
        fields.sort_unstable();
        fields
    }

    /// Register a listener on one channel
    pub fn subscribe(
        &mut self,
        channel: Channel,
        observer: Rc<dyn ChangeObserver>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscriptions.push(Subscription {
            id,
            channel,
            observer,
        });
        id
    }

    /// Remove a listener. Returns false when the id is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    pub fn subscriber_count(&self, channel: Channel) -> usize {
        self.subscriptions
            .iter()
            .filter(|s| s.channel == channel)
            .count()
    }

    pub fn notify_property_changed(&self, field: &str) {
        self.raise(Channel::PropertyChanged, field);
    }

    pub fn notify_collection_changed(&self, collection: &str) {
        self.raise(Channel::CollectionChanged, collection);
    }

    pub fn notify_collection_item_added(&self, collection: &str) {
        self.raise(Channel::CollectionItemAdded, collection);
    }

    pub fn notify_collection_item_removed(&self, collection: &str) {
        self.raise(Channel::CollectionItemRemoved, collection);
    }

    fn notify_error_exists(&self, field: &str) {
        self.raise(Channel::ErrorExists, field);
    }

    fn raise(&self, channel: Channel, name: &str) {
        let event = ChangeEvent {
            source: self.id,
            channel,
            name: name.to_string(),
        };
        for subscription in self.subscriptions.iter().filter(|s| s.channel == channel) {
            subscription.observer.on_event(&event);
        }
    }

    /// Compare an old and a new value and record whether they differ.
    ///
    /// `IsChanged` is raised after every comparison, even when the flag keeps
    /// its previous value. Does nothing while change tracking is off.
    pub fn set_changed_state<T: PartialEq + ?Sized>(&mut self, old: &T, new: &T) {
        if !self.track_changes {
            return;
        }

        self.is_changed = old != new;
        self.notify_property_changed(IS_CHANGED);
    }

    /// Add or remove a field from the error ledger.
    ///
    /// `ErrorExists` fires only when the field is newly recorded; `HasError`
    /// is raised on every call.
    pub fn set_error_state(&mut self, field: &str, error_state: bool) {
        if error_state {
            if self.error_fields.insert(field.to_string()) {
                tracing::debug!(object = %self.id, field, "field entered error state");
                self.notify_error_exists(field);
            }
        } else if self.error_fields.remove(field) {
            tracing::debug!(object = %self.id, field, "field error cleared");
        }

        self.notify_property_changed(HAS_ERROR);
    }
}

impl Default for ObservableObject {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorReporter for ObservableObject {
    fn set_error_state(&mut self, field: &str, error_state: bool) {
        ObservableObject::set_error_state(self, field, error_state);
    }
}

impl fmt::Debug for ObservableObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableObject")
            .field("id", &self.id)
            .field("object_type_name", &self.object_type_name)
            .field("track_changes", &self.track_changes)
            .field("is_changed", &self.is_changed)
            .field("error_fields", &self.sorted_error_fields())
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
