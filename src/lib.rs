// Viewbind - observable presentation objects for desktop UIs
// Change notification, per-field error ledgers and validated field extraction from XML

pub mod cli;
pub mod models;
pub mod parser;

pub use anyhow::{Context, Result};

// Re-export commonly used types
pub use models::{
    BindingConfig, ChangeEvent, ChangeObserver, Channel, ErrorReporter, LanguageType,
    LanguageUnit, ObservableObject,
};
pub use parser::{FieldEnum, FieldKind, FieldReader, FieldText, Node, NodeError};
