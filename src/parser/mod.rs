pub mod extract;
pub mod node;

pub use extract::{
    child_enum, child_string, child_string_or_empty, child_value, child_value_opt,
    child_value_or_zero, FieldEnum, FieldKind, FieldReader, FieldText,
};
pub use node::{Content, Node, NodeError};
