//!
//! Defines error types for size resolution and mutation.

/// Errors raised while resolving or mutating length fields.
///
/// Apart from `Description`, every variant means the program description is
/// inconsistent with its length paths. They are internal consistency violations:
/// callers are expected to abort the current operation, not to retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SizeError {
    /// No sibling, keyword or ancestor matched a path token.
    #[error(
        "len field {field:?} references non existent field {token:?}, pos={pos_type:?}/{pos_field:?}, siblings: {siblings:?}"
    )]
    UnresolvedReference {
        field: String,
        token: String,
        pos_type: String,
        pos_field: String,
        siblings: Vec<String>,
    },
    /// An offset length was resolved through an escape that has no offset.
    #[error("offset len field {field:?} resolved to a non-field")]
    MissingOffset { field: String },
    /// A `parent` escape was taken from a position without a container.
    #[error("len field {field:?}: {token:?} has no container to escape to")]
    NoContainer { field: String, token: String },
    /// The path continues through a node that has no children.
    #[error("len field {field:?}: path token {token:?} descends into non-group type {type_name:?}")]
    NotAGroup {
        field: String,
        token: String,
        type_name: String,
    },
    #[error("len field {field:?} has an empty path")]
    EmptyPath { field: String },
    #[error("type {type_name:?} is not a length type")]
    NotALength { type_name: String },
    #[error("argument index {index} out of range for {len} siblings")]
    IndexOutOfRange { index: usize, len: usize },
    /// A type or config description could not be decoded.
    #[error("invalid description: {0}")]
    Description(String),
}
