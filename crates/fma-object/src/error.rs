//! Error types for the item model

use crate::kind::ItemKind;

/// Errors raised by tree and field operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectError {
    /// Child kind is not allowed under the container kind
    #[error("invalid operation: a {child} cannot be inserted into a {parent}")]
    InvalidOperation { parent: ItemKind, child: ItemKind },

    /// No child or item with this id
    #[error("item not found: {0}")]
    NotFound(String),

    /// Operation between two items of different kinds
    #[error("kind mismatch: expected {expected}, got {actual}")]
    KindMismatch { expected: ItemKind, actual: ItemKind },

    /// Field not declared for the kind
    #[error("unknown field '{field}' for {kind}")]
    UnknownField { kind: ItemKind, field: String },

    /// Value type does not match the field's declared type
    #[error("type mismatch for field '{field}': expected {expected}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
    },

    /// Value is not one of the enum field's allowed values
    #[error("invalid value '{value}' for field '{field}'")]
    InvalidEnumValue { field: String, value: String },
}

impl ObjectError {
    /// Create unknown field error
    pub fn unknown_field(kind: ItemKind, field: impl Into<String>) -> Self {
        Self::UnknownField {
            kind,
            field: field.into(),
        }
    }

    /// Create not found error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }
}

/// Reason an item fails validation
///
/// Checks run base first (label), then the kind-specific rule; the
/// first failing check is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidityError {
    /// Label is empty
    #[error("label is empty")]
    EmptyLabel,

    /// Action has no profile
    #[error("action has no profile")]
    NoProfile,

    /// Profile id is empty
    #[error("profile id is empty")]
    EmptyId,
}

/// Result alias for object operations
pub type Result<T> = std::result::Result<T, ObjectError>;
