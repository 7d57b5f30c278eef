//! Error types for the metadata layer.

/// Result type alias for metadata operations.
pub type MetaResult<T> = std::result::Result<T, MetaError>;

/// Errors raised by the metadata registry and annotation evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetaError {
    /// No metadata was registered for the type.
    #[error("Type '{type_name}' has no registered metadata")]
    UnknownType { type_name: String },

    /// The type has no property with this name.
    #[error("Property '{name}' not found on '{owner}'")]
    UnknownProperty { owner: &'static str, name: String },

    /// The property cannot be written.
    #[error("Property '{name}' is read-only")]
    ReadOnly { name: String },

    /// The value cannot be converted to the property's type.
    #[error("Cannot assign {value} to property '{name}' of type {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        value: String,
    },

    /// An ordering comparison was requested between values without an ordering.
    #[error("Cannot compare {left} {op} {right}")]
    Incomparable {
        left: String,
        right: String,
        op: &'static str,
    },
}

impl MetaError {
    /// Create an unknown-property error.
    pub fn unknown_property(owner: &'static str, name: impl Into<String>) -> Self {
        Self::UnknownProperty {
            owner,
            name: name.into(),
        }
    }
}
