//! Error types for form binding.

use std::path::PathBuf;

use lattice_forms_core::MetaError;

/// Result type alias for form operations.
pub type Result<T> = std::result::Result<T, FormError>;

/// Errors that can occur while binding or refreshing a form.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// An ordering comparison was requested between values without an ordering.
    #[error("Cannot compare {left} {op} {right}")]
    Incomparable {
        left: String,
        right: String,
        op: &'static str,
    },

    /// A metadata registry error.
    #[error(transparent)]
    Meta(MetaError),

    /// No bound property has this name.
    #[error("Property '{name}' is not bound")]
    UnknownProperty { name: String },

    /// A handler failed while refreshing.
    #[error("Handler for '{property}' failed: {message}")]
    Handler { property: String, message: String },

    /// The form was already disposed.
    #[error("The form has been disposed")]
    Disposed,

    /// Invalid configuration document.
    #[error("Invalid binder configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// File I/O error.
    #[error("Failed to read configuration '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FormError {
    /// Create an unknown-property error.
    pub fn unknown_property(name: impl Into<String>) -> Self {
        Self::UnknownProperty { name: name.into() }
    }

    /// Create a handler error.
    pub fn handler(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Handler {
            property: property.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<MetaError> for FormError {
    fn from(error: MetaError) -> Self {
        match error {
            MetaError::Incomparable { left, right, op } => Self::Incomparable { left, right, op },
            other => Self::Meta(other),
        }
    }
}
