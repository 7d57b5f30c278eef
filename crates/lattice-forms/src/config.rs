//! Binder configuration.
//!
//! [`BinderConfig`] controls layout metrics, the default column span of
//! controls that do not request one, label decoration, and how long
//! validation waits after the last edit. Every field has a default, so a
//! configuration document only needs the keys it changes:
//!
//! ```toml
//! row_height = 28.0
//! default_column_span = "full"
//! validation_debounce_ms = 150
//! label_suffix = ":"
//! ```

use std::path::Path;
use std::time::Duration;

use lattice_forms_core::ColumnSpan;
use serde::Deserialize;

use crate::error::{FormError, Result};

/// Settings used by [`ModelBinder`](crate::ModelBinder).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BinderConfig {
    /// Height of one grid row.
    pub row_height: f32,
    /// Height reserved for a group frame's title.
    pub group_title_height: f32,
    /// Span used when neither the property nor its factory requests one.
    pub default_column_span: ColumnSpan,
    /// Delay between the last edit and re-validation, in milliseconds.
    pub validation_debounce_ms: u64,
    /// Appended to every generated label.
    pub label_suffix: String,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            row_height: 32.0,
            group_title_height: 24.0,
            default_column_span: ColumnSpan::Half,
            validation_debounce_ms: 300,
            label_suffix: String::new(),
        }
    }
}

impl BinderConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| FormError::io(path, e))?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(
            target: crate::logging::targets::BINDER,
            path = %path.display(),
            "loaded binder configuration"
        );
        Ok(config)
    }

    /// The validation debounce delay.
    pub fn validation_debounce(&self) -> Duration {
        Duration::from_millis(self.validation_debounce_ms)
    }

    /// Set the row height.
    pub fn with_row_height(mut self, row_height: f32) -> Self {
        self.row_height = row_height;
        self
    }

    /// Set the validation debounce delay.
    pub fn with_validation_debounce(mut self, delay: Duration) -> Self {
        self.validation_debounce_ms = delay.as_millis() as u64;
        self
    }

    /// Set the label suffix.
    pub fn with_label_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.label_suffix = suffix.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BinderConfig::default();
        assert_eq!(config.row_height, 32.0);
        assert_eq!(config.default_column_span, ColumnSpan::Half);
        assert_eq!(config.validation_debounce(), Duration::from_millis(300));
        assert!(config.label_suffix.is_empty());
    }

    #[test]
    fn test_partial_document() {
        let config = BinderConfig::from_toml_str(
            r#"
            default_column_span = "full"
            label_suffix = ":"
            "#,
        )
        .unwrap();
        assert_eq!(config.default_column_span, ColumnSpan::Full);
        assert_eq!(config.label_suffix, ":");
        assert_eq!(config.row_height, 32.0);
    }

    #[test]
    fn test_invalid_document() {
        let err = BinderConfig::from_toml_str("row_height = \"tall\"").unwrap_err();
        assert!(matches!(err, FormError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = BinderConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, FormError::Io { .. }));
    }
}
