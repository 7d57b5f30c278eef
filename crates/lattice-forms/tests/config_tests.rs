//! Tests for loading binder configuration from disk.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use lattice_forms::{BinderConfig, FormError, ModelBinder, ModelContext};
use lattice_forms_core::ColumnSpan;
use lattice_forms_macros::Model;
use tempfile::NamedTempFile;

#[derive(Model, Default)]
struct Contact {
    name: String,
    phone: String,
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_from_file() {
    let file = write_config(
        r#"
        row_height = 28.0
        group_title_height = 18.0
        default_column_span = "full"
        validation_debounce_ms = 150
        label_suffix = ":"
        "#,
    );
    let config = BinderConfig::load(file.path()).unwrap();
    assert_eq!(config.row_height, 28.0);
    assert_eq!(config.group_title_height, 18.0);
    assert_eq!(config.default_column_span, ColumnSpan::Full);
    assert_eq!(config.validation_debounce(), Duration::from_millis(150));
    assert_eq!(config.label_suffix, ":");
}

#[test]
fn test_empty_file_uses_defaults() {
    let file = write_config("");
    assert_eq!(BinderConfig::load(file.path()).unwrap(), BinderConfig::default());
}

#[test]
fn test_unknown_span_is_rejected() {
    let file = write_config("default_column_span = \"wide\"");
    let err = BinderConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, FormError::Config(_)));
}

#[test]
fn test_missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("forms.toml");
    let err = BinderConfig::load(&path).unwrap_err();
    match err {
        FormError::Io { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_loaded_config_drives_layout() {
    let file = write_config(
        r#"
        row_height = 40.0
        default_column_span = "full"
        label_suffix = " *"
        "#,
    );
    let config = BinderConfig::load(file.path()).unwrap();
    let form = ModelBinder::with_config(config)
        .bind_model(Arc::new(ModelContext::new(Contact::default())))
        .unwrap();

    assert_eq!(form.item("phone").unwrap().label().text(), "Phone *");
    // One untitled panel holding two full-width rows.
    assert_eq!(form.panel().row_count(), 1);
    assert_eq!(form.panel().height(), 80.0);
}
