//! Prelude module for Lattice Forms.
//!
//! ```
//! use lattice_forms::prelude::*;
//! ```
//!
//! This provides access to:
//! - Binding (`ModelBinder`, `BoundForm`, `ModelContext`)
//! - Model metadata (`Model`, `Metadata`, `Value`)
//! - Providers and rules for drop-downs and validation
//! - Headless widgets

// ============================================================================
// Binding
// ============================================================================

pub use crate::binder::{BoundForm, ModelBinder, PropertyChange};
pub use crate::config::BinderConfig;
pub use crate::context::{ModelContext, SharedModel};
pub use crate::error::{FormError, Result};

// ============================================================================
// Model Metadata
// ============================================================================

pub use lattice_forms_core::{
    ColumnSpan, GroupDetail, MetaObject, Metadata, MetadataFilter, Model, TypeRegistry, Value,
    ValueKind,
};
pub use lattice_forms_macros::Model;

// ============================================================================
// Signals and Dispatch
// ============================================================================

pub use lattice_forms_core::{ConnectionId, Signal, UiQueue};

// ============================================================================
// Extension Points
// ============================================================================

pub use crate::factory::{ControlContext, ControlFactory, WatchFactory};
pub use crate::provider::{Choice, ChoiceFetch, DropdownProvider, ProviderRegistry};
pub use crate::rules::{RuleEvaluator, RuleRegistry, ValidationContext};
pub use crate::watch::{WatchHandler, WatchState};

// ============================================================================
// Widgets
// ============================================================================

pub use crate::widget::{
    CheckBox, ComboBox, DateInput, ErrorIndicator, InputWidget, Label, NumberInput, TextInput,
};
