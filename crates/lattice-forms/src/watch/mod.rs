//! Watch handlers: behaviors re-evaluated when watched properties change.
//!
//! A [`WatchHandler`] is bound to one property and declares the names of the
//! properties it depends on. The [`ModelContext`](crate::context::ModelContext)
//! refreshes it once on registration and then whenever its own property or
//! one of its dependencies changes.
//!
//! # Refresh Protocol
//!
//! [`WatchHandler::refresh`] is the single entry point:
//!
//! 1. On the first successful call, [`on_initialize`](WatchHandler::on_initialize)
//!    runs under the handler's initialization lock, so concurrent refreshes
//!    initialize exactly once. A failed initialization is retried by the next
//!    refresh.
//! 2. [`on_refresh`](WatchHandler::on_refresh) runs on every call, told
//!    whether this call performed the initialization.
//!
//! Handlers push values to widgets silently, so a refresh never re-enters
//! the change notification of the property it updates.
//!
//! # Built-in Handlers
//!
//! - [`ConditionHandler`]: enables or shows a widget depending on siblings
//! - [`ComputedHandler`]: keeps a derived value up to date
//! - [`DropdownHandler`]: repopulates a combo box from a provider
//! - [`ValidationHandler`]: evaluates validation rules

mod computed;
mod condition;
mod dropdown;
mod validation;

use std::fmt;
use std::sync::Arc;

use lattice_forms_core::{Metadata, property_key};
use lattice_forms_core::annotation::WatchOn;
use parking_lot::{Mutex, RwLock};

use crate::context::SharedModel;
use crate::error::Result;

pub use computed::ComputedHandler;
pub use condition::ConditionHandler;
pub use dropdown::DropdownHandler;
pub use validation::ValidationHandler;

/// The bound property, dependencies and initialization flag of a handler.
pub struct WatchState {
    property: Arc<Metadata>,
    dependencies: RwLock<Vec<String>>,
    initialized: Mutex<bool>,
}

impl WatchState {
    /// Create the state for a handler bound to `property`.
    ///
    /// Names listed in the property's [`WatchOn`] annotations become
    /// dependencies.
    pub fn new(property: Arc<Metadata>) -> Self {
        let state = Self {
            property,
            dependencies: RwLock::new(Vec::new()),
            initialized: Mutex::new(false),
        };
        let declared: Vec<String> = state
            .property
            .annotations::<WatchOn>()
            .flat_map(|w| w.0.iter().cloned())
            .collect();
        for name in declared {
            state.add_dependency(&name);
        }
        state
    }

    /// The bound property.
    pub fn property(&self) -> &Arc<Metadata> {
        &self.property
    }

    /// Add a dependency. Names compare case-insensitively.
    pub fn add_dependency(&self, name: &str) {
        let name = property_key(name);
        if name.is_empty() {
            return;
        }
        let mut dependencies = self.dependencies.write();
        if !dependencies.contains(&name) {
            dependencies.push(name);
        }
    }

    /// The lower-cased dependency names.
    pub fn dependencies(&self) -> Vec<String> {
        self.dependencies.read().clone()
    }

    /// Whether `name` is a dependency.
    pub fn depends_on(&self, name: &str) -> bool {
        self.dependencies.read().contains(&property_key(name))
    }

    /// Whether initialization has completed.
    pub fn is_initialized(&self) -> bool {
        *self.initialized.lock()
    }
}

impl fmt::Debug for WatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchState")
            .field("property", &self.property.name())
            .field("dependencies", &*self.dependencies.read())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

/// A behavior bound to one property and refreshed when its inputs change.
///
/// # Thread Safety
///
/// Handlers must be `Send + Sync`; they are shared between the context and
/// deferred work on the UI queue.
pub trait WatchHandler: Send + Sync {
    /// Short name used in logs.
    fn kind(&self) -> &'static str;

    /// The handler's state.
    fn state(&self) -> &WatchState;

    /// One-time setup before the first refresh.
    fn on_initialize(&self, _model: &SharedModel) -> Result<()> {
        Ok(())
    }

    /// Re-evaluate against the current model.
    fn on_refresh(&self, model: &SharedModel, first_call: bool) -> Result<()>;

    /// Complete any deferred work immediately.
    fn flush(&self, _model: &SharedModel) -> Result<()> {
        Ok(())
    }

    /// Release resources. Called when the handler is unregistered.
    fn dispose(&self) {}

    /// The bound property.
    fn property(&self) -> &Arc<Metadata> {
        self.state().property()
    }

    /// The lower-cased names of the properties this handler depends on.
    fn dependencies(&self) -> Vec<String> {
        self.state().dependencies()
    }

    /// Initialize if needed, then refresh.
    fn refresh(&self, model: &SharedModel) -> Result<()> {
        let first_call = {
            let mut initialized = self.state().initialized.lock();
            if *initialized {
                false
            } else {
                self.on_initialize(model)?;
                *initialized = true;
                true
            }
        };
        tracing::trace!(
            target: crate::logging::targets::WATCH,
            property = self.property().name(),
            handler = self.kind(),
            first_call,
            "refresh"
        );
        self.on_refresh(model, first_call)
    }
}

impl fmt::Debug for dyn WatchHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchHandler")
            .field("kind", &self.kind())
            .field("state", self.state())
            .finish()
    }
}
