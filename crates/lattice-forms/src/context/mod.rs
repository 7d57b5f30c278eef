//! The model context: everything a bound model needs at runtime.
//!
//! A [`ModelContext`] owns the model instance, the list of bindable
//! properties, the group registry, the dependency graph of watch handlers,
//! and the transaction snapshot used by commit and rollback.
//!
//! # Dependency Graph
//!
//! Handlers are registered under the property they are bound to. Each name a
//! handler declares as a dependency is recorded, case-insensitively, in the
//! dependency map. When a property changes,
//! [`notify_property_changed`](ModelContext::notify_property_changed)
//! refreshes first the handlers bound to that property and then every handler
//! of every property that depends on it. A handler reachable both ways is
//! refreshed twice; refreshes are idempotent.
//!
//! # Example
//!
//! ```
//! use lattice_forms::context::ModelContext;
//! use lattice_forms_core::{GroupDetail, Model};
//! use lattice_forms_macros::Model;
//!
//! #[derive(Model, Default)]
//! #[model(group(id = 1, title = "Contact", priority = 10))]
//! struct Person {
//!     name: String,
//!     #[field(group = 1)]
//!     email: String,
//! }
//!
//! let context = ModelContext::new(Person::default());
//! assert_eq!(context.group(1).title(), "Contact");
//! assert_eq!(context.group(7).title(), "Default");
//! assert_eq!(context.group_entries().len(), 2);
//! assert!(!context.is_modified());
//! ```

mod group;
mod model;
mod transaction;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lattice_forms_core::{
    ColumnSpan, GroupDetail, Metadata, MetadataFilter, Model, Value, property_key,
};
use parking_lot::{Mutex, RwLock};

use crate::error::Result;
use crate::logging::targets;
use crate::watch::WatchHandler;

pub use group::GroupEntry;
pub use model::SharedModel;

use group::GroupRegistry;
use transaction::Transaction;

#[derive(Default)]
struct WatchGraph {
    /// Bound property -> handlers bound to it.
    registrations: HashMap<Arc<Metadata>, Vec<Arc<dyn WatchHandler>>>,
    /// Lower-cased property name -> properties whose handlers depend on it.
    dependency_map: HashMap<String, Vec<Arc<Metadata>>>,
}

/// Runtime state of one bound model.
pub struct ModelContext {
    model: SharedModel,
    properties: Vec<Arc<Metadata>>,
    groups: RwLock<GroupRegistry>,
    graph: Mutex<WatchGraph>,
    transaction: Mutex<Transaction>,
    modified: AtomicBool,
}

impl ModelContext {
    /// Create a context owning `model`.
    pub fn new<T: Model>(model: T) -> Self {
        Self::from_shared(SharedModel::new(model))
    }

    /// Create a context around an already shared model.
    ///
    /// Groups declared on the model type are registered, and the current
    /// values become the transaction baseline.
    pub fn from_shared(model: SharedModel) -> Self {
        let meta = model.meta_object();
        let properties = meta.metadatas(MetadataFilter::BINDABLE);
        let transaction = Transaction::capture(&properties, &model);
        let context = Self {
            model,
            properties,
            groups: RwLock::new(GroupRegistry::default()),
            graph: Mutex::new(WatchGraph::default()),
            transaction: Mutex::new(transaction),
            modified: AtomicBool::new(false),
        };
        context.add_groups(meta.groups().iter().cloned());
        tracing::debug!(
            target: targets::CONTEXT,
            type_name = meta.type_name(),
            properties = context.properties.len(),
            "created model context"
        );
        context
    }

    /// The bound model.
    pub fn model(&self) -> &SharedModel {
        &self.model
    }

    /// Readable, writable, non-excluded properties in declaration order.
    pub fn properties(&self) -> &[Arc<Metadata>] {
        &self.properties
    }

    /// Find a bound property by name, ignoring case.
    pub fn property(&self, name: &str) -> Option<&Arc<Metadata>> {
        self.properties.iter().find(|p| p.matches_name(name))
    }

    /// Run `f` with typed read access to the model.
    pub fn with_model<T: Model, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.model.with(f)
    }

    // =========================================================================
    // Groups
    // =========================================================================

    /// Register a group. Registering an id again replaces the definition.
    ///
    /// Id `0` is reserved for the default group and is ignored.
    pub fn add_group(&self, group: GroupDetail) {
        self.groups.write().add(group);
    }

    /// Register several groups.
    pub fn add_groups(&self, groups: impl IntoIterator<Item = GroupDetail>) {
        let mut registry = self.groups.write();
        for group in groups {
            registry.add(group);
        }
    }

    /// The group registered under `group_id`, or the default group.
    pub fn group(&self, group_id: u32) -> GroupDetail {
        self.groups.read().resolve(group_id)
    }

    /// The column span of the group's panel in the outer grid.
    pub fn grid_column_span(&self, group_id: u32) -> ColumnSpan {
        self.group(group_id).column_span()
    }

    /// All groups, including the default group, by descending priority.
    pub fn group_details(&self) -> Vec<GroupDetail> {
        self.groups.read().details()
    }

    /// The bound properties partitioned by group, by descending priority.
    pub fn group_entries(&self) -> Vec<GroupEntry> {
        self.groups.read().partition(&self.properties)
    }

    // =========================================================================
    // Dependency graph
    // =========================================================================

    /// Register a handler, refresh it once, then record its dependencies.
    ///
    /// If the first refresh fails the handler is unregistered again and the
    /// error is returned.
    pub fn register_context(&self, handler: Arc<dyn WatchHandler>) -> Result<()> {
        let property = handler.property().clone();
        self.graph
            .lock()
            .registrations
            .entry(property.clone())
            .or_default()
            .push(handler.clone());

        if let Err(error) = handler.refresh(&self.model) {
            let mut graph = self.graph.lock();
            if let Some(handlers) = graph.registrations.get_mut(&property) {
                handlers.retain(|h| !Arc::ptr_eq(h, &handler));
                if handlers.is_empty() {
                    graph.registrations.remove(&property);
                }
            }
            return Err(error);
        }

        let dependencies = handler.dependencies();
        let mut graph = self.graph.lock();
        for dependency in &dependencies {
            let dependents = graph
                .dependency_map
                .entry(property_key(dependency))
                .or_default();
            if !dependents.contains(&property) {
                dependents.push(property.clone());
            }
        }
        tracing::trace!(
            target: targets::CONTEXT,
            property = property.name(),
            handler = handler.kind(),
            ?dependencies,
            "registered watch handler"
        );
        Ok(())
    }

    /// Refresh everything affected by a change of property `name`.
    ///
    /// Handlers bound to `name` are refreshed first, then the handlers of
    /// every property depending on `name`. All handlers are refreshed even if
    /// one fails; the first error is returned.
    #[tracing::instrument(skip(self, value), target = "lattice_forms::context", level = "trace")]
    pub fn notify_property_changed(&self, name: &str, value: &Value) -> Result<()> {
        self.modified.store(true, Ordering::SeqCst);

        let handlers: Vec<Arc<dyn WatchHandler>> = {
            let graph = self.graph.lock();
            let direct = graph
                .registrations
                .iter()
                .filter(|(property, _)| property.matches_name(name))
                .flat_map(|(_, handlers)| handlers.iter().cloned());
            let dependents = graph
                .dependency_map
                .get(&property_key(name))
                .into_iter()
                .flatten()
                .filter_map(|property| graph.registrations.get(property))
                .flat_map(|handlers| handlers.iter().cloned());
            direct.chain(dependents).collect()
        };
        tracing::trace!(
            target: targets::CONTEXT,
            ?value,
            handlers = handlers.len(),
            "property changed"
        );

        self.refresh_handlers(&handlers)
    }

    /// Refresh every registered handler.
    pub fn refresh_all(&self) -> Result<()> {
        let handlers = self.handlers();
        self.refresh_handlers(&handlers)
    }

    fn refresh_handlers(&self, handlers: &[Arc<dyn WatchHandler>]) -> Result<()> {
        let mut first_error = None;
        for handler in handlers {
            if let Err(error) = handler.refresh(&self.model) {
                tracing::debug!(
                    target: targets::CONTEXT,
                    property = handler.property().name(),
                    handler = handler.kind(),
                    %error,
                    "handler refresh failed"
                );
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Every registered handler, in property declaration order.
    pub fn handlers(&self) -> Vec<Arc<dyn WatchHandler>> {
        let graph = self.graph.lock();
        let mut handlers: Vec<_> = self
            .properties
            .iter()
            .filter_map(|p| graph.registrations.get(p))
            .flat_map(|h| h.iter().cloned())
            .collect();
        // Handlers bound to properties outside the bindable list.
        for (property, bound) in &graph.registrations {
            if !self.properties.contains(property) {
                handlers.extend(bound.iter().cloned());
            }
        }
        handlers
    }

    /// Handlers bound to `property`.
    pub fn handlers_for(&self, property: &Metadata) -> Vec<Arc<dyn WatchHandler>> {
        self.graph
            .lock()
            .registrations
            .get(property)
            .cloned()
            .unwrap_or_default()
    }

    /// Properties whose handlers depend on `name`.
    pub fn dependents_of(&self, name: &str) -> Vec<Arc<Metadata>> {
        self.graph
            .lock()
            .dependency_map
            .get(&property_key(name))
            .cloned()
            .unwrap_or_default()
    }

    /// Unregister and dispose every handler.
    ///
    /// Registrations and dependency map are emptied together. Returns the
    /// number of handlers removed.
    pub fn clear(&self) -> usize {
        let removed: Vec<Arc<dyn WatchHandler>> = {
            let mut graph = self.graph.lock();
            graph.dependency_map.clear();
            graph
                .registrations
                .drain()
                .flat_map(|(_, handlers)| handlers)
                .collect()
        };
        for handler in &removed {
            handler.dispose();
        }
        tracing::debug!(target: targets::CONTEXT, handlers = removed.len(), "cleared model context");
        removed.len()
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Make the current values the new baseline.
    pub fn commit(&self) {
        let transaction = Transaction::capture(&self.properties, &self.model);
        tracing::debug!(target: targets::CONTEXT, values = transaction.len(), "committed");
        *self.transaction.lock() = transaction;
        self.modified.store(false, Ordering::SeqCst);
    }

    /// Restore the baseline values and make them the new baseline.
    ///
    /// Returns the properties whose values were restored. Handlers are not
    /// refreshed; see [`refresh_all`](Self::refresh_all).
    pub fn rollback(&self) -> Vec<(Arc<Metadata>, Value)> {
        let mut transaction = self.transaction.lock();
        let restored = transaction.restore(&self.model);
        *transaction = Transaction::capture(&self.properties, &self.model);
        self.modified.store(false, Ordering::SeqCst);
        tracing::debug!(target: targets::CONTEXT, restored = restored.len(), "rolled back");
        restored
    }

    /// Whether a property changed since the last commit or rollback.
    pub fn is_modified(&self) -> bool {
        self.modified.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let graph = self.graph.lock();
        f.debug_struct("ModelContext")
            .field("model", &self.model)
            .field("properties", &self.properties.len())
            .field("registrations", &graph.registrations.len())
            .field("dependencies", &graph.dependency_map.len())
            .field("modified", &self.is_modified())
            .finish()
    }
}
