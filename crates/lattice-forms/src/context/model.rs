//! Shared ownership of the bound model.

use std::fmt;
use std::sync::Arc;

use lattice_forms_core::{MetaObject, MetaResult, Metadata, Model, Value};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The model instance a form edits, shared between the context, the
/// handlers and deferred work on the UI queue.
///
/// Cloning shares the same instance. Guards returned by [`read`](Self::read)
/// and [`write`](Self::write) must not be held across handler refreshes.
#[derive(Clone)]
pub struct SharedModel {
    inner: Arc<RwLock<Box<dyn Model>>>,
    meta: &'static MetaObject,
}

impl SharedModel {
    /// Take ownership of a model.
    pub fn new<T: Model>(model: T) -> Self {
        Self::from_box(Box::new(model))
    }

    /// Take ownership of a boxed model.
    pub fn from_box(model: Box<dyn Model>) -> Self {
        let meta = model.meta_object();
        Self {
            inner: Arc::new(RwLock::new(model)),
            meta,
        }
    }

    /// The model's meta-object.
    pub fn meta_object(&self) -> &'static MetaObject {
        self.meta
    }

    /// Lock the model for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, Box<dyn Model>> {
        self.inner.read()
    }

    /// Lock the model for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, Box<dyn Model>> {
        self.inner.write()
    }

    /// Read one property.
    pub fn get(&self, property: &Metadata) -> Option<Value> {
        property.get_value(&**self.read())
    }

    /// Write one property. Returns `false` when the value was rejected.
    pub fn set(&self, property: &Metadata, value: Value) -> bool {
        property.set_value(&mut **self.write(), value)
    }

    /// Write one property, reporting why a write failed.
    pub fn try_set(&self, property: &Metadata, value: Value) -> MetaResult<()> {
        property.try_set_value(&mut **self.write(), value)
    }

    /// Run `f` with typed read access. `None` when the model is not a `T`.
    pub fn with<T: Model, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let guard = self.read();
        (**guard).downcast_ref::<T>().map(f)
    }

    /// Run `f` with typed write access. `None` when the model is not a `T`.
    ///
    /// Changes made here bypass change notification.
    pub fn with_mut<T: Model, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut guard = self.write();
        (**guard).downcast_mut::<T>().map(f)
    }
}

impl fmt::Debug for SharedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedModel")
            .field("type_name", &self.meta.type_name())
            .finish_non_exhaustive()
    }
}
