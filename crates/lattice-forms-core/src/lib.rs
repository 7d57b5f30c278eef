//! Core systems for Lattice Forms.
//!
//! This crate provides the foundational pieces the form binder is built on:
//!
//! - **Metadata Registry**: Per-type property descriptors, computed once and cached
//! - **Values**: A dynamic [`Value`] exchanged between models and widgets
//! - **Annotations**: Declarative hints (groups, spans, watches, conditions)
//! - **Signal/Slot System**: Type-safe change notification
//! - **Property System**: Reactive widget state
//! - **UI Dispatch**: A queue that marshals work back onto the UI thread
//! - **Async Runtime** (feature `tokio`): Spawning and debouncing with UI delivery
//!
//! # Metadata Example
//!
//! ```
//! use lattice_forms_core::{MetadataFilter, Model, Value};
//! use lattice_forms_macros::Model;
//!
//! #[derive(Model, Default)]
//! struct Person {
//!     #[field(label = "Full name")]
//!     name: String,
//!     age: Option<u32>,
//! }
//!
//! let mut person = Person::default();
//! let meta = Person::static_meta();
//! let age = meta.property("age").unwrap();
//! assert!(age.set_value(&mut person, Value::Int(30)));
//! assert_eq!(person.age, Some(30));
//! assert_eq!(meta.property("name").unwrap().display_name(), "Full name");
//! assert_eq!(meta.metadatas(MetadataFilter::BINDABLE).len(), 2);
//! ```
//!
//! # Signal Example
//!
//! ```
//! use lattice_forms_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```

pub mod annotation;
#[cfg(feature = "tokio")]
pub mod async_runtime;
mod error;
pub mod invocation;
pub mod logging;
pub mod meta;
pub mod property;
pub mod signal;
pub mod thread_check;
pub mod value;

pub use annotation::{Annotation, ColumnSpan, DEFAULT_GROUP_ID, GRID_COLUMNS, GroupDetail};
pub use error::{MetaError, MetaResult};
pub use invocation::{QueuedInvocation, UiQueue};
pub use logging::PerfSpan;
pub use meta::{
    Getter, MetaObject, MetaObjectBuilder, Metadata, MetadataBuilder, MetadataFilter, Model,
    Setter, TypeRegistry, humanize, property_key,
};
pub use property::Property;
pub use signal::{ConnectionId, Signal};
pub use thread_check::ThreadAffinity;
pub use value::{DATE_FORMAT, FieldValue, Value, ValueKind};
