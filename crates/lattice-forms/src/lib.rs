//! Lattice Forms - metadata-driven form binding.
//!
//! Annotate a model with `#[derive(Model)]`, hand it to a [`ModelBinder`],
//! and get back a [`BoundForm`]: one input widget per property, laid out on
//! a six-column grid, grouped into titled frames, kept in sync with the
//! model. Watch handlers react to edits: enabling and hiding fields,
//! recomputing derived values, repopulating drop-downs and validating input.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use lattice_forms::prelude::*;
//!
//! #[derive(Model, Default)]
//! #[model(group(id = 1, title = "Address", priority = 5))]
//! struct Person {
//!     #[field(validate("required"))]
//!     name: String,
//!     age: u32,
//!     #[field(enable_when(property = "age", op = ">=", value = 18))]
//!     can_vote: bool,
//!     #[field(group = 1, span = "full")]
//!     street: String,
//! }
//!
//! let binder = ModelBinder::new();
//! let form = binder.bind_model(Arc::new(ModelContext::new(Person::default())))?;
//!
//! let can_vote = form.item("can_vote").unwrap();
//! assert!(!can_vote.widget().base().is_enabled());
//!
//! form.set_value("age", 30)?;
//! assert!(can_vote.widget().base().is_enabled());
//! assert_eq!(form.context().with_model(|p: &Person| p.age), Some(30));
//!
//! form.rollback()?;
//! assert!(!can_vote.widget().base().is_enabled());
//! # Ok::<(), lattice_forms::FormError>(())
//! ```

pub mod binder;
pub mod config;
pub mod context;
mod error;
pub mod factory;
pub mod layout;
pub mod logging;
pub mod prelude;
pub mod provider;
pub mod rules;
pub mod watch;
pub mod widget;

pub use binder::{BoundForm, ModelBinder, PropertyChange};
pub use config::BinderConfig;
pub use context::{ModelContext, SharedModel};
pub use error::{FormError, Result};

pub use lattice_forms_core::Model;
pub use lattice_forms_macros::Model;
