//! Logging targets for the form binder.
//!
//! Events from this crate are emitted under the targets below; core events
//! use [`lattice_forms_core::logging::targets`].
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("lattice_forms::watch=trace,lattice_forms::binder=debug")
//!     .init();
//! ```

/// Target names for log filtering.
pub mod targets {
    /// Model context (groups, dependency graph, transactions).
    pub const CONTEXT: &str = "lattice_forms::context";
    /// Watch handlers and their refreshes.
    pub const WATCH: &str = "lattice_forms::watch";
    /// Control and watch factory resolution.
    pub const FACTORY: &str = "lattice_forms::factory";
    /// Binding and teardown.
    pub const BINDER: &str = "lattice_forms::binder";
    /// Grid placement.
    pub const LAYOUT: &str = "lattice_forms::layout";
}
