//! Logging facilities for Lattice Forms.
//!
//! Lattice Forms uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("lattice_forms=debug,lattice_forms_core=info")
//!         .init();
//! }
//! ```
//!
//! Every event is emitted under one of the [`targets`], so subsystems can be
//! filtered independently.

/// Target names for log filtering.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "lattice_forms_core";
    /// Metadata registry target.
    pub const META: &str = "lattice_forms_core::meta";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "lattice_forms_core::signal";
    /// Property system target.
    pub const PROPERTY: &str = "lattice_forms_core::property";
    /// UI-thread dispatch target.
    pub const DISPATCH: &str = "lattice_forms_core::dispatch";
    /// Async runtime target.
    pub const ASYNC: &str = "lattice_forms_core::async";
    /// Performance spans target.
    pub const PERF: &str = "lattice_forms::perf";
}

/// A guard that records a performance span while alive.
///
/// ```
/// use lattice_forms_core::PerfSpan;
///
/// {
///     let _span = PerfSpan::new("bind_form");
///     // ... timed work ...
/// }
/// ```
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "lattice_forms::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}
