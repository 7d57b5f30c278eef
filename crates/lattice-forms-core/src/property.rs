//! Widget state with change detection.
//!
//! Widgets keep their value, enabled and visible flags in [`Property`]
//! cells. A write reports whether it changed anything, and the widget emits
//! its signal only then.
//!
//! ```
//! use lattice_forms_core::{Property, Signal};
//!
//! struct Toggle {
//!     on: Property<bool>,
//!     toggled: Signal<bool>,
//! }
//!
//! let toggle = Toggle { on: Property::new(false), toggled: Signal::new() };
//! if toggle.on.set(true) {
//!     toggle.toggled.emit(true);
//! }
//! assert!(!toggle.on.set(true));
//! assert!(toggle.on.get());
//! ```

use std::fmt;

use parking_lot::RwLock;

/// A lock-protected value.
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    /// Create a cell holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// A clone of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    /// Overwrite without comparing.
    pub fn set_silent(&self, value: T) {
        *self.value.write() = value;
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Store `value`. Returns `false`, storing nothing, when it equals the
    /// current value.
    pub fn set(&self, value: T) -> bool {
        let mut slot = self.value.write();
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.value.read(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_impl_all!(Property<Vec<String>>: Send, Sync);

    #[test]
    fn test_set_reports_change() {
        let enabled = Property::new(true);
        assert!(!enabled.set(true));
        assert!(enabled.set(false));
        assert!(!enabled.get());
    }

    #[test]
    fn test_with_borrows() {
        let text = Property::new("Ada".to_string());
        assert_eq!(text.with(String::len), 3);
    }

    #[test]
    fn test_set_silent_skips_comparison() {
        let errors: Property<Vec<&str>> = Property::default();
        errors.set_silent(vec!["required"]);
        assert_eq!(errors.get(), ["required"]);
        assert_eq!(format!("{errors:?}"), r#"["required"]"#);
    }
}
