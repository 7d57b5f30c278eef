//! Which thread owns a widget.
//!
//! Widgets and their [`UiQueue`](crate::UiQueue) record the thread that
//! created them. Work finishing on another thread checks the affinity and
//! posts itself back instead of touching the widget directly.
//!
//! ```
//! use lattice_forms_core::ThreadAffinity;
//!
//! let ui = ThreadAffinity::current();
//! assert!(ui.is_same_thread());
//! let from_worker = std::thread::spawn(move || ui.is_same_thread()).join().unwrap();
//! assert!(!from_worker);
//! ```

use std::thread::{self, ThreadId};

/// The owning thread of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadAffinity {
    owner: ThreadId,
}

impl Default for ThreadAffinity {
    fn default() -> Self {
        Self::current()
    }
}

impl ThreadAffinity {
    /// Owned by the calling thread.
    pub fn current() -> Self {
        Self {
            owner: thread::current().id(),
        }
    }

    /// Whether the calling thread is the owner.
    pub fn is_same_thread(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Panic unless called on the owning thread.
    #[track_caller]
    pub fn assert_same_thread(&self) {
        assert!(
            self.is_same_thread(),
            "called from {:?}, but owned by {:?}",
            thread::current().id(),
            self.owner
        );
    }

    /// [`assert_same_thread`](Self::assert_same_thread) in debug builds; a
    /// no-op in release builds.
    #[track_caller]
    pub fn debug_assert_same_thread(&self) {
        if cfg!(debug_assertions) {
            self.assert_same_thread();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_thread() {
        let affinity = ThreadAffinity::current();
        assert!(affinity.is_same_thread());
        affinity.assert_same_thread();
        assert_eq!(affinity, ThreadAffinity::default());
    }

    #[test]
    fn test_other_thread() {
        let affinity = ThreadAffinity::current();
        assert!(!thread::spawn(move || affinity.is_same_thread()).join().unwrap());
        assert!(thread::spawn(move || affinity.assert_same_thread()).join().is_err());
    }
}
