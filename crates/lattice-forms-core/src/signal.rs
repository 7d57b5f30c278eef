//! Change notification between widgets, forms and host code.
//!
//! A [`Signal<Args>`] keeps a table of connected slots. Widgets emit
//! `value_changed` on user edits; a bound form emits `property_changed` after
//! an edit reached the model.
//!
//! # Re-entrancy
//!
//! [`emit`](Signal::emit) copies the slot table and releases its lock before
//! the first slot runs. A slot may emit, connect or disconnect on the signal
//! that called it; table changes apply to the next emission.
//!
//! # Example
//!
//! ```
//! use lattice_forms_core::Signal;
//!
//! let edited = Signal::<String>::new();
//! let id = edited.connect(|text| println!("edited: {text}"));
//! edited.emit("Ada".to_string());
//! assert!(edited.disconnect(id));
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// Handle of one connected slot, used to [`disconnect`](Signal::disconnect) it.
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// Slots invoked, in connection order, with every emitted value.
///
/// `Signal<Args>` is `Send + Sync` when `Args` is.
pub struct Signal<Args> {
    slots: Mutex<SlotMap<ConnectionId, Slot<Args>>>,
}

impl<Args: Clone + Send + 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: Clone + Send + 'static> Signal<Args> {
    /// A signal nobody listens to yet.
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(SlotMap::with_key()),
        }
    }

    /// Connect `slot`; it runs on the emitting thread.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.slots.lock().insert(Arc::new(slot));
        tracing::trace!(target: targets::SIGNAL, ?id, "slot connected");
        id
    }

    /// Remove one slot. Returns `false` if it was not connected.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.slots.lock().remove(id).is_some()
    }

    /// Remove every slot.
    pub fn disconnect_all(&self) {
        self.slots.lock().clear();
    }

    /// Number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.slots.lock().len()
    }

    /// Whether `id` is connected.
    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.slots.lock().contains_key(id)
    }

    /// Call every connected slot with `args`.
    #[tracing::instrument(skip_all, target = "lattice_forms_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        let slots: Vec<Slot<Args>> = self.slots.lock().values().cloned().collect();
        tracing::trace!(target: targets::SIGNAL, slots = slots.len(), "emit");
        for slot in slots {
            slot(&args);
        }
    }
}

impl<Args> std::fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.slots.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static_assertions::assert_impl_all!(Signal<String>: Send, Sync);

    fn recorder(signal: &Signal<i32>) -> (ConnectionId, Arc<Mutex<Vec<i32>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = signal.connect(move |&value| sink.lock().push(value));
        (id, seen)
    }

    #[test]
    fn test_emit_reaches_every_slot_in_order() {
        let signal = Signal::new();
        let (_, first) = recorder(&signal);
        let (_, second) = recorder(&signal);

        signal.emit(7);
        signal.emit(8);

        assert_eq!(*first.lock(), [7, 8]);
        assert_eq!(*second.lock(), [7, 8]);
        assert_eq!(signal.connection_count(), 2);
    }

    #[test]
    fn test_disconnect() {
        let signal = Signal::new();
        let (id, seen) = recorder(&signal);

        signal.emit(1);
        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        assert!(!signal.is_connected(id));
        signal.emit(2);

        assert_eq!(*seen.lock(), [1]);
    }

    #[test]
    fn test_disconnect_all() {
        let signal = Signal::new();
        let (_, seen) = recorder(&signal);
        recorder(&signal);
        signal.disconnect_all();
        signal.emit(3);
        assert!(seen.lock().is_empty());
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn test_slot_may_emit_and_disconnect_itself() {
        let signal = Arc::new(Signal::<u32>::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let own_id = Arc::new(Mutex::new(None));

        let inner = signal.clone();
        let counter = calls.clone();
        let id_cell = own_id.clone();
        let id = signal.connect(move |&depth| {
            counter.fetch_add(1, Ordering::SeqCst);
            if depth < 2 {
                inner.emit(depth + 1);
            } else if let Some(id) = *id_cell.lock() {
                inner.disconnect(id);
            }
        });
        *own_id.lock() = Some(id);

        signal.emit(0);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(signal.connection_count(), 0);
    }
}
