//! Deferred invocations marshalled onto the UI thread.
//!
//! Widgets and bound forms are owned by the thread that created them. Work
//! produced elsewhere, such as async dropdown loads and debounced
//! validation, is wrapped in a [`QueuedInvocation`] and posted to a
//! [`UiQueue`]. The owning thread drains the queue with
//! [`UiQueue::process_pending`], typically once per event-loop iteration.
//!
//! # How It Works
//!
//! 1. [`UiQueue::invoke`] runs the closure immediately when called on the UI
//!    thread, and queues it otherwise. [`UiQueue::post`] always queues.
//!
//! 2. Posting calls the optional waker so a host event loop can schedule a
//!    drain.
//!
//! 3. `process_pending` executes invocations in FIFO order, including ones
//!    posted while draining.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::logging::targets;
use crate::thread_check::ThreadAffinity;

/// A type-erased invocation that can be executed later.
pub struct QueuedInvocation {
    id: u64,
    invoke: Box<dyn FnOnce() + Send>,
}

impl QueuedInvocation {
    /// The id assigned when the invocation was posted.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Execute the invocation.
    pub fn execute(self) {
        (self.invoke)();
    }
}

impl fmt::Debug for QueuedInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedInvocation")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

type Waker = Arc<dyn Fn() + Send + Sync>;

struct QueueState {
    affinity: ThreadAffinity,
    pending: Mutex<VecDeque<QueuedInvocation>>,
    next_id: AtomicU64,
    waker: Mutex<Option<Waker>>,
}

/// A FIFO of invocations bound to the thread that created it.
///
/// Cloning is cheap; clones share the same queue.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use lattice_forms_core::UiQueue;
///
/// let queue = UiQueue::new();
/// let hits = Arc::new(AtomicUsize::new(0));
///
/// let remote = queue.clone();
/// let counter = hits.clone();
/// std::thread::spawn(move || {
///     remote.invoke(move || {
///         counter.fetch_add(1, Ordering::SeqCst);
///     });
/// })
/// .join()
/// .unwrap();
///
/// assert_eq!(hits.load(Ordering::SeqCst), 0);
/// assert_eq!(queue.process_pending(), 1);
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// ```
#[derive(Clone)]
pub struct UiQueue {
    state: Arc<QueueState>,
}

impl Default for UiQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl UiQueue {
    /// Create a queue owned by the current thread.
    pub fn new() -> Self {
        Self {
            state: Arc::new(QueueState {
                affinity: ThreadAffinity::current(),
                pending: Mutex::new(VecDeque::new()),
                next_id: AtomicU64::new(1),
                waker: Mutex::new(None),
            }),
        }
    }

    /// The owning thread.
    pub fn affinity(&self) -> ThreadAffinity {
        self.state.affinity
    }

    /// Whether the caller is on the owning thread.
    pub fn is_ui_thread(&self) -> bool {
        self.state.affinity.is_same_thread()
    }

    /// Install a callback invoked whenever work is posted.
    ///
    /// Host event loops use this to schedule a call to
    /// [`process_pending`](Self::process_pending).
    pub fn set_waker<F>(&self, waker: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.state.waker.lock() = Some(Arc::new(waker));
    }

    /// Run `f` now if on the owning thread, otherwise queue it.
    pub fn invoke<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_ui_thread() {
            f();
        } else {
            self.post(f);
        }
    }

    /// Queue `f` for the owning thread and return its invocation id.
    pub fn post<F>(&self, f: F) -> u64
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.state.next_id.fetch_add(1, Ordering::SeqCst);
        self.state.pending.lock().push_back(QueuedInvocation {
            id,
            invoke: Box::new(f),
        });
        tracing::trace!(target: targets::DISPATCH, invocation_id = id, "queued invocation");

        let waker = self.state.waker.lock().clone();
        if let Some(waker) = waker {
            waker();
        }
        id
    }

    /// Number of invocations waiting to run.
    pub fn pending_count(&self) -> usize {
        self.state.pending.lock().len()
    }

    /// Execute all pending invocations on the owning thread.
    ///
    /// Returns the number executed.
    pub fn process_pending(&self) -> usize {
        self.state.affinity.debug_assert_same_thread();
        let mut executed = 0;
        loop {
            // Pop one at a time so invocations may post more work.
            let next = self.state.pending.lock().pop_front();
            match next {
                Some(invocation) => {
                    invocation.execute();
                    executed += 1;
                }
                None => break,
            }
        }
        if executed > 0 {
            tracing::trace!(target: targets::DISPATCH, executed, "processed queued invocations");
        }
        executed
    }

    /// Drop all pending invocations without running them.
    pub fn clear(&self) -> usize {
        let mut pending = self.state.pending.lock();
        let dropped = pending.len();
        pending.clear();
        dropped
    }
}

impl fmt::Debug for UiQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiQueue")
            .field("affinity", &self.state.affinity)
            .field("pending", &self.pending_count())
            .finish()
    }
}
