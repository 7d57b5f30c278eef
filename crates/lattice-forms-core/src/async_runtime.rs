//! Tokio integration with delivery back to the UI thread.
//!
//! Requires the `tokio` feature:
//!
//! ```toml
//! [dependencies]
//! lattice-forms-core = { version = "1.0", features = ["tokio"] }
//! ```
//!
//! [`AsyncRuntime`] spawns futures and hands their results to a [`UiQueue`],
//! so callbacks always run on the thread that owns the widgets.
//! [`Debouncer`] collapses bursts of requests into one delayed invocation.
//!
//! # Example: Delivering Results to the UI Thread
//!
//! ```no_run
//! use lattice_forms_core::UiQueue;
//! use lattice_forms_core::async_runtime::{AsyncRuntime, AsyncRuntimeConfig};
//!
//! # async fn load_countries() -> Vec<String> { Vec::new() }
//! let queue = UiQueue::new();
//! let runtime = AsyncRuntime::new(AsyncRuntimeConfig::default()).unwrap();
//!
//! runtime.spawn_with_callback(&queue, load_countries(), |countries| {
//!     println!("loaded {} countries", countries.len());
//! });
//!
//! // Later, from the UI loop:
//! queue.process_pending();
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

use crate::invocation::UiQueue;
use crate::logging::targets;

/// Errors that can occur with the async runtime.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AsyncRuntimeError {
    /// Failed to create the runtime.
    #[error("Failed to create async runtime: {0}")]
    CreationFailed(String),
    /// No runtime is running on this thread.
    #[error("No tokio runtime is available on this thread")]
    NoRuntime,
}

/// Configuration for an owned runtime.
#[derive(Debug, Clone)]
pub struct AsyncRuntimeConfig {
    /// Number of worker threads. Defaults to the number of CPU cores.
    pub worker_threads: Option<usize>,
    /// Name prefix for runtime threads.
    pub thread_name: String,
}

impl Default for AsyncRuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            thread_name: "lattice-forms-async".to_string(),
        }
    }
}

impl AsyncRuntimeConfig {
    /// Set the number of worker threads.
    pub fn with_worker_threads(mut self, count: usize) -> Self {
        self.worker_threads = Some(count);
        self
    }
}

/// Spawns futures and delivers their results to a [`UiQueue`].
///
/// Either owns a multi-threaded runtime or borrows the handle of one that is
/// already running. Cloning shares the runtime.
#[derive(Clone)]
pub struct AsyncRuntime {
    // Keeps an owned runtime alive; `None` when wrapping a foreign handle.
    #[allow(dead_code)]
    runtime: Option<Arc<Runtime>>,
    handle: Handle,
    active_tasks: Arc<AtomicU64>,
}

impl AsyncRuntime {
    /// Create an owned multi-threaded runtime.
    pub fn new(config: AsyncRuntimeConfig) -> Result<Self, AsyncRuntimeError> {
        let mut builder = Builder::new_multi_thread();
        builder.thread_name(&config.thread_name).enable_time();
        if let Some(workers) = config.worker_threads {
            builder.worker_threads(workers);
        }

        let runtime = builder
            .build()
            .map_err(|e| AsyncRuntimeError::CreationFailed(e.to_string()))?;
        let handle = runtime.handle().clone();
        tracing::debug!(target: targets::ASYNC, thread_name = %config.thread_name, "created async runtime");

        Ok(Self {
            runtime: Some(Arc::new(runtime)),
            handle,
            active_tasks: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Wrap the handle of an existing runtime.
    pub fn from_handle(handle: Handle) -> Self {
        Self {
            runtime: None,
            handle,
            active_tasks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Wrap the runtime the current thread is running inside.
    pub fn current() -> Result<Self, AsyncRuntimeError> {
        Handle::try_current()
            .map(Self::from_handle)
            .map_err(|_| AsyncRuntimeError::NoRuntime)
    }

    /// Get a handle to the Tokio runtime.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Number of spawned tasks that have not completed.
    pub fn active_tasks(&self) -> u64 {
        self.active_tasks.load(Ordering::Acquire)
    }

    /// Spawn a future on the runtime.
    pub fn spawn<F, T>(&self, future: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let active_tasks = self.active_tasks.clone();
        active_tasks.fetch_add(1, Ordering::AcqRel);

        self.handle.spawn(async move {
            let result = future.await;
            active_tasks.fetch_sub(1, Ordering::AcqRel);
            result
        })
    }

    /// Spawn a future and run `callback` with its output on the queue's thread.
    ///
    /// The callback is always posted, never run inside the runtime.
    pub fn spawn_with_callback<F, T, C>(&self, queue: &UiQueue, future: F, callback: C) -> JoinHandle<()>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        let queue = queue.clone();
        self.spawn(async move {
            let result = future.await;
            queue.post(move || callback(result));
        })
    }
}

impl std::fmt::Debug for AsyncRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncRuntime")
            .field("owned", &self.runtime.is_some())
            .field("active_tasks", &self.active_tasks())
            .finish()
    }
}

/// Collapses bursts of calls into a single delayed invocation.
///
/// Each [`schedule`](Self::schedule) supersedes the previous one; only the
/// last action runs, `delay` after it was scheduled, posted to the queue.
pub struct Debouncer {
    runtime: AsyncRuntime,
    delay: Duration,
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    /// Create a debouncer spawning its timers on `runtime`.
    pub fn new(runtime: AsyncRuntime, delay: Duration) -> Self {
        Self {
            runtime,
            delay,
            generation: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
        }
    }

    /// The configured delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `action`, cancelling any action scheduled before.
    pub fn schedule<F>(&self, queue: &UiQueue, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = self.generation.clone();
        let queue = queue.clone();
        let delay = self.delay;

        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            queue.post(move || {
                // A newer schedule or a cancel happened after this timer fired.
                if generation.load(Ordering::SeqCst) == ticket {
                    action();
                }
            });
        });

        if let Some(previous) = self.pending.lock().replace(task) {
            previous.abort();
        }
    }

    /// Drop the pending action, if any.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.pending.lock().take() {
            task.abort();
        }
    }

    /// Whether a timer is still waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
