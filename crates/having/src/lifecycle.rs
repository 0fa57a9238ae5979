//! Host-process shutdown hook.
//!
//! The host registers best-effort callbacks (flushing log sinks, dumping
//! counters) and invokes [`LogShutdown::run`] once as late as possible during
//! termination. Callback failures are logged and swallowed so shutdown always
//! proceeds.

use crate::logging::lifecycle_log;
use std::{
    error::Error as StdError,
    panic::{self, AssertUnwindSafe},
    sync::{Mutex, MutexGuard, PoisonError},
};

static GLOBAL: LogShutdown = LogShutdown::new();

pub type CallbackResult = Result<(), Box<dyn StdError + Send + Sync>>;

type Callback = Box<dyn FnOnce() -> CallbackResult + Send>;

///
/// ShutdownReport
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ShutdownReport {
    pub executed: usize,
    pub failed: usize,
}

///
/// LogShutdown
///
/// Callback registry that runs at most once. Callbacks run in registration
/// order on the thread that calls `run`.
///
/// `None` marks a registry that has already run; registration and `run`
/// both decide under the same lock.
///

pub struct LogShutdown {
    callbacks: Mutex<Option<Vec<Callback>>>,
}

impl LogShutdown {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            callbacks: Mutex::new(Some(Vec::new())),
        }
    }

    /// Process-wide registry for hosts that do not thread their own through.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    pub fn start(&self) {
        lifecycle_log!(log::Level::Debug, "shutdown_waiting", "callbacks={}", self.pending());
    }

    /// Register a callback. Returns `false` when the registry has already
    /// run; the callback is dropped without being called.
    pub fn register<F>(&self, callback: F) -> bool
    where
        F: FnOnce() -> CallbackResult + Send + 'static,
    {
        let mut callbacks = self.lock();
        let Some(pending) = callbacks.as_mut() else {
            drop(callbacks);
            lifecycle_log!(log::Level::Warn, "shutdown_late_register", "dropped=1");
            return false;
        };

        pending.push(Box::new(callback));
        true
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock().as_ref().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn has_run(&self) -> bool {
        self.lock().is_none()
    }

    /// Run every registered callback. Later calls are no-ops.
    pub fn run(&self) -> ShutdownReport {
        let Some(callbacks) = self.lock().take() else {
            return ShutdownReport::default();
        };
        lifecycle_log!(log::Level::Info, "shutdown_running", "callbacks={}", callbacks.len());

        let mut report = ShutdownReport::default();
        for (index, callback) in callbacks.into_iter().enumerate() {
            report.executed += 1;

            match panic::catch_unwind(AssertUnwindSafe(callback)) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    report.failed += 1;
                    lifecycle_log!(
                        log::Level::Warn,
                        "shutdown_callback_failed",
                        "index={} error=\"{}\"",
                        index,
                        err
                    );
                }
                Err(_) => {
                    report.failed += 1;
                    lifecycle_log!(
                        log::Level::Warn,
                        "shutdown_callback_panicked",
                        "index={}",
                        index
                    );
                }
            }
        }

        report
    }

    fn lock(&self) -> MutexGuard<'_, Option<Vec<Callback>>> {
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LogShutdown {
    fn default() -> Self {
        Self::new()
    }
}

///
/// TESTS
///
