//! Task registry for the background tasks behind each derived stream.
//!
//! Every task spawned for a view session is registered here so the session
//! can abort all of them at once on shutdown.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

#[derive(Debug)]
pub struct TaskRegistry {
    shutdown_tx: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskRegistry {
    #[must_use]
    pub fn new() -> Self {
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);
        Self {
            shutdown_tx,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Spawns `fut` on the current runtime, cancelled when the registry shuts down.
    ///
    /// After shutdown the future is dropped without being polled.
    pub fn spawn<F>(&self, name: &'static str, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        if *shutdown_rx.borrow() {
            debug!(task = name, "Registry already shut down; task not started");
            return;
        }
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_rx.changed() => debug!(task = name, "Task cancelled by shutdown"),
                () = fut => trace!(task = name, "Task finished"),
            }
        });
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }

    /// Signals every task to stop and aborts the ones still running.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        for handle in handles.drain(..) {
            handle.abort();
        }
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}
