//! Lazily started, shared derived streams.
//!
//! A [`SharedStream`] owns one [`ReplayCell`] and the recipe for the task that
//! feeds it. The task is spawned on the first subscription and never again,
//! so however many consumers subscribe, the computation runs once and they
//! all observe the same values.

use super::channel::{ReplayCell, Subscription};
use super::tasks::TaskRegistry;
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

type Starter<T> = Box<dyn FnOnce(ReplayCell<T>) -> BoxFuture<'static, ()> + Send>;

/// Completes the output cell when the feeding task ends, is aborted, or is
/// dropped before it ever ran.
struct CompleteOnDrop<T>(ReplayCell<T>);

impl<T> Drop for CompleteOnDrop<T> {
    fn drop(&mut self) {
        self.0.complete();
    }
}

pub struct SharedStream<T> {
    name: &'static str,
    output: ReplayCell<T>,
    starter: Arc<Mutex<Option<Starter<T>>>>,
    tasks: Arc<TaskRegistry>,
}

impl<T> Clone for SharedStream<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            output: self.output.clone(),
            starter: Arc::clone(&self.starter),
            tasks: Arc::clone(&self.tasks),
        }
    }
}

impl<T> std::fmt::Debug for SharedStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStream")
            .field("name", &self.name)
            .field("started", &self.is_started())
            .finish_non_exhaustive()
    }
}

impl<T> SharedStream<T> {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// True once the feeding task has been spawned.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.starter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl<T: Clone + Send + 'static> SharedStream<T> {
    /// Declares a stream; `start` receives the output cell and returns the
    /// future that feeds it. The cell is completed when that future ends.
    pub fn new<F, Fut>(
        name: &'static str,
        capacity: usize,
        tasks: &Arc<TaskRegistry>,
        start: F,
    ) -> Self
    where
        F: FnOnce(ReplayCell<T>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let starter: Starter<T> = Box::new(move |output| start(output).boxed());
        Self {
            name,
            output: ReplayCell::new(capacity),
            starter: Arc::new(Mutex::new(Some(starter))),
            tasks: Arc::clone(tasks),
        }
    }

    /// Subscribes, starting the stream if this is the first subscriber.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<T> {
        let subscription = self.output.subscribe();
        self.ensure_started();
        subscription
    }

    /// Most recent value, without subscribing or starting the stream.
    #[must_use]
    pub fn latest(&self) -> Option<T> {
        self.output.latest()
    }

    fn ensure_started(&self) {
        let starter = self
            .starter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(start) = starter else {
            return;
        };
        debug!(stream = self.name, "First subscriber; starting stream");
        let guard = CompleteOnDrop(self.output.clone());
        let body = start(self.output.clone());
        self.tasks.spawn(self.name, async move {
            let _guard = guard;
            body.await;
        });
    }
}
