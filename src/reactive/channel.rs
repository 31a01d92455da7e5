//! Multicast primitives the view is wired from.
//!
//! Three flavours, kept deliberately apart:
//! - [`StateCell`]: latest-value state. New subscribers get the current value
//!   first, then every change. Backed by a `watch` channel.
//! - [`EventEmitter`]: pure events. Late subscribers see nothing from before
//!   they subscribed, but a subscriber never loses an event emitted after it
//!   subscribed. Each subscriber reads from its own unbounded queue.
//! - [`ReplayCell`]: the output side of a derived stream. Every published
//!   value reaches every live subscriber, the most recent one is replayed to
//!   late subscribers, and the cell can be completed. A subscriber more than
//!   the channel capacity behind skips ahead, but always reaches the latest
//!   value.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{trace, warn};

/// Default buffer for derived-stream outputs before a slow subscriber starts lagging.
pub const DEFAULT_CAPACITY: usize = 256;

// ─────────────────────────────────────────────────────────────────────────────
// Subscription
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
enum Feed<T> {
    Broadcast(broadcast::Receiver<T>),
    Queue(mpsc::UnboundedReceiver<T>),
}

/// Receiving end of an [`EventEmitter`], a [`ReplayCell`] or the error channel.
///
/// Yields any replayed values first, then live values. `next` returns `None`
/// once the source has completed and everything buffered has been read.
#[derive(Debug)]
pub struct Subscription<T> {
    replay: VecDeque<T>,
    feed: Option<Feed<T>>,
}

impl<T: Clone> Subscription<T> {
    pub(crate) fn new(
        replay: impl IntoIterator<Item = T>,
        receiver: Option<broadcast::Receiver<T>>,
    ) -> Self {
        Self {
            replay: replay.into_iter().collect(),
            feed: receiver.map(Feed::Broadcast),
        }
    }

    /// A subscription fed by its own unbounded queue; nothing is ever skipped.
    pub(crate) fn queued(
        replay: impl IntoIterator<Item = T>,
        receiver: mpsc::UnboundedReceiver<T>,
    ) -> Self {
        Self {
            replay: replay.into_iter().collect(),
            feed: Some(Feed::Queue(receiver)),
        }
    }

    /// Waits for the next value. Cancel safe, so it can sit in a `select!`.
    pub async fn next(&mut self) -> Option<T> {
        if let Some(value) = self.replay.pop_front() {
            return Some(value);
        }
        let next = match self.feed.as_mut()? {
            Feed::Queue(receiver) => receiver.recv().await,
            Feed::Broadcast(receiver) => loop {
                match receiver.recv().await {
                    Ok(value) => break Some(value),
                    Err(broadcast::error::RecvError::Closed) => break None,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Subscriber lagged behind its source; values were skipped");
                    }
                }
            },
        };
        if next.is_none() {
            self.feed = None;
        }
        next
    }

    /// True once the source completed and nothing is left to read.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.replay.is_empty() && self.feed.is_none()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// StateCell
// ─────────────────────────────────────────────────────────────────────────────

/// Latest-value broadcast cell for selection state.
#[derive(Debug)]
pub struct StateCell<T> {
    sender: Arc<watch::Sender<T>>,
}

impl<T> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T: Clone> StateCell<T> {
    pub fn new(initial: T) -> Self {
        let (sender, _receiver) = watch::channel(initial);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Records a new current value and wakes every subscriber.
    pub fn set(&self, value: T) {
        self.sender.send_replace(value);
    }

    #[must_use]
    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    /// Subscribes; the first `next` yields the current value immediately.
    #[must_use]
    pub fn stream(&self) -> StateStream<T> {
        StateStream {
            receiver: self.sender.subscribe(),
            primed: false,
        }
    }
}

/// Subscriber side of a [`StateCell`].
#[derive(Debug)]
pub struct StateStream<T> {
    receiver: watch::Receiver<T>,
    primed: bool,
}

impl<T: Clone> StateStream<T> {
    /// Current value on the first call, then each change.
    ///
    /// State is latest-wins: a subscriber that falls behind sees the newest
    /// value rather than every intermediate one.
    pub async fn next(&mut self) -> Option<T> {
        if !self.primed {
            self.primed = true;
            return Some(self.receiver.borrow_and_update().clone());
        }
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventEmitter
// ─────────────────────────────────────────────────────────────────────────────

/// One unbounded queue per subscriber. Dropped subscribers are pruned on send.
#[derive(Debug)]
pub(crate) struct Fanout<T> {
    subscribers: Vec<mpsc::UnboundedSender<T>>,
}

impl<T> Default for Fanout<T> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<T: Clone> Fanout<T> {
    /// Queues `value` for every live subscriber and returns how many there are.
    pub(crate) fn send(&mut self, value: &T) -> usize {
        self.subscribers
            .retain(|subscriber| subscriber.send(value.clone()).is_ok());
        self.subscribers.len()
    }

    pub(crate) fn subscribe(&mut self) -> mpsc::UnboundedReceiver<T> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.push(sender);
        receiver
    }
}

/// Fire-once multicast events with no replay.
#[derive(Debug)]
pub struct EventEmitter<T> {
    fanout: Arc<Mutex<Fanout<T>>>,
}

impl<T> Clone for EventEmitter<T> {
    fn clone(&self) -> Self {
        Self {
            fanout: Arc::clone(&self.fanout),
        }
    }
}

impl<T> Default for EventEmitter<T> {
    fn default() -> Self {
        Self {
            fanout: Arc::new(Mutex::new(Fanout::default())),
        }
    }
}

impl<T: Clone> EventEmitter<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn fanout(&self) -> MutexGuard<'_, Fanout<T>> {
        self.fanout.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Emits an event, returning how many subscribers it reached.
    pub fn emit(&self, event: T) -> usize {
        self.fanout().send(&event)
    }

    /// Subscribes to events emitted from now on.
    #[must_use]
    pub fn stream(&self) -> Subscription<T> {
        Subscription::queued(None, self.fanout().subscribe())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ReplayCell
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct ReplayState<T> {
    latest: Option<T>,
    sender: Option<broadcast::Sender<T>>,
}

/// Multicast-with-replay output of a derived stream.
#[derive(Debug)]
pub struct ReplayCell<T> {
    inner: Arc<Mutex<ReplayState<T>>>,
}

impl<T> Clone for ReplayCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> ReplayCell<T> {
    fn state(&self) -> MutexGuard<'_, ReplayState<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Completes the cell. Subscribers drain what they have, then see `None`.
    /// The last value stays available for replay.
    pub fn complete(&self) {
        self.state().sender = None;
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state().sender.is_none()
    }
}

impl<T: Clone> ReplayCell<T> {
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(Mutex::new(ReplayState {
                latest: None,
                sender: Some(sender),
            })),
        }
    }

    /// Publishes a value to every subscriber and keeps it for replay.
    ///
    /// Returns `false` when the cell has already completed.
    pub fn publish(&self, value: T) -> bool {
        let mut state = self.state();
        let Some(sender) = state.sender.as_ref() else {
            trace!("Value published after completion was dropped");
            return false;
        };
        // Nobody listening is fine; the value is still replayed later.
        let _ = sender.send(value.clone());
        state.latest = Some(value);
        true
    }

    #[must_use]
    pub fn latest(&self) -> Option<T> {
        self.state().latest.clone()
    }

    /// Subscribes, replaying the latest value if there is one.
    ///
    /// Replay and live subscription are taken under one lock, so a concurrent
    /// `publish` is seen exactly once.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<T> {
        let state = self.state();
        Subscription::new(
            state.latest.clone(),
            state.sender.as_ref().map(broadcast::Sender::subscribe),
        )
    }
}
