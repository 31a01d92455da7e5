//! Session-wide error channel.
//!
//! Fetch-backed streams report failures here instead of failing downstream.
//! The channel keeps every message; subscribers get the full history first,
//! then live messages. Live messages are queued per subscriber, so a slow
//! subscriber falls behind but never misses one.

use super::channel::{Fanout, Subscription};
use crate::errors::Error;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::error;

/// A human-readable failure raised by one of the view's streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessage {
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[derive(Debug)]
struct ErrorState {
    history: Vec<ErrorMessage>,
    subscribers: Fanout<ErrorMessage>,
}

#[derive(Debug, Clone)]
pub struct ErrorChannel {
    inner: Arc<Mutex<ErrorState>>,
}

impl Default for ErrorChannel {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ErrorState {
                history: Vec::new(),
                subscribers: Fanout::default(),
            })),
        }
    }
}

impl ErrorChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ErrorState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a failure message and broadcasts it.
    pub fn push(&self, message: impl Into<String>) {
        let message = ErrorMessage {
            message: message.into(),
            raised_at: Utc::now(),
        };
        error!("{}", message.message);
        let mut state = self.state();
        state.subscribers.send(&message);
        state.history.push(message);
    }

    /// Records `err` with a short context prefix.
    pub fn report(&self, context: &str, err: &Error) {
        self.push(format!("{context}: {err}"));
    }

    /// The message to display: the most recent one.
    #[must_use]
    pub fn latest(&self) -> Option<ErrorMessage> {
        self.state().history.last().cloned()
    }

    #[must_use]
    pub fn history(&self) -> Vec<ErrorMessage> {
        self.state().history.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state().history.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state().history.is_empty()
    }

    /// Subscribes, replaying every message raised so far.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<ErrorMessage> {
        let mut state = self.state();
        let history = state.history.clone();
        Subscription::queued(history, state.subscribers.subscribe())
    }
}
