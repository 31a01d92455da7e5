//! Reactive plumbing - channels, shared derived streams, and the error sink.

/// State cells, event emitters, replay cells, and subscriptions
pub mod channel;
/// Session-wide error channel
pub mod error_channel;
/// Lazily started shared streams
pub mod shared;
/// Background task registry
pub mod tasks;

pub use channel::{
    DEFAULT_CAPACITY, EventEmitter, ReplayCell, StateCell, StateStream, Subscription,
};
pub use error_channel::{ErrorChannel, ErrorMessage};
pub use shared::SharedStream;
pub use tasks::TaskRegistry;
