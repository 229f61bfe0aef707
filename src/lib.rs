//! crier - An in-process publish/subscribe event aggregator.
//!
//! Producers publish either to a named channel (string key) or as typed
//! event values; subscribers register a callback for a channel name or an
//! event type and are invoked synchronously on every matching publish.
//! Each registration returns a [`Subscription`] handle whose `dispose()`
//! removes exactly that registration.
//!
//! Delivery runs in reverse registration order, a failing subscriber is
//! logged and skipped without affecting its siblings, and the listener
//! list is snapshotted before dispatch so subscriptions may be disposed
//! (or added) from inside a callback.

pub mod error;
pub mod event;
pub mod logging;

pub use error::AggregatorError;
pub use event::Event;
pub use event::EventAggregator;
pub use event::Subscription;
pub use event::SubscriptionSet;
