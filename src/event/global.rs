//! Process-wide default aggregator with free-function bindings.
//!
//! Libraries and applications that want dependency injection should
//! construct their own [`EventAggregator`] and pass it around; these
//! bindings exist for hosts that prefer one shared instance.

use std::any::Any;
use std::sync::OnceLock;

use anyhow::Result;

use super::Event;
use super::EventAggregator;
use super::Subscription;
use crate::error::AggregatorError;

static GLOBAL: OnceLock<EventAggregator> = OnceLock::new();

/// The process-wide aggregator, constructed on first use.
///
/// Lives for the rest of the process; there is no teardown since it owns
/// no external resources.
pub fn aggregator() -> &'static EventAggregator {
    GLOBAL.get_or_init(EventAggregator::new)
}

pub fn publish(channel: &str, payload: &dyn Any) -> Result<(), AggregatorError> {
    aggregator().publish(channel, payload)
}

pub fn subscribe<F>(channel: impl Into<String>, callback: F) -> Result<Subscription, AggregatorError>
where
    F: Fn(&dyn Any, &str) -> Result<()> + Send + Sync + 'static,
{
    aggregator().subscribe(channel, callback)
}

pub fn subscribe_once<F>(
    channel: impl Into<String>,
    callback: F,
) -> Result<Subscription, AggregatorError>
where
    F: Fn(&dyn Any, &str) -> Result<()> + Send + Sync + 'static,
{
    aggregator().subscribe_once(channel, callback)
}

pub fn publish_event<E: Event>(event: &E) {
    aggregator().publish_event(event)
}

pub fn subscribe_event<E, F>(callback: F) -> Subscription
where
    E: Event,
    F: Fn(&E) -> Result<()> + Send + Sync + 'static,
{
    aggregator().subscribe_event(callback)
}

pub fn subscribe_event_once<E, F>(callback: F) -> Subscription
where
    E: Event,
    F: Fn(&E) -> Result<()> + Send + Sync + 'static,
{
    aggregator().subscribe_event_once(callback)
}
