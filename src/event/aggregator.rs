use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::panic::catch_unwind;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use anyhow::Result;
use tracing::debug;
use tracing::error;

use super::Event;
use super::handler::DynHandler;
use super::handler::Handler;
use super::subscription::Slot;
use super::subscription::Subscription;
use crate::error::AggregatorError;

type ChannelCallback = Arc<dyn Fn(&dyn Any, &str) -> Result<()> + Send + Sync>;

#[derive(Clone)]
struct ChannelListener {
    id: u64,
    callback: ChannelCallback,
}

#[derive(Clone)]
struct HandlerEntry {
    id: u64,
    handler: Arc<dyn DynHandler>,
}

/// Routing tables shared between the aggregator and its subscription handles.
///
/// Lock discipline: write lock for subscribe/remove, read lock only for the
/// snapshot copy at the start of a publish. Dispatch itself runs outside the
/// lock, so a subscriber may re-enter `remove` (or subscribe) mid-delivery.
pub(crate) struct Registry {
    channels: RwLock<HashMap<String, Vec<ChannelListener>>>,
    handlers: RwLock<Vec<HandlerEntry>>,
    next_id: AtomicU64,
}

impl Registry {
    fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            handlers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Removes one registration by id. Absence is not an error.
    pub(crate) fn remove(&self, slot: &Slot, id: u64) {
        match slot {
            Slot::Channel(channel) => {
                let mut channels = self.channels.write().unwrap();
                if let Some(listeners) = channels.get_mut(channel)
                    && let Some(pos) = listeners.iter().position(|l| l.id == id)
                {
                    listeners.remove(pos);
                }
            }
            Slot::Handler => {
                let mut handlers = self.handlers.write().unwrap();
                if let Some(pos) = handlers.iter().position(|h| h.id == id) {
                    handlers.remove(pos);
                }
            }
        }
    }
}

/// In-process publish/subscribe dispatcher with two routing modes.
///
/// Channel routing keys subscriptions by a string name; typed routing keys
/// them by the Rust type of the published [`Event`]. Delivery is synchronous
/// on the calling thread, in reverse registration order (last subscribed,
/// first notified). A failing subscriber is logged and skipped, never
/// propagated to the publisher or allowed to block its siblings.
pub struct EventAggregator {
    registry: Arc<Registry>,
}

impl EventAggregator {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry::new()),
        }
    }

    /// Registers `callback` for every publish to `channel`.
    ///
    /// The callback receives the published payload and the channel name.
    /// Registration alone never invokes it.
    pub fn subscribe<F>(
        &self,
        channel: impl Into<String>,
        callback: F,
    ) -> Result<Subscription, AggregatorError>
    where
        F: Fn(&dyn Any, &str) -> Result<()> + Send + Sync + 'static,
    {
        self.insert_channel_listener(channel.into(), Arc::new(callback))
    }

    /// Registers `callback` for the next publish to `channel` only.
    ///
    /// The registration removes itself before the callback runs, so a
    /// publish from inside the callback cannot re-trigger it. Disposing the
    /// returned handle before the first matching publish prevents the
    /// callback from ever running.
    pub fn subscribe_once<F>(
        &self,
        channel: impl Into<String>,
        callback: F,
    ) -> Result<Subscription, AggregatorError>
    where
        F: Fn(&dyn Any, &str) -> Result<()> + Send + Sync + 'static,
    {
        let channel = channel.into();
        if channel.is_empty() {
            return Err(AggregatorError::EmptyChannel);
        }
        let id = self.registry.next_id();
        let registry = Arc::downgrade(&self.registry);
        let slot = Slot::Channel(channel.clone());

        let unhook = registry.clone();
        let unhook_slot = slot.clone();
        let wrapped = move |payload: &dyn Any, name: &str| {
            if let Some(registry) = unhook.upgrade() {
                registry.remove(&unhook_slot, id);
            }
            callback(payload, name)
        };

        self.registry
            .channels
            .write()
            .unwrap()
            .entry(channel)
            .or_default()
            .push(ChannelListener {
                id,
                callback: Arc::new(wrapped),
            });
        Ok(Subscription::new(registry, slot, id))
    }

    /// Delivers `payload` to every subscriber of `channel`.
    ///
    /// Publishing to a channel nobody subscribed to is a no-op, not an
    /// error. The listener list is snapshotted before delivery, so
    /// subscribers may dispose or add subscriptions mid-dispatch without
    /// affecting the in-flight delivery.
    pub fn publish(&self, channel: &str, payload: &dyn Any) -> Result<(), AggregatorError> {
        if channel.is_empty() {
            return Err(AggregatorError::EmptyChannel);
        }
        let snapshot = {
            let channels = self.registry.channels.read().unwrap();
            match channels.get(channel) {
                Some(listeners) => listeners.clone(),
                None => return Ok(()),
            }
        };

        debug!(channel, listeners = snapshot.len(), "publishing to channel");
        for listener in snapshot.iter().rev() {
            fence(channel, || (listener.callback)(payload, channel));
        }
        Ok(())
    }

    /// Registers `callback` for every published event of type `E`.
    ///
    /// Also fires for events that expose an `E` view through
    /// [`Event::upcast`]. Type keys are always valid, so unlike channel
    /// subscription this cannot fail.
    pub fn subscribe_event<E, F>(&self, callback: F) -> Subscription
    where
        E: Event,
        F: Fn(&E) -> Result<()> + Send + Sync + 'static,
    {
        let id = self.registry.next_id();
        self.registry.handlers.write().unwrap().push(HandlerEntry {
            id,
            handler: Arc::new(Handler::new(callback)),
        });
        Subscription::new(Arc::downgrade(&self.registry), Slot::Handler, id)
    }

    /// Registers `callback` for the next matching event of type `E` only.
    pub fn subscribe_event_once<E, F>(&self, callback: F) -> Subscription
    where
        E: Event,
        F: Fn(&E) -> Result<()> + Send + Sync + 'static,
    {
        let id = self.registry.next_id();
        let registry = Arc::downgrade(&self.registry);

        let unhook = registry.clone();
        let wrapped = move |event: &E| {
            if let Some(registry) = unhook.upgrade() {
                registry.remove(&Slot::Handler, id);
            }
            callback(event)
        };

        self.registry.handlers.write().unwrap().push(HandlerEntry {
            id,
            handler: Arc::new(Handler::new(wrapped)),
        });
        Subscription::new(registry, Slot::Handler, id)
    }

    /// Delivers `event` to every handler whose type matches.
    ///
    /// All registered handlers are scanned in reverse registration order;
    /// each decides via its stored type whether to invoke its callback.
    pub fn publish_event<E: Event>(&self, event: &E) {
        let snapshot = self.registry.handlers.read().unwrap().clone();
        let name = event.event_name();

        debug!(event = %name, handlers = snapshot.len(), "publishing typed event");
        for entry in snapshot.iter().rev() {
            fence(&name, || entry.handler.handle(event));
        }
    }

    fn insert_channel_listener(
        &self,
        channel: String,
        callback: ChannelCallback,
    ) -> Result<Subscription, AggregatorError> {
        if channel.is_empty() {
            return Err(AggregatorError::EmptyChannel);
        }
        let id = self.registry.next_id();
        self.registry
            .channels
            .write()
            .unwrap()
            .entry(channel.clone())
            .or_default()
            .push(ChannelListener { id, callback });
        Ok(Subscription::new(
            Arc::downgrade(&self.registry),
            Slot::Channel(channel),
            id,
        ))
    }
}

impl Default for EventAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs one subscriber invocation, trapping both `Err` returns and panics.
///
/// Failures are logged against the routing key and dropped so delivery to
/// the remaining snapshot entries continues and nothing reaches the
/// publisher.
fn fence(key: &str, call: impl FnOnce() -> Result<()>) {
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            error!(key, "Subscriber returned error: {err:#}");
        }
        Err(panic) => {
            error!(key, "Subscriber panicked: {}", panic_message(&panic));
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "<non-string panic payload>"
    }
}
