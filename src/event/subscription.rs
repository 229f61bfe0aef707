use std::sync::Weak;

use super::aggregator::Registry;

/// Which routing table a subscription was inserted into.
#[derive(Clone)]
pub(crate) enum Slot {
    Channel(String),
    Handler,
}

/// Disposable handle for one registration.
///
/// Returned by every subscribe call. Its sole capability is [`dispose`],
/// which removes exactly the registration it was created for. Dropping the
/// handle without calling `dispose` leaves the registration in place.
///
/// [`dispose`]: Subscription::dispose
pub struct Subscription {
    registry: Weak<Registry>,
    slot: Slot,
    id: u64,
}

impl Subscription {
    pub(crate) fn new(registry: Weak<Registry>, slot: Slot, id: u64) -> Self {
        Self { registry, slot, id }
    }

    /// Removes the bound registration if it is still present.
    ///
    /// Idempotent: disposing twice, or disposing a registration that was
    /// already removed (e.g. by a once-subscription firing), is a no-op.
    pub fn dispose(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.slot, self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = match &self.slot {
            Slot::Channel(name) => name.as_str(),
            Slot::Handler => "<typed>",
        };
        f.debug_struct("Subscription")
            .field("slot", &slot)
            .field("id", &self.id)
            .finish()
    }
}

/// Collects subscription handles and disposes them all on drop.
///
/// A component that subscribes at construction time can push every handle
/// into a set it owns; teardown then happens automatically when the
/// component (and the set with it) is dropped.
#[derive(Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of a handle for later disposal.
    pub fn push(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Disposes every held handle and empties the set.
    pub fn dispose_all(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.dispose();
        }
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        self.dispose_all();
    }
}

impl Extend<Subscription> for SubscriptionSet {
    fn extend<I: IntoIterator<Item = Subscription>>(&mut self, iter: I) {
        self.subscriptions.extend(iter);
    }
}
