use std::any::Any;
use std::any::TypeId;

pub mod aggregator;
pub mod global;
pub(crate) mod handler;
pub mod subscription;

pub use aggregator::EventAggregator;
pub use subscription::Subscription;
pub use subscription::SubscriptionSet;

/// Trait for values that can be dispatched through type-routed publishing.
///
/// The `as_any()` downcasting method lets handlers extract the concrete
/// event type from a trait object. Most users only need to implement
/// `as_any()`; `upcast()` matters only for event hierarchies.
pub trait Event: Any + Send + Sync {
    /// Downcast this event to a concrete type.
    fn as_any(&self) -> &dyn Any;

    /// View of this event under an ancestor event type.
    ///
    /// An event that embeds a parent event can return the parent here so
    /// that handlers registered for the parent type also receive it.
    /// Implementations with several ancestors should delegate upward so
    /// the whole chain stays reachable. The default has no ancestors.
    fn upcast(&self, ty: TypeId) -> Option<&dyn Any> {
        let _ = ty;
        None
    }

    /// Get the name of the event type.
    fn event_name(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}
