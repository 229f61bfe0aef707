use std::any::TypeId;

use anyhow::Result;

use super::Event;

type EventCallback<E> = Box<dyn Fn(&E) -> Result<()> + Send + Sync>;

/// Pairs a callback with the event type it was registered for.
///
/// Type-routed publishing scans every registered handler; each handler
/// decides for itself whether the published event matches its type.
pub(crate) struct Handler<E: Event> {
    callback: EventCallback<E>,
}

impl<E: Event> Handler<E> {
    pub(crate) fn new<F>(callback: F) -> Self
    where
        F: Fn(&E) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }
}

/// Object-safe view of [`Handler`] stored in the routing table.
pub(crate) trait DynHandler: Send + Sync {
    /// Invokes the wrapped callback iff the event matches the stored type.
    fn handle(&self, event: &dyn Event) -> Result<()>;
}

impl<E: Event> DynHandler for Handler<E> {
    fn handle(&self, event: &dyn Event) -> Result<()> {
        let target = TypeId::of::<E>();
        let view = event
            .as_any()
            .downcast_ref::<E>()
            .or_else(|| event.upcast(target).and_then(|v| v.downcast_ref::<E>()));
        match view {
            Some(event) => (self.callback)(event),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::any::TypeId;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;

    struct Ping;

    impl Event for Ping {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct Pong;

    impl Event for Pong {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct LoudPing {
        base: Ping,
    }

    impl Event for LoudPing {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn upcast(&self, ty: TypeId) -> Option<&dyn Any> {
            (ty == TypeId::of::<Ping>()).then_some(&self.base as &dyn Any)
        }
    }

    #[test]
    fn test_handler_matches_exact_type() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();
        let handler = Handler::new(move |_: &Ping| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        handler.handle(&Ping).unwrap();
        handler.handle(&Pong).unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_matches_upcast_view() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();
        let handler = Handler::new(move |_: &Ping| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        handler.handle(&LoudPing { base: Ping }).unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_ignores_unrelated_upcast() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();
        let handler = Handler::new(move |_: &Pong| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        handler.handle(&LoudPing { base: Ping }).unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
