use crate::domain::error::{GatewayError, GatewayResult};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Subscriber callback. Identity is the `Arc` allocation, so keep a clone
/// of the handler to unsubscribe it later.
pub type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Multi-subscriber broadcast.
///
/// Subscribers form an ordered set: they fire in subscription order and
/// subscribing the same handler twice has no additional effect.
pub struct Event<T> {
    handlers: Mutex<Vec<Handler<T>>>,
}

impl<T> Event<T> {
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(Vec::new()),
        }
    }

    fn handlers(&self) -> MutexGuard<'_, Vec<Handler<T>>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a subscriber. Returns `false` if it was already subscribed.
    pub fn subscribe(&self, handler: Handler<T>) -> bool {
        let mut handlers = self.handlers();
        if handlers.iter().any(|h| Arc::ptr_eq(h, &handler)) {
            return false;
        }
        handlers.push(handler);
        true
    }

    /// Remove a subscriber
    pub fn unsubscribe(&self, handler: &Handler<T>) -> GatewayResult<()> {
        let mut handlers = self.handlers();
        let position = handlers
            .iter()
            .position(|h| Arc::ptr_eq(h, handler))
            .ok_or(GatewayError::HandlerNotSubscribed)?;
        handlers.remove(position);
        Ok(())
    }

    /// Invoke every current subscriber with `args`.
    ///
    /// The subscriber list is copied first, so handlers may subscribe or
    /// unsubscribe while being fired.
    pub fn fire(&self, args: &T) {
        let handlers = self.handlers().clone();
        for handler in handlers {
            handler(args);
        }
    }

    pub fn count(&self) -> usize {
        self.handlers().len()
    }
}

impl<T> Default for Event<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_handler(counter: &Arc<AtomicUsize>) -> Handler<u32> {
        let counter = Arc::clone(counter);
        Arc::new(move |value: &u32| {
            counter.fetch_add(*value as usize, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_subscribe_and_fire() {
        let event = Event::new();
        let counter = Arc::new(AtomicUsize::new(0));
        assert!(event.subscribe(counting_handler(&counter)));
        assert!(event.subscribe(counting_handler(&counter)));
        assert_eq!(event.count(), 2);

        event.fire(&3);
        assert_eq!(counter.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_duplicate_subscription_is_ignored() {
        let event = Event::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let handler = counting_handler(&counter);

        assert!(event.subscribe(Arc::clone(&handler)));
        assert!(!event.subscribe(Arc::clone(&handler)));
        assert_eq!(event.count(), 1);

        event.fire(&1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let event = Event::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let handler = counting_handler(&counter);

        event.subscribe(Arc::clone(&handler));
        event.unsubscribe(&handler).unwrap();
        assert_eq!(event.count(), 0);

        event.fire(&1);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_unknown_handler() {
        let event: Event<u32> = Event::new();
        let handler: Handler<u32> = Arc::new(|_: &u32| {});
        let result = event.unsubscribe(&handler);
        assert!(matches!(result, Err(GatewayError::HandlerNotSubscribed)));
    }

    #[test]
    fn test_fire_in_subscription_order() {
        let event = Event::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            event.subscribe(Arc::new(move |_: &()| order.lock().unwrap().push(name)));
        }

        event.fire(&());
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_handler_may_unsubscribe_itself() {
        let event: Arc<Event<()>> = Arc::new(Event::new());
        let slot: Arc<Mutex<Option<Handler<()>>>> = Arc::new(Mutex::new(None));

        let handler: Handler<()> = {
            let event = Arc::clone(&event);
            let slot = Arc::clone(&slot);
            Arc::new(move |_: &()| {
                if let Some(me) = slot.lock().unwrap().take() {
                    event.unsubscribe(&me).unwrap();
                }
            })
        };
        *slot.lock().unwrap() = Some(Arc::clone(&handler));
        event.subscribe(handler);

        event.fire(&());
        assert_eq!(event.count(), 0);
    }
}
