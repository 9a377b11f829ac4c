//! Synchronous fan-out of events to subscribers.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use thiserror::Error;
use tracing::{debug, warn};

use super::{Event, EventKind};

/// Failure reported by a subscriber. Logged by the bus, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub type HandlerResult = Result<(), HandlerError>;

type Handler = Arc<dyn Fn(&Event) -> HandlerResult + Send + Sync>;

struct Entry {
    id: u64,
    kind: EventKind,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Process-wide fan-out keyed by event kind.
///
/// Cloning yields another handle to the same registry. There is no
/// buffering: a handler registered after an event was published never sees it.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`.
    ///
    /// The handler stays registered until the returned [`Subscription`] is
    /// unsubscribed or dropped.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&Event) -> HandlerResult + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push(Entry {
            id,
            kind,
            handler: Arc::new(handler),
        });
        debug!("subscribed handler {} to {}", id, kind);

        Subscription {
            id,
            kind,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Invoke every handler registered for `event.kind()`, in registration
    /// order.
    ///
    /// Handlers run against a snapshot taken before the first call, so a
    /// handler may subscribe or unsubscribe without deadlocking. An error or
    /// panic in one handler is logged and the remaining handlers still run.
    /// Returns the number of handlers that completed successfully.
    pub fn publish(&self, event: &Event) -> usize {
        let kind = event.kind();
        let snapshot: Vec<(u64, Handler)> = lock(&self.registry)
            .entries
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| (e.id, Arc::clone(&e.handler)))
            .collect();

        let mut delivered = 0;
        for (id, handler) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => warn!("{} handler {} failed: {}", kind, id, e),
                Err(panic) => warn!(
                    "{} handler {} panicked: {}",
                    kind,
                    id,
                    panic_message(panic.as_ref())
                ),
            }
        }
        delivered
    }

    /// Number of handlers currently registered for `kind`.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        lock(&self.registry)
            .entries
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = lock(&self.registry);
        f.debug_struct("EventBus")
            .field("subscribers", &registry.entries.len())
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Unsubscribe capability returned by [`EventBus::subscribe`].
///
/// Dropping it unsubscribes. Outliving the bus is harmless.
#[must_use = "dropping a Subscription unsubscribes the handler immediately"]
pub struct Subscription {
    id: u64,
    kind: EventKind,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).entries.retain(|e| e.id != self.id);
            debug!("unsubscribed handler {} from {}", self.id, self.kind);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CloseInfo, EventPayload};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn open_event() -> Event {
        Event::new(EventPayload::Open, Utc::now())
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let subs: Vec<Subscription> = (0..3)
            .map(|i| {
                let order = Arc::clone(&order);
                bus.subscribe(EventKind::Open, move |_| {
                    order.lock().unwrap().push(i);
                    Ok(())
                })
            })
            .collect();

        assert_eq!(bus.publish(&open_event()), 3);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
        drop(subs);
    }

    #[test]
    fn test_only_matching_kind_is_invoked() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let _sub = bus.subscribe(EventKind::Trap, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.publish(&open_event());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failing_and_panicking_handlers_are_isolated() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let _failing = bus.subscribe(EventKind::Close, |_| Err(HandlerError::new("nope")));
        let _panicking = bus.subscribe(EventKind::Close, |_| panic!("handler blew up"));
        let counter = Arc::clone(&hits);
        let _healthy = bus.subscribe(EventKind::Close, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let event = Event::new(
            EventPayload::Close(CloseInfo {
                code: 1006,
                reason: String::new(),
            }),
            Utc::now(),
        );
        assert_eq!(bus.publish(&event), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_and_unsubscribe_remove_handler() {
        let bus = EventBus::new();
        let first = bus.subscribe(EventKind::Open, |_| Ok(()));
        let second = bus.subscribe(EventKind::Open, |_| Ok(()));
        assert_eq!(bus.subscriber_count(EventKind::Open), 2);

        first.unsubscribe();
        assert_eq!(bus.subscriber_count(EventKind::Open), 1);

        drop(second);
        assert_eq!(bus.subscriber_count(EventKind::Open), 0);
        assert_eq!(bus.publish(&open_event()), 0);
    }

    #[test]
    fn test_late_subscriber_sees_nothing() {
        let bus = EventBus::new();
        bus.publish(&open_event());

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let _sub = bus.subscribe(EventKind::Open, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handler_may_subscribe_during_publish() {
        let bus = EventBus::new();
        let inner_bus = bus.clone();
        let late = Arc::new(Mutex::new(Vec::new()));
        let late_store = Arc::clone(&late);

        let _sub = bus.subscribe(EventKind::Open, move |_| {
            let sub = inner_bus.subscribe(EventKind::Open, |_| Ok(()));
            late_store.lock().unwrap().push(sub);
            Ok(())
        });

        assert_eq!(bus.publish(&open_event()), 1);
        assert_eq!(bus.subscriber_count(EventKind::Open), 2);
    }

    #[test]
    fn test_subscription_outlives_bus() {
        let bus = EventBus::new();
        let sub = bus.subscribe(EventKind::Log, |_| Ok(()));
        drop(bus);
        drop(sub);
    }
}
