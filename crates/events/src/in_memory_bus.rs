//! In-memory observer list.

use crate::bus::{EventBus, Listener, ListenerId};
use crate::event::Event;

struct Subscriber<M> {
    id: ListenerId,
    topic: Option<&'static str>,
    listener: Listener<M>,
}

/// In-process pub/sub bus.
///
/// - No IO / no async / no locking
/// - Fan-out in registration order
pub struct InMemoryEventBus<M> {
    subscribers: Vec<Subscriber<M>>,
    next_id: u64,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 1,
        }
    }
}

impl<M> core::fmt::Debug for InMemoryEventBus<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryEventBus")
            .field("listeners", &self.subscribers.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Event,
{
    fn publish(&mut self, message: &M) {
        let event_type = message.event_type();
        tracing::trace!(event_type, listeners = self.subscribers.len(), "publishing event");

        for sub in &mut self.subscribers {
            if sub.topic.is_none_or(|t| t == event_type) {
                (sub.listener)(message);
            }
        }
    }

    fn subscribe(&mut self, topic: Option<&'static str>, listener: Listener<M>) -> ListenerId {
        let id = ListenerId::from_raw(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber { id, topic, listener });
        id
    }

    fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    fn listener_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    enum Ping {
        A(u32),
        B,
    }

    impl Event for Ping {
        fn event_type(&self) -> &'static str {
            match self {
                Ping::A(_) => "ping.a",
                Ping::B => "ping.b",
            }
        }
    }

    #[test]
    fn delivers_in_registration_order_and_filters_by_topic() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus: InMemoryEventBus<Ping> = InMemoryEventBus::new();

        let s1 = seen.clone();
        bus.subscribe(Some("ping.a"), Box::new(move |m: &Ping| s1.lock().unwrap().push(format!("first {m:?}"))));
        let s2 = seen.clone();
        bus.subscribe(None, Box::new(move |m: &Ping| s2.lock().unwrap().push(format!("any {m:?}"))));

        bus.publish(&Ping::A(1));
        bus.publish(&Ping::B);

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["first A(1)", "any A(1)", "any B"]
        );
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let count = Arc::new(Mutex::new(0));
        let mut bus: InMemoryEventBus<Ping> = InMemoryEventBus::new();
        let c = count.clone();
        let id = bus.subscribe(None, Box::new(move |_: &Ping| *c.lock().unwrap() += 1));

        bus.publish(&Ping::B);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&Ping::B);

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(bus.listener_count(), 0);
    }
}
