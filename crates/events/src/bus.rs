//! Event publishing/subscription abstraction (mechanics only).
//!
//! The engine is single-threaded and synchronous, so the bus is a plain
//! observer list: `publish` calls every matching listener before it returns.
//!
//! ## Delivery
//!
//! - Listeners run in **registration order**.
//! - A listener subscribed to one event type never sees other types.
//! - There is no ordering guarantee *across* event types beyond the order in
//!   which the engine publishes them.
//! - Nothing is buffered or persisted; a listener registered after a publish
//!   does not see it.

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Boxed listener callback.
pub type Listener<M> = Box<dyn FnMut(&M) + Send>;

/// Synchronous publish/subscribe contract.
///
/// `topic` is an event type name (see [`crate::Event::event_type`]); `None`
/// subscribes to everything.
pub trait EventBus<M> {
    /// Deliver `message` to every matching listener, in registration order.
    fn publish(&mut self, message: &M);

    fn subscribe(&mut self, topic: Option<&'static str>, listener: Listener<M>) -> ListenerId;

    /// Remove a listener. Returns `false` when the id is unknown.
    fn unsubscribe(&mut self, id: ListenerId) -> bool;

    fn listener_count(&self) -> usize;
}
