//! Engine notifications: the event contract and a synchronous observer bus.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, ListenerId};
pub use event::Event;
pub use in_memory_bus::InMemoryEventBus;
