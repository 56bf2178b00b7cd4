//! Domain events and the in-process event bus.

pub mod bus;
pub mod domain;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, SubscriberHandle, Subscription};
pub use domain::{PlatformEvent, TicketPurchased, UserCreated};
pub use event::DomainEvent;
pub use in_memory_bus::{BusConfig, InMemoryEventBus};
