//! Thin domain services: mutate an entity or compute a value, then publish the
//! matching domain event on the injected bus.

pub mod tickets;
pub mod users;

pub use tickets::TicketSales;
pub use users::{User, UserProfile, UserService};
