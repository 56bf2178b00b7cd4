//! `ticketing-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identity-based entities, the `Money` value object and the domain error model.

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use entity::{Entity, HasIdentity};
pub use error::{DomainError, DomainResult};
pub use id::{PurchaseId, ShowId, UserId};
pub use money::{CurrencyCode, Locale, Money, MINOR_UNITS_PER_MAJOR};
pub use value_object::ValueObject;
