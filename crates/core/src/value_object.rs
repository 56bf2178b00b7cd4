//! Value object trait: equality by value, not identity.
//!
//! Value objects are domain objects that have **no identity** - they are defined entirely
//! by their attribute values. Two value objects with the same values are considered equal.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// construct a new one; every operation on [`crate::Money`] returns a fresh
/// instance for this reason.
///
/// ## Value Object vs Entity
///
/// - **Value Object**: No identity (two value objects with same values are equal)
/// - **Entity**: Has identity (two entities with same ID are the same entity)
///
/// Example:
/// - `Money { amount: 1050, currency: "EUR" }` is a value object
/// - `Entity<UserId, UserProfile>` is an entity
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
