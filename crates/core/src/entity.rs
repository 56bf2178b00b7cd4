//! Entity trait: identity + continuity across state changes.
//!
//! Equality of entities is decided by identity alone. The capability is a
//! compile-time trait bound, so there is no runtime "is this an entity" check:
//! anything that can be compared implements [`HasIdentity`].

use core::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Identity capability shared by every domain entity.
pub trait HasIdentity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + Hash + core::fmt::Debug;

    /// Returns the entity identifier. Constant for the object's lifetime.
    fn id(&self) -> &Self::Id;

    /// True when `other` carries the same identity, whatever its concrete type
    /// or attribute values.
    fn same_identity_as<O>(&self, other: &O) -> bool
    where
        O: HasIdentity<Id = Self::Id> + ?Sized,
    {
        self.id() == other.id()
    }

    /// Identity equality against an optional counterpart.
    ///
    /// `None` is never equal. Never fails.
    fn equals<O>(&self, other: Option<&O>) -> bool
    where
        O: HasIdentity<Id = Self::Id> + ?Sized,
    {
        other.is_some_and(|o| self.same_identity_as(o))
    }
}

/// Generic entity: an identity plus a mutable bag of props.
///
/// Domain operations mutate `props` in place; the id never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity<I, P> {
    id: I,
    props: P,
}

impl<I, P> Entity<I, P> {
    pub fn new(id: I, props: P) -> Self {
        Self { id, props }
    }

    /// Create an entity with a freshly generated id.
    pub fn with_generated_id(props: P) -> Self
    where
        I: Default,
    {
        Self::new(I::default(), props)
    }

    pub fn props(&self) -> &P {
        &self.props
    }

    pub fn props_mut(&mut self) -> &mut P {
        &mut self.props
    }

    pub fn into_props(self) -> P {
        self.props
    }
}

impl<I, P> HasIdentity for Entity<I, P>
where
    I: Clone + Eq + Hash + core::fmt::Debug,
{
    type Id = I;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl<I: PartialEq, P> PartialEq for Entity<I, P> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<I: Eq, P> Eq for Entity<I, P> {}

impl<I: Hash, P> Hash for Entity<I, P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UserId;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    struct Profile {
        email: String,
    }

    #[derive(Debug)]
    struct Organizer {
        id: UserId,
    }

    impl HasIdentity for Organizer {
        type Id = UserId;

        fn id(&self) -> &UserId {
            &self.id
        }
    }

    fn user(id: &str, email: &str) -> Entity<UserId, Profile> {
        Entity::new(
            UserId::from(id),
            Profile {
                email: email.to_string(),
            },
        )
    }

    #[test]
    fn equal_ids_are_equal_regardless_of_props() {
        let a = user("u1", "a@b.com");
        let b = user("u1", "other@b.com");
        assert_eq!(a, b);
        assert!(a.equals(Some(&b)));
    }

    #[test]
    fn different_ids_are_not_equal() {
        let a = user("u1", "a@b.com");
        let b = user("u2", "a@b.com");
        assert_ne!(a, b);
        assert!(!a.equals(Some(&b)));
    }

    #[test]
    fn none_is_never_equal() {
        let a = user("u1", "a@b.com");
        assert!(!a.equals(None::<&Entity<UserId, Profile>>));
    }

    #[test]
    fn self_comparison_is_true() {
        let a = user("u1", "a@b.com");
        assert!(a.equals(Some(&a)));
    }

    #[test]
    fn identity_equality_crosses_concrete_types() {
        let a = user("u1", "a@b.com");
        let organizer = Organizer {
            id: UserId::from("u1"),
        };
        assert!(a.same_identity_as(&organizer));
        assert!(organizer.equals(Some(&a)));
    }

    #[test]
    fn props_mutation_keeps_identity() {
        let mut a = user("u1", "a@b.com");
        let before = a.id().clone();
        a.props_mut().email = "new@b.com".to_string();
        assert_eq!(a.id(), &before);
        assert_eq!(a.props().email, "new@b.com");
    }

    #[test]
    fn generated_ids_differ() {
        let a: Entity<UserId, ()> = Entity::with_generated_id(());
        let b: Entity<UserId, ()> = Entity::with_generated_id(());
        assert_ne!(a, b);
    }

    proptest! {
        #[test]
        fn equals_matches_id_equality(
            x in "[a-z0-9-]{0,12}",
            y in "[a-z0-9-]{0,12}",
            ex in "[a-z]{1,8}@[a-z]{1,8}",
            ey in "[a-z]{1,8}@[a-z]{1,8}",
        ) {
            let a = user(&x, &ex);
            let b = user(&y, &ey);
            prop_assert_eq!(a.equals(Some(&b)), a.id() == b.id());
            prop_assert_eq!(a.equals(Some(&b)), b.equals(Some(&a)));
            prop_assert_eq!(a == b, x == y);
        }

        #[test]
        fn equals_is_reflexive(x in ".{0,16}") {
            let a = user(&x, "a@b.com");
            prop_assert!(a.equals(Some(&a)));
            prop_assert!(!a.equals(None::<&Entity<UserId, Profile>>));
        }
    }
}
