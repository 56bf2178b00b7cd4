use serde::{Deserialize, Serialize};
use tracing::info;

use ticketing_core::{DomainError, DomainResult, Entity, HasIdentity, UserId};
use ticketing_events::{EventBus, PlatformEvent, UserCreated};

/// Mutable attributes of a platform user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub role: String,
}

/// User entity: equality by `UserId` only.
pub type User = Entity<UserId, UserProfile>;

/// Account registration for the auth module.
#[derive(Debug, Clone)]
pub struct UserService<B> {
    bus: B,
}

impl<B> UserService<B>
where
    B: EventBus<PlatformEvent>,
{
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Create a user and announce it with [`UserCreated`].
    pub fn register(
        &self,
        user_id: UserId,
        email: impl Into<String>,
        role: impl Into<String>,
    ) -> DomainResult<User> {
        if user_id.is_blank() {
            return Err(DomainError::invalid_id("UserId: empty"));
        }
        let email = email.into().trim().to_string();
        let role = role.into().trim().to_string();

        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::validation("invalid email format"));
        }
        if role.is_empty() {
            return Err(DomainError::validation("role cannot be empty"));
        }

        let user = User::new(user_id, UserProfile { email, role });
        let profile = user.props();
        self.bus.publish(
            UserCreated::new(user.id().clone(), profile.email.clone(), profile.role.clone()).into(),
        );

        info!(user_id = %user.id(), role = %profile.role, "user registered");
        Ok(user)
    }
}
