//! Domain events emitted from business operations.
//!
//! Records are immutable: fields are private, set once by the constructor and
//! exposed through accessors. No validation happens here; the constructing
//! caller is responsible for the values it passes in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ticketing_core::{Money, PurchaseId, ShowId, UserId};

use crate::event::DomainEvent;

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

/// Event emitted when a user account is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreated {
    user_id: UserId,
    email: String,
    role: String,
    occurred_at: DateTime<Utc>,
}

impl UserCreated {
    pub fn new(user_id: impl Into<UserId>, email: impl Into<String>, role: impl Into<String>) -> Self {
        Self::new_at(user_id, email, role, Utc::now())
    }

    pub fn new_at(
        user_id: impl Into<UserId>,
        email: impl Into<String>,
        role: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            role: role.into(),
            occurred_at,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> &str {
        &self.role
    }
}

impl DomainEvent for UserCreated {
    fn event_kind(&self) -> &'static str {
        "auth.user.created"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Finance
// ─────────────────────────────────────────────────────────────────────────────

/// Event emitted when tickets for a show have been paid for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketPurchased {
    purchase_id: PurchaseId,
    show_id: ShowId,
    buyer_id: UserId,
    quantity: u32,
    total: Money,
    occurred_at: DateTime<Utc>,
}

impl TicketPurchased {
    pub fn new_at(
        purchase_id: PurchaseId,
        show_id: ShowId,
        buyer_id: UserId,
        quantity: u32,
        total: Money,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            purchase_id,
            show_id,
            buyer_id,
            quantity,
            total,
            occurred_at,
        }
    }

    pub fn purchase_id(&self) -> &PurchaseId {
        &self.purchase_id
    }

    pub fn show_id(&self) -> &ShowId {
        &self.show_id
    }

    pub fn buyer_id(&self) -> &UserId {
        &self.buyer_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn total(&self) -> &Money {
        &self.total
    }
}

impl DomainEvent for TicketPurchased {
    fn event_kind(&self) -> &'static str {
        "finance.ticket.purchased"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Platform-wide event
// ─────────────────────────────────────────────────────────────────────────────

/// All domain events carried on the platform bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum PlatformEvent {
    UserCreated(UserCreated),
    TicketPurchased(TicketPurchased),
}

impl DomainEvent for PlatformEvent {
    fn event_kind(&self) -> &'static str {
        match self {
            PlatformEvent::UserCreated(e) => e.event_kind(),
            PlatformEvent::TicketPurchased(e) => e.event_kind(),
        }
    }

    fn version(&self) -> u32 {
        match self {
            PlatformEvent::UserCreated(e) => e.version(),
            PlatformEvent::TicketPurchased(e) => e.version(),
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PlatformEvent::UserCreated(e) => e.occurred_at(),
            PlatformEvent::TicketPurchased(e) => e.occurred_at(),
        }
    }
}

impl From<UserCreated> for PlatformEvent {
    fn from(value: UserCreated) -> Self {
        PlatformEvent::UserCreated(value)
    }
}

impl From<TicketPurchased> for PlatformEvent {
    fn from(value: TicketPurchased) -> Self {
        PlatformEvent::TicketPurchased(value)
    }
}
