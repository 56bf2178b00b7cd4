use chrono::{DateTime, Utc};

/// A domain event.
///
/// Events are:
/// - **immutable** (treat them as facts; fields are set once at construction)
/// - **versioned** (schema evolution)
/// - **discriminated** by a stable kind so subscribers can decide how to react
pub trait DomainEvent: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event kind identifier (e.g. "auth.user.created").
    fn event_kind(&self) -> &'static str;

    /// Schema version for this event kind.
    fn version(&self) -> u32 {
        1
    }

    /// When the state change was committed.
    fn occurred_at(&self) -> DateTime<Utc>;
}
