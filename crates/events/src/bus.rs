//! Event publishing/subscription abstraction (mechanics only).
//!
//! The event bus decouples the producer of a domain event from its consumers.
//! Every subscriber gets its own copy of each event published after it
//! subscribed; there is no replay of history.
//!
//! ## Delivery
//!
//! - **Per-subscriber FIFO**: a subscriber observes events in publish order.
//! - **Isolation**: a failing subscriber never affects other subscribers and
//!   never reaches the publisher.
//! - **No persistence**: the bus is for distribution, not storage.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, RecvError, RecvTimeoutError, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

type ReleaseFn = Box<dyn FnOnce() + Send>;

/// Shared bookkeeping between a subscriber and the bus that feeds it.
#[derive(Default)]
pub(crate) struct SubscriptionState {
    cancelled: AtomicBool,
    terminated: AtomicBool,
    dropped: AtomicU64,
    /// Removes the subscriber from the bus registry; runs at most once.
    release: Mutex<Option<ReleaseFn>>,
}

impl core::fmt::Debug for SubscriptionState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SubscriptionState")
            .field("cancelled", &self.is_cancelled())
            .field("terminated", &self.is_terminated())
            .field("dropped", &self.dropped())
            .finish()
    }
}

impl SubscriptionState {
    /// Subscriber side: stop receiving and release the registry entry. Idempotent.
    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        // Taken before running: the callback locks the bus registry.
        if let Some(release) = self.take_release() {
            release();
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Bus side: no further events will be delivered (bus closed).
    pub(crate) fn terminate(&self) {
        self.terminated.store(true, Ordering::Release);
        drop(self.take_release());
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Still eligible for delivery.
    pub(crate) fn is_active(&self) -> bool {
        !self.is_cancelled() && !self.is_terminated()
    }

    /// Install the callback that unregisters this subscriber.
    pub(crate) fn on_release(&self, release: impl FnOnce() + Send + 'static) {
        *self.release.lock().unwrap_or_else(PoisonError::into_inner) = Some(Box::new(release));
    }

    fn take_release(&self) -> Option<ReleaseFn> {
        self.release
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub(crate) fn record_drop(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Acquire)
    }
}

/// A pull-based subscription to an event stream.
///
/// Live and lazy: it yields events published after it was created, never a
/// snapshot.
///
/// ## Usage Pattern
///
/// ```ignore
/// let subscription = bus.subscribe();
///
/// loop {
///     match subscription.recv_timeout(Duration::from_secs(1)) {
///         Ok(event) => process(event)?,
///         Err(RecvTimeoutError::Timeout) => continue,  // Check for shutdown
///         Err(RecvTimeoutError::Disconnected) => break,  // Bus closed or cancelled
///     }
/// }
/// ```
///
/// Cancelling (or dropping) the subscription stops delivery to it without
/// affecting anyone else, and removes it from the bus right away. After the bus closes, already buffered events can
/// still be drained, then the subscription reports disconnection.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
    state: Arc<SubscriptionState>,
}

impl<M> Subscription<M> {
    pub(crate) fn new(receiver: Receiver<M>) -> Self {
        Self {
            receiver,
            state: Arc::new(SubscriptionState::default()),
        }
    }

    /// State shared with the bus; the bus keeps a clone to observe cancellation.
    pub(crate) fn state(&self) -> Arc<SubscriptionState> {
        Arc::clone(&self.state)
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, RecvError> {
        if self.state.is_cancelled() {
            return Err(RecvError);
        }
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, TryRecvError> {
        if self.state.is_cancelled() {
            return Err(TryRecvError::Disconnected);
        }
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, RecvTimeoutError> {
        if self.state.is_cancelled() {
            return Err(RecvTimeoutError::Disconnected);
        }
        self.receiver.recv_timeout(timeout)
    }

    /// Blocking iterator; ends when the subscription is cancelled or the bus closes.
    pub fn iter(&self) -> impl Iterator<Item = M> + '_ {
        std::iter::from_fn(move || self.recv().ok())
    }

    /// Stop receiving. Idempotent.
    pub fn cancel(&self) {
        self.state.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }

    /// Events discarded for this subscriber because its buffer was full.
    pub fn dropped_count(&self) -> u64 {
        self.state.dropped()
    }
}

impl<M> Drop for Subscription<M> {
    fn drop(&mut self) {
        self.state.cancel();
    }
}

/// Handle for a push-based (callback) subscriber.
///
/// Dropping the handle unsubscribes and releases the handler.
#[derive(Debug)]
#[must_use = "dropping the handle unsubscribes the handler"]
pub struct SubscriberHandle {
    state: Arc<SubscriptionState>,
}

impl SubscriberHandle {
    pub(crate) fn new(state: Arc<SubscriptionState>) -> Self {
        Self { state }
    }

    /// Stop invoking the handler. Idempotent.
    pub fn cancel(&self) {
        self.state.cancel();
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }
}

impl Drop for SubscriberHandle {
    fn drop(&mut self) {
        self.state.cancel();
    }
}

/// Domain-agnostic event bus (pub/sub abstraction).
///
/// `publish` has no return value: delivery problems are isolated per subscriber
/// and logged by the implementation, never surfaced to the publisher.
///
/// ## Thread Safety
///
/// The trait requires `Send + Sync`, meaning implementations must be safe to share across
/// threads. Multiple threads can publish events concurrently.
pub trait EventBus<M>: Send + Sync {
    fn publish(&self, message: M);

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    fn publish(&self, message: M) {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
