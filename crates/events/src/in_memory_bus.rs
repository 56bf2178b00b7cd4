//! In-memory event bus: the process-wide multicast channel.
//!
//! Publishes are appended to a queue under a single mutex. Whichever caller
//! finds the bus idle becomes the drainer and delivers queued events one at a
//! time, in sequence order, to a snapshot of the registry taken without holding
//! the lock during delivery. This gives:
//!
//! - synchronous fan-out in the common single-publisher case,
//! - FIFO per subscriber even with concurrent or reentrant publishers,
//! - handlers that may themselves publish or subscribe without deadlocking.
//!
//! The drainer keeps going until the queue is empty, including events that
//! other threads enqueue while it runs. Under sustained concurrent publishing a
//! single `publish` call can therefore take arbitrarily long to return.
//!
//! Cancelling a subscription removes its registry entry immediately, dropping
//! the channel sender or handler closure. Entries are never dropped while the
//! registry lock is held, since a handler may own subscriber handles itself.

use std::any::Any;
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{self, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, warn};

use crate::bus::{EventBus, SubscriberHandle, Subscription, SubscriptionState};

type Handler<M> = dyn Fn(&M) -> anyhow::Result<()> + Send + Sync;

/// Bus tuning.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct BusConfig {
    /// Per-subscription buffer for pull subscriptions. `None` is unbounded.
    ///
    /// When a bounded buffer is full the newest event is dropped for that
    /// subscriber only and counted in [`Subscription::dropped_count`].
    pub subscriber_capacity: Option<NonZeroUsize>,
}

impl BusConfig {
    pub fn bounded(capacity: NonZeroUsize) -> Self {
        Self {
            subscriber_capacity: Some(capacity),
        }
    }
}

enum Sink<M> {
    Unbounded(mpsc::Sender<M>),
    Bounded(mpsc::SyncSender<M>),
    Handler(Arc<Handler<M>>),
}

struct Subscriber<M> {
    id: u64,
    /// First publish sequence this subscriber may observe.
    since: u64,
    state: Arc<SubscriptionState>,
    sink: Sink<M>,
}

struct Inner<M> {
    subscribers: Vec<Arc<Subscriber<M>>>,
    queue: VecDeque<(u64, M)>,
    next_sequence: u64,
    next_subscriber_id: u64,
    draining: bool,
    closed: bool,
}

/// In-memory pub/sub bus.
///
/// Two states: active (accepting publishes and subscriptions) and closed.
pub struct InMemoryEventBus<M> {
    config: BusConfig,
    inner: Arc<Mutex<Inner<M>>>,
}

impl<M> core::fmt::Debug for InMemoryEventBus<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = self.lock();
        f.debug_struct("InMemoryEventBus")
            .field("config", &self.config)
            .field("subscribers", &inner.subscribers.len())
            .field("pending", &inner.queue.len())
            .field("closed", &inner.closed)
            .finish()
    }
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BusConfig) -> Self {
        Self {
            config,
            inner: Arc::new(Mutex::new(Inner {
                subscribers: Vec::new(),
                queue: VecDeque::new(),
                next_sequence: 0,
                next_subscriber_id: 0,
                draining: false,
                closed: false,
            })),
        }
    }

    pub fn config(&self) -> BusConfig {
        self.config
    }

    fn lock(&self) -> MutexGuard<'_, Inner<M>> {
        lock_registry(&self.inner)
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of subscribers still eligible for delivery.
    pub fn subscriber_count(&self) -> usize {
        self.lock()
            .subscribers
            .iter()
            .filter(|s| s.state.is_active())
            .count()
    }

    /// Transition to closed: terminate every subscription, discard undelivered
    /// events and reject later publishes. Idempotent.
    pub fn close(&self) {
        let (subscribers, discarded) = {
            let mut inner = self.lock();
            if inner.closed {
                return;
            }
            inner.closed = true;
            let discarded = inner.queue.len();
            inner.queue.clear();
            (std::mem::take(&mut inner.subscribers), discarded)
        };

        for subscriber in &subscribers {
            subscriber.state.terminate();
        }
        debug!(
            subscribers = subscribers.len(),
            discarded, "event bus closed"
        );
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self::with_config(BusConfig::default())
    }
}

impl<M> Drop for InMemoryEventBus<M> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<M> InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    /// Register a push-based subscriber invoked inline during delivery.
    ///
    /// Errors returned by the handler are logged; panics are caught and logged.
    /// Neither stops delivery to other subscribers.
    pub fn subscribe_fn<F>(&self, handler: F) -> SubscriberHandle
    where
        F: Fn(&M) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let state = Arc::new(SubscriptionState::default());
        self.register(&state, Sink::Handler(Arc::new(handler)));
        SubscriberHandle::new(state)
    }

    fn register(&self, state: &Arc<SubscriptionState>, sink: Sink<M>) {
        let mut inner = self.lock();
        if inner.closed {
            state.terminate();
            debug!("subscription on closed event bus is born terminated");
            return;
        }

        let id = inner.next_subscriber_id;
        inner.next_subscriber_id += 1;
        let since = inner.next_sequence;
        let registry = Arc::downgrade(&self.inner);
        state.on_release(move || unregister(&registry, id));
        inner.subscribers.push(Arc::new(Subscriber {
            id,
            since,
            state: Arc::clone(state),
            sink,
        }));
        debug!(subscriber = id, since, "subscriber registered");
    }

    fn drain(&self) {
        loop {
            let (sequence, message, subscribers) = {
                let mut inner = self.lock();
                let Some((sequence, message)) = inner.queue.pop_front() else {
                    inner.draining = false;
                    return;
                };
                (sequence, message, inner.subscribers.clone())
            };

            for subscriber in subscribers.iter().filter(|s| s.since <= sequence) {
                let outcome = catch_unwind(AssertUnwindSafe(|| deliver(subscriber, &message)));
                if let Err(payload) = outcome {
                    warn!(
                        subscriber = subscriber.id,
                        sequence,
                        panic = panic_message(payload.as_ref()),
                        "event subscriber panicked"
                    );
                }
            }
        }
    }
}

// No user code runs while the lock is held, so a poisoned lock still guards
// consistent data.
fn lock_registry<M>(registry: &Mutex<Inner<M>>) -> MutexGuard<'_, Inner<M>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

fn unregister<M>(registry: &Weak<Mutex<Inner<M>>>, id: u64) {
    let Some(registry) = registry.upgrade() else {
        return;
    };
    let removed = {
        let mut inner = lock_registry(&registry);
        match inner.subscribers.iter().position(|s| s.id == id) {
            Some(index) => Some(inner.subscribers.remove(index)),
            None => None,
        }
    };
    if removed.is_some() {
        debug!(subscriber = id, "subscriber released");
    }
    drop(removed);
}

fn deliver<M: Clone>(subscriber: &Subscriber<M>, message: &M) {
    // Cancelled or closed between snapshot and delivery.
    if !subscriber.state.is_active() {
        return;
    }

    match &subscriber.sink {
        Sink::Unbounded(tx) => {
            if tx.send(message.clone()).is_err() {
                subscriber.state.cancel();
            }
        }
        Sink::Bounded(tx) => match tx.try_send(message.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                let dropped = subscriber.state.record_drop();
                warn!(
                    subscriber = subscriber.id,
                    dropped, "subscriber buffer full; event dropped"
                );
            }
            Err(TrySendError::Disconnected(_)) => subscriber.state.cancel(),
        },
        Sink::Handler(handler) => {
            if let Err(err) = handler(message) {
                warn!(subscriber = subscriber.id, error = %format!("{err:#}"), "event handler failed");
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    fn publish(&self, message: M) {
        let mut inner = self.lock();
        if inner.closed {
            drop(inner);
            warn!("publish on closed event bus dropped");
            return;
        }

        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        inner.queue.push_back((sequence, message));
        debug!(sequence, "event published");

        // An active drainer (another thread, or an outer publish on this
        // thread) will deliver it in order.
        if inner.draining {
            return;
        }
        inner.draining = true;
        drop(inner);

        self.drain();
    }

    fn subscribe(&self) -> Subscription<M> {
        match self.config.subscriber_capacity {
            None => {
                let (tx, rx) = mpsc::channel();
                let subscription = Subscription::new(rx);
                self.register(&subscription.state(), Sink::Unbounded(tx));
                subscription
            }
            Some(capacity) => {
                let (tx, rx) = mpsc::sync_channel(capacity.get());
                let subscription = Subscription::new(rx);
                self.register(&subscription.state(), Sink::Bounded(tx));
                subscription
            }
        }
    }
}
