//! Topic-based publish/subscribe over bounded channels.
//!
//! Every game owns two topics: an inbox consumed by its runner thread and a
//! broadcast topic consumed by transports. Publishing never blocks; a
//! subscriber whose buffer is full misses the event.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvError, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

/// Buffer size used by [`EventQueue::subscribe`] unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 256;

/// Name of a delivery channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Topic(String);

impl Topic {
    /// Topic with an arbitrary name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Commands and control events for one game.
    #[must_use]
    pub fn inbox(game_id: &str) -> Self {
        Self(format!("game.{game_id}.inbox"))
    }

    /// Broadcast events from one game.
    #[must_use]
    pub fn broadcast(game_id: &str) -> Self {
        Self(format!("game.{game_id}.broadcast"))
    }

    /// Topic name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct Subscriber<E> {
    id: u64,
    sender: Sender<E>,
}

/// Fan-out event queue keyed by [`Topic`].
pub struct EventQueue<E> {
    subscribers: Mutex<HashMap<Topic, Vec<Subscriber<E>>>>,
    next_id: AtomicU64,
    capacity: usize,
}

impl<E> fmt::Debug for EventQueue<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topics = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("EventQueue")
            .field("topics", &topics)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl<E: Clone + Send> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<E: Clone + Send> EventQueue<E> {
    /// Queue whose subscriptions buffer `capacity` events by default.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
        }
    }

    /// Default subscription capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Deliver a clone of `event` to every subscriber of `topic`.
    ///
    /// Returns how many subscribers received it. Subscribers with a full
    /// buffer miss the event; disconnected subscribers are removed.
    pub fn publish(&self, topic: &Topic, event: E) -> usize {
        let mut table = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(subs) = table.get_mut(topic) else {
            trace!(%topic, "events.publish.no_subscribers");
            return 0;
        };

        let mut delivered = 0;
        subs.retain(|sub| match sub.sender.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(%topic, subscriber = sub.id, "events.publish.dropped");
                true
            }
            Err(TrySendError::Disconnected(_)) => {
                trace!(%topic, subscriber = sub.id, "events.publish.pruned");
                false
            }
        });
        if subs.is_empty() {
            table.remove(topic);
        }
        delivered
    }

    /// Subscribe to `topic` with the default capacity.
    pub fn subscribe(&self, topic: &Topic) -> Subscription<E> {
        self.subscribe_with_capacity(topic, self.capacity)
    }

    /// Subscribe to `topic` with a buffer of `capacity` events.
    pub fn subscribe_with_capacity(&self, topic: &Topic, capacity: usize) -> Subscription<E> {
        let (sender, receiver) = bounded(capacity.max(1));
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(topic.clone())
            .or_default()
            .push(Subscriber { id, sender });
        Subscription {
            id,
            topic: topic.clone(),
            receiver,
        }
    }

    /// Remove `subscription` from its topic, closing its channel once
    /// buffered events are drained. Unsubscribing twice is a no-op.
    pub fn unsubscribe(&self, subscription: &Subscription<E>) {
        let mut table = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(subs) = table.get_mut(&subscription.topic) {
            subs.retain(|sub| sub.id != subscription.id);
            if subs.is_empty() {
                table.remove(&subscription.topic);
            }
        }
    }

    /// Live subscriber count for `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(topic)
            .map_or(0, Vec::len)
    }
}

/// Receiving end of a topic subscription.
#[derive(Debug)]
pub struct Subscription<E> {
    id: u64,
    topic: Topic,
    receiver: Receiver<E>,
}

impl<E> Subscription<E> {
    /// Unique id within the queue.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Subscribed topic.
    #[must_use]
    pub const fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Block until an event arrives.
    ///
    /// # Errors
    ///
    /// Fails once the subscription is closed and drained.
    pub fn recv(&self) -> Result<E, RecvError> {
        self.receiver.recv()
    }

    /// Take an event if one is buffered.
    ///
    /// # Errors
    ///
    /// Fails when nothing is buffered or the subscription is closed.
    pub fn try_recv(&self) -> Result<E, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Wait up to `timeout` for an event.
    ///
    /// # Errors
    ///
    /// Fails on timeout or once the subscription is closed and drained.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<E, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain every buffered event without blocking.
    pub fn drain(&self) -> Vec<E> {
        self.receiver.try_iter().collect()
    }

    /// Underlying channel, for use with `crossbeam_channel::select!`.
    #[must_use]
    pub const fn receiver(&self) -> &Receiver<E> {
        &self.receiver
    }
}
