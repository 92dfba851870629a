//! Change bus — ordered multicast of committed snapshots
//!
//! Every subscriber owns an unbounded queue. Publishing enqueues the new
//! snapshot into each queue and never blocks: a slow or stalled subscriber
//! delays only its own consumption, not other subscribers and not the next
//! writer.
//!
//! Registration and publication share one registry lock. That is what
//! makes subscribe-with-replay atomic: a subscriber either registers
//! before a commit's fan-out (sees the old value as its replay, then the
//! commit as a notification) or after it (sees the committed value as its
//! replay, no notification) — never both, never neither.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use hashbrown::HashMap;
use parking_lot::Mutex;

use crate::cache::Snapshot;

/// Subscriber registry shared between the bus and its subscriptions.
struct Registry<T> {
    /// Next subscription id
    next_id: u64,
    /// Live subscriber queues, keyed by subscription id
    senders: HashMap<u64, Sender<Snapshot<T>>>,
}

/// Multicast fan-out of committed snapshots to registered subscribers.
pub struct ChangeBus<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T: Clone> ChangeBus<T> {
    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                senders: HashMap::new(),
            })),
        }
    }

    /// Register a subscriber and atomically capture the current state.
    ///
    /// `read_current` runs under the registry lock, so the returned replay
    /// snapshot and the subscriber's notification stream join exactly at
    /// one commit boundary.
    pub fn subscribe_with(
        &self,
        read_current: impl FnOnce() -> Snapshot<T>,
    ) -> (Subscription<T>, Snapshot<T>) {
        let mut registry = self.registry.lock();
        let initial = read_current();

        let (tx, rx) = channel();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.senders.insert(id, tx);

        let subscription = Subscription {
            id,
            rx,
            registry: Arc::clone(&self.registry),
        };
        (subscription, initial)
    }

    /// Commit a new state and fan it out, as one ordered step.
    ///
    /// `commit` runs under the registry lock and must install the value in
    /// the cache, returning the resulting snapshot; the fan-out that
    /// follows is enqueue-only and cannot block on any subscriber.
    /// Subscribers whose receiving end is gone are pruned here.
    pub fn publish_with(&self, commit: impl FnOnce() -> Snapshot<T>) -> Snapshot<T> {
        let mut registry = self.registry.lock();
        let snapshot = commit();
        registry
            .senders
            .retain(|_, tx| tx.send(snapshot.clone()).is_ok());
        snapshot
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().senders.len()
    }
}

impl<T> Drop for ChangeBus<T> {
    fn drop(&mut self) {
        // Dropping the senders ends every subscriber's stream: pending
        // notifications drain, then `recv` returns None.
        self.registry.lock().senders.clear();
    }
}

/// One observer's registration with the change bus.
///
/// Consume notifications with `recv`/`try_recv`/`recv_timeout`. Dropping
/// the subscription cancels it; `cancel` does the same explicitly and is
/// idempotent. Cancelling never affects other subscriptions.
pub struct Subscription<T> {
    id: u64,
    rx: Receiver<Snapshot<T>>,
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T> Subscription<T> {
    /// Block until the next committed snapshot.
    ///
    /// Returns `None` once the store has been dropped and all pending
    /// notifications have been consumed.
    pub fn recv(&self) -> Option<Snapshot<T>> {
        self.rx.recv().ok()
    }

    /// Next pending snapshot, if one is already queued.
    pub fn try_recv(&self) -> Option<Snapshot<T>> {
        self.rx.try_recv().ok()
    }

    /// Block up to `timeout` for the next committed snapshot.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Snapshot<T>> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Stop receiving notifications. Immediate, non-blocking, idempotent.
    ///
    /// Notifications already queued remain readable; nothing new is
    /// enqueued after this returns.
    pub fn cancel(&self) {
        self.registry.lock().senders.remove(&self.id);
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
