//! # Broadcast Hub
//!
//! Category-keyed publish/subscribe for formatted log lines. Categories are
//! free-form strings and are independent of channel toggles.
//!
//! Subscribers of a category run in registration order. Callbacks are
//! invoked outside the hub's lock, so a callback may subscribe, unsubscribe
//! or publish without deadlocking. A callback that panics is skipped: the
//! panic is reported through `tracing`, the remaining subscribers still
//! receive the message and the panicking subscriber stays registered.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::warn;

pub type Callback = Arc<dyn Fn(&str) + Send + Sync>;

/// Handle returned by [`BroadcastHub::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Outcome of one [`BroadcastHub::publish`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub failed: usize,
}

struct Subscriber {
    id: SubscriptionId,
    callback: Callback,
}

#[derive(Default)]
pub struct BroadcastHub {
    subscribers: RwLock<HashMap<String, Vec<Subscriber>>>,
    next_id: AtomicU64,
    failures: AtomicU64,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `category`. Callbacks run in registration order.
    pub fn subscribe<F>(&self, category: &str, callback: F) -> SubscriptionId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers
            .entry(category.to_string())
            .or_default()
            .push(Subscriber {
                id,
                callback: Arc::new(callback),
            });
        id
    }

    /// Remove a subscription. Returns false when it was not registered under `category`.
    pub fn unsubscribe(&self, category: &str, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(list) = subscribers.get_mut(category) else {
            return false;
        };
        let before = list.len();
        list.retain(|s| s.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            subscribers.remove(category);
        }
        removed
    }

    /// Deliver `message` to every subscriber of `category`.
    ///
    /// A panicking subscriber is skipped and stays registered.
    pub fn publish(&self, category: &str, message: &str) -> Delivery {
        // Snapshot so callbacks run without the lock held
        let callbacks: Vec<(SubscriptionId, Callback)> = {
            let subscribers = self
                .subscribers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            match subscribers.get(category) {
                Some(list) => list
                    .iter()
                    .map(|s| (s.id, Arc::clone(&s.callback)))
                    .collect(),
                None => return Delivery::default(),
            }
        };

        let mut delivery = Delivery::default();
        for (id, callback) in callbacks {
            match panic::catch_unwind(AssertUnwindSafe(|| callback(message))) {
                Ok(()) => delivery.delivered += 1,
                Err(payload) => {
                    delivery.failed += 1;
                    self.failures.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        "Subscriber {:?} of category '{}' panicked: {}",
                        id,
                        category,
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
        delivery
    }

    /// Number of live subscriptions under `category`
    pub fn subscriber_count(&self, category: &str) -> usize {
        let subscribers = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.get(category).map_or(0, Vec::len)
    }

    /// Categories with at least one subscriber
    pub fn categories(&self) -> Vec<String> {
        let subscribers = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut categories: Vec<String> = subscribers.keys().cloned().collect();
        categories.sort();
        categories
    }

    /// Total subscriber panics caught since creation
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for BroadcastHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastHub")
            .field("categories", &self.categories())
            .field("failures", &self.failure_count())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
