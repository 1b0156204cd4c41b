//! # Change Feed
//!
//! Fan-out of committed changes to subscribers over tokio channels.
//!
//! Events are published by the store while it still holds its commit lock,
//! so every subscriber observes changes to a single document in write order.
//! Subscribers whose receiver has been dropped are pruned on the next
//! publish.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use tokio::sync::mpsc;

use super::event::ChangeEvent;

/// Which changes a subscriber wants to see
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeFilter {
    /// Collection path to match exactly (None = all collections)
    pub collection: Option<String>,
    /// Record id to match exactly (None = all records)
    pub record_id: Option<String>,
}

impl ChangeFilter {
    /// Every change
    pub fn all() -> Self {
        Self::default()
    }

    /// Every change in one collection path
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: Some(collection.into()),
            record_id: None,
        }
    }

    /// Changes to a single document
    pub fn record(collection: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self {
            collection: Some(collection.into()),
            record_id: Some(record_id.into()),
        }
    }

    /// Check if an event matches this filter
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if let Some(collection) = &self.collection {
            if collection != &event.collection {
                return false;
            }
        }
        if let Some(record_id) = &self.record_id {
            if record_id != &event.record_id {
                return false;
            }
        }
        true
    }
}

/// Receiving half of a subscription
#[derive(Debug)]
pub struct ChangeReceiver {
    id: u64,
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
}

impl ChangeReceiver {
    /// Subscription id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the next event. Returns None once the feed is dropped.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    /// Take the next event if one is already queued
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }

    /// Drain every queued event
    pub fn drain(&mut self) -> Vec<ChangeEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }
}

#[derive(Debug)]
struct Subscriber {
    filter: ChangeFilter,
    sender: mpsc::UnboundedSender<ChangeEvent>,
}

/// Result of publishing one event
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishResult {
    /// Number of subscribers whose filter matched
    pub matched: usize,
    /// Number of events handed to a live receiver
    pub delivered: usize,
    /// Number of subscribers pruned because their receiver was dropped
    pub pruned: usize,
}

/// Registry of subscribers and the publishing side of the feed
#[derive(Debug, Default)]
pub struct ChangeFeed {
    subscribers: RwLock<HashMap<u64, Subscriber>>,
    next_subscriber: AtomicU64,
    sequence: AtomicU64,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber
    pub fn subscribe(&self, filter: ChangeFilter) -> ChangeReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_subscriber.fetch_add(1, Ordering::Relaxed) + 1;

        if let Ok(mut subscribers) = self.subscribers.write() {
            subscribers.insert(id, Subscriber { filter, sender: tx });
        }

        ChangeReceiver { id, rx }
    }

    /// Remove a subscriber
    pub fn unsubscribe(&self, id: u64) {
        if let Ok(mut subscribers) = self.subscribers.write() {
            subscribers.remove(&id);
        }
    }

    /// Assign the next sequence number to `event` and deliver it
    pub fn publish(&self, mut event: ChangeEvent) -> PublishResult {
        event.sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;

        let mut result = PublishResult::default();
        let mut closed = Vec::new();

        if let Ok(subscribers) = self.subscribers.read() {
            for (id, subscriber) in subscribers.iter() {
                if !subscriber.filter.matches(&event) {
                    continue;
                }
                result.matched += 1;
                match subscriber.sender.send(event.clone()) {
                    Ok(()) => result.delivered += 1,
                    Err(_) => closed.push(*id),
                }
            }
        }

        if !closed.is_empty() {
            if let Ok(mut subscribers) = self.subscribers.write() {
                for id in &closed {
                    subscribers.remove(id);
                }
            }
            result.pruned = closed.len();
        }

        result
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Sequence number of the last published event
    pub fn last_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}
