//! Time-boxed response cache with in-flight request collapsing
//!
//! Each key moves through `absent -> pending -> resolved -> (expired)`:
//!
//! - the first caller for an absent or expired key becomes the leader and
//!   dispatches the request;
//! - callers arriving while the leader is in flight subscribe to its outcome
//!   instead of dispatching again;
//! - a success is stored until its deadline; a failure is handed to every
//!   waiter and then forgotten, so the next caller retries.
//!
//! Every [`ResponseCache::get_or_dispatch`] call first sweeps out resolved
//! entries whose deadline has passed, so keys that are never requested again
//! still leave the map. Time is read through a [`Clock`] so expiry can be
//! tested without sleeping.
//!
//! If a leader is cancelled before it settles, its pending entry is removed
//! and waiting followers retry; one of them becomes the new leader.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use cdf_connector_common::time::{Clock, SystemClock};
use cdf_connector_domain::{ConnectorError, ResponseEnvelope, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

type Outcome = Result<ResponseEnvelope>;

enum CacheEntry {
    Pending { generation: u64, sender: broadcast::Sender<Outcome> },
    Resolved { value: ResponseEnvelope, expires_at: Instant },
}

impl CacheEntry {
    fn is_pending(&self, owner: u64) -> bool {
        matches!(self, Self::Pending { generation, .. } if *generation == owner)
    }

    fn is_expired(&self, now: Instant) -> bool {
        matches!(self, Self::Resolved { expires_at, .. } if now >= *expires_at)
    }
}

enum Slot {
    Hit(ResponseEnvelope),
    Follower(broadcast::Receiver<Outcome>),
    Leader { sender: broadcast::Sender<Outcome>, generation: u64 },
}

/// Removes a leader's pending entry unless the leader settled it.
struct PendingGuard<'a> {
    entries: &'a DashMap<String, CacheEntry>,
    key: &'a str,
    generation: u64,
    armed: bool,
}

impl PendingGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let generation = self.generation;
            self.entries.remove_if(self.key, |_, entry| entry.is_pending(generation));
            debug!(key = self.key, "in-flight request abandoned");
        }
    }
}

/// Keyed response cache shared by every `cached_request` call of a
/// connector.
pub struct ResponseCache<C: Clock = SystemClock> {
    entries: DashMap<String, CacheEntry>,
    clock: C,
    generation: AtomicU64,
}

impl ResponseCache<SystemClock> {
    /// Empty cache on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for ResponseCache<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> ResponseCache<C> {
    /// Empty cache reading time from `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self { entries: DashMap::new(), clock, generation: AtomicU64::new(0) }
    }

    /// Return the cached response for `key`, join the in-flight request for
    /// it, or run `fetch` and cache its success for `ttl`.
    ///
    /// # Errors
    ///
    /// Whatever `fetch` (or the leader this call joined) failed with. Failures
    /// are never cached.
    pub async fn get_or_dispatch<F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Outcome
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Outcome> + Send,
    {
        self.purge_expired();
        let mut fetch = Some(fetch);

        loop {
            match self.acquire(key) {
                Slot::Hit(value) => {
                    debug!(key, "cache hit");
                    return Ok(value);
                }
                Slot::Follower(mut receiver) => {
                    debug!(key, "joining in-flight request");
                    match receiver.recv().await {
                        Ok(outcome) => return outcome,
                        // Leader went away without settling
                        Err(_) => continue,
                    }
                }
                Slot::Leader { sender, generation } => {
                    let Some(fetch) = fetch.take() else {
                        return Err(ConnectorError::Internal(format!(
                            "cache slot for {key} acquired twice"
                        )));
                    };

                    debug!(key, ?ttl, "cache miss, dispatching");
                    let guard =
                        PendingGuard { entries: &self.entries, key, generation, armed: true };
                    let outcome = fetch().await;
                    self.settle(key, generation, &outcome, ttl);
                    guard.disarm();

                    // No receivers is fine
                    sender.send(outcome.clone()).ok();
                    return outcome;
                }
            }
        }
    }

    /// Cached, unexpired response for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<ResponseEnvelope> {
        let now = self.clock.now();
        match self.entries.get(key).as_deref() {
            Some(CacheEntry::Resolved { value, expires_at }) if now < *expires_at => {
                Some(value.clone())
            }
            _ => None,
        }
    }

    /// `true` while a leader for `key` is in flight.
    #[must_use]
    pub fn is_pending(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|entry| matches!(*entry, CacheEntry::Pending { .. }))
    }

    /// Drop the entry for `key`. An in-flight leader still answers its
    /// followers but no longer stores its result.
    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Remove every expired entry and return how many were dropped.
    ///
    /// Runs at the start of every [`get_or_dispatch`](Self::get_or_dispatch).
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut purged = 0;
        self.entries.retain(|_, entry| {
            let expired = entry.is_expired(now);
            if expired {
                purged += 1;
            }
            !expired
        });
        if purged > 0 {
            debug!(purged, "purged expired cache entries");
        }
        purged
    }

    /// Number of entries, pending ones and those expired since the last
    /// sweep included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no entry is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn acquire(&self, key: &str) -> Slot {
        let now = self.clock.now();
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                match occupied.get() {
                    CacheEntry::Resolved { value, expires_at } if now < *expires_at => {
                        return Slot::Hit(value.clone());
                    }
                    CacheEntry::Pending { sender, .. } => return Slot::Follower(sender.subscribe()),
                    CacheEntry::Resolved { .. } => {}
                }
                let (slot, pending) = self.new_pending();
                occupied.insert(pending);
                slot
            }
            Entry::Vacant(vacant) => {
                let (slot, pending) = self.new_pending();
                vacant.insert(pending);
                slot
            }
        }
    }

    fn new_pending(&self) -> (Slot, CacheEntry) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let (sender, _receiver) = broadcast::channel(1);
        let entry = CacheEntry::Pending { generation, sender: sender.clone() };
        (Slot::Leader { sender, generation }, entry)
    }

    fn settle(&self, key: &str, generation: u64, outcome: &Outcome, ttl: Duration) {
        match outcome {
            Ok(value) => {
                if let Some(mut entry) = self.entries.get_mut(key) {
                    if entry.is_pending(generation) {
                        *entry = CacheEntry::Resolved {
                            value: value.clone(),
                            expires_at: self.clock.deadline(ttl),
                        };
                    }
                }
            }
            Err(error) => {
                debug!(key, error = %error, "not caching failed request");
                self.entries.remove_if(key, |_, entry| entry.is_pending(generation));
            }
        }
    }
}
