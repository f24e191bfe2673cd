//! Keyed payload cache that records when each payload was fetched.
//!
//! The cache is horizon-agnostic: callers pass the staleness horizon per query. Entries are
//! never evicted; the key space (the user's own ad accounts and campaigns) is small.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// One cached payload and its fetch time.
#[derive(Clone, Debug)]
pub struct CacheEntry<P> {
    pub payload: P,
    pub fetched_at: Instant,
}

#[derive(Clone, Debug)]
pub struct StalenessCache<K, P> {
    entries: HashMap<K, CacheEntry<P>>,
}

impl<K, P> Default for StalenessCache<K, P> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, P> StalenessCache<K, P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff an entry exists for `key` and it is younger than `horizon` at `now`.
    pub fn is_fresh(&self, key: &K, horizon: Duration, now: Instant) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry_is_fresh(entry.fetched_at, horizon, now))
    }

    /// Replace any existing entry for `key`, returning the previous payload.
    pub fn write(&mut self, key: K, payload: P, now: Instant) -> Option<P> {
        self.entries
            .insert(
                key,
                CacheEntry {
                    payload,
                    fetched_at: now,
                },
            )
            .map(|previous| previous.payload)
    }

    pub fn read(&self, key: &K) -> Option<&P> {
        self.entries.get(key).map(|entry| &entry.payload)
    }

    pub fn entry(&self, key: &K) -> Option<&CacheEntry<P>> {
        self.entries.get(key)
    }

    /// Time elapsed since `key` was written, if present.
    pub fn age(&self, key: &K, now: Instant) -> Option<Duration> {
        self.entries
            .get(key)
            .map(|entry| now.saturating_duration_since(entry.fetched_at))
    }

    /// Mutate a cached payload without touching its fetch time.
    ///
    /// Used to reflect acknowledged server-side changes (tracking toggles) on data that was
    /// already fetched. Returns false when `key` has no entry.
    pub fn update_in_place(&mut self, key: &K, update: impl FnOnce(&mut P)) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                update(&mut entry.payload);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn entry_is_fresh(fetched_at: Instant, horizon: Duration, now: Instant) -> bool {
    now.saturating_duration_since(fetched_at) < horizon
}
