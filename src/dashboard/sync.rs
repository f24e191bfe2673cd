//! Debounced, staleness-gated synchronizer for a stream of target selections.
//!
//! Selecting a target updates the current target immediately and (re)arms a trailing-edge
//! debounce timer. When the timer fires, the target is fetched only if its cached payload is
//! stale. Responses are applied only when their target is still the current one
//! (last-target-wins); responses for superseded targets are dropped without touching the
//! cache. The synchronizer never performs I/O itself: `poll` hands out `FetchTicket`s and the
//! owner reports results back through `complete`.

use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::time::{Duration, Instant};

use tracing::debug;

use super::cache::StalenessCache;

/// Identifier pairing an issued fetch with its completion.
pub type RequestId = u64;

/// Timing knobs for one synchronizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncSettings {
    /// Quiet period a burst of selections must observe before a fetch is considered.
    pub debounce: Duration,
    /// Maximum age of a cached payload that still counts as fresh.
    pub horizon: Duration,
}

/// Lifecycle of the current target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncPhase<K> {
    /// Nothing has been selected yet.
    Idle,
    /// Debounce timer armed for `target`.
    Pending {
        target: K,
        deadline: Instant,
        force: bool,
    },
    /// A fetch for the current target is outstanding.
    InFlight { target: K, request: RequestId },
    /// The current target has a settled payload (or a recorded failure).
    Settled { target: K },
}

/// Instruction to fetch `target`; report the result with the same `request`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchTicket<K> {
    pub request: RequestId,
    pub target: K,
}


/// What `complete` did with a response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncOutcome<K> {
    /// Payload written to the cache for the current target.
    Applied { target: K },
    /// Fetch for the current target failed; cached data is left as it was.
    Failed { target: K, message: String },
    /// Target was superseded while the fetch was running; response dropped.
    Discarded { target: K },
    /// The request id is not outstanding.
    Unknown,
}

pub struct DebouncedSynchronizer<K, P> {
    settings: SyncSettings,
    cache: StalenessCache<K, P>,
    phase: SyncPhase<K>,
    current: Option<K>,
    in_flight: HashMap<RequestId, K>,
    next_request: RequestId,
    /// Last fetch error per target, cleared when that target next loads.
    failures: HashMap<K, String>,
}

impl<K, P> DebouncedSynchronizer<K, P>
where
    K: Clone + Eq + Hash + Debug,
{
    pub fn new(settings: SyncSettings) -> Self {
        Self {
            settings,
            cache: StalenessCache::new(),
            phase: SyncPhase::Idle,
            current: None,
            in_flight: HashMap::new(),
            next_request: 1,
            failures: HashMap::new(),
        }
    }

    pub fn settings(&self) -> SyncSettings {
        self.settings
    }

    /// Make `target` current and restart the debounce timer.
    pub fn select(&mut self, target: K, now: Instant) {
        self.arm(target, now, false);
    }

    /// Like `select`, but the settled fetch ignores cache freshness.
    pub fn select_forced(&mut self, target: K, now: Instant) {
        self.arm(target, now, true);
    }

    /// Fetch the current target immediately, bypassing debounce and freshness.
    ///
    /// Returns `None` when there is no current target or a fetch for it is already running.
    pub fn refresh(&mut self, now: Instant) -> Option<FetchTicket<K>> {
        let target = self.current.clone()?;
        self.settle(target, true, now)
    }

    /// Fire the debounce timer if it is due.
    pub fn poll(&mut self, now: Instant) -> Option<FetchTicket<K>> {
        let SyncPhase::Pending {
            target,
            deadline,
            force,
        } = &self.phase
        else {
            return None;
        };
        if now < *deadline {
            return None;
        }
        let (target, force) = (target.clone(), *force);
        self.settle(target, force, now)
    }

    /// Report the result of a fetch issued through a ticket.
    pub fn complete<E: Display>(
        &mut self,
        request: RequestId,
        result: Result<P, E>,
        now: Instant,
    ) -> SyncOutcome<K> {
        let Some(target) = self.in_flight.remove(&request) else {
            return SyncOutcome::Unknown;
        };
        if let SyncPhase::InFlight { request: active, .. } = &self.phase
            && *active == request
        {
            self.phase = SyncPhase::Settled {
                target: target.clone(),
            };
        }
        if self.current.as_ref() != Some(&target) {
            debug!(
                "Dropping response for superseded target {:?} (request {request})",
                target
            );
            return SyncOutcome::Discarded { target };
        }
        match result {
            Ok(payload) => {
                self.failures.remove(&target);
                self.cache.write(target.clone(), payload, now);
                SyncOutcome::Applied { target }
            }
            Err(err) => {
                let message = err.to_string();
                self.failures.insert(target.clone(), message.clone());
                SyncOutcome::Failed { target, message }
            }
        }
    }

    /// When the armed debounce timer is due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.phase {
            SyncPhase::Pending { deadline, .. } => Some(*deadline),
            _ => None,
        }
    }

    pub fn phase(&self) -> &SyncPhase<K> {
        &self.phase
    }

    pub fn current_target(&self) -> Option<&K> {
        self.current.as_ref()
    }

    /// Cached payload for the current target, fresh or not.
    pub fn current_payload(&self) -> Option<&P> {
        self.current.as_ref().and_then(|target| self.cache.read(target))
    }

    pub fn is_current_fresh(&self, now: Instant) -> bool {
        self.current
            .as_ref()
            .is_some_and(|target| self.cache.is_fresh(target, self.settings.horizon, now))
    }

    /// True while a fetch for the current target is outstanding.
    pub fn is_fetching(&self) -> bool {
        matches!(self.phase, SyncPhase::InFlight { .. })
    }

    /// Number of outstanding fetches across all targets.
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    /// Failure recorded for the current target, if any.
    pub fn current_failure(&self) -> Option<&str> {
        self.current
            .as_ref()
            .and_then(|target| self.failures.get(target))
            .map(String::as_str)
    }

    pub fn cached(&self, key: &K) -> Option<&P> {
        self.cache.read(key)
    }

    pub fn cache(&self) -> &StalenessCache<K, P> {
        &self.cache
    }

    /// Apply an acknowledged change to a cached payload without resetting its age.
    pub fn update_cached(&mut self, key: &K, update: impl FnOnce(&mut P)) -> bool {
        self.cache.update_in_place(key, update)
    }

    fn arm(&mut self, target: K, now: Instant, force: bool) {
        let carried_force = match &self.phase {
            SyncPhase::Pending {
                target: pending,
                force: pending_force,
                ..
            } => *pending_force && *pending == target,
            _ => false,
        };
        debug!("Debouncing selection of {:?}", target);
        self.current = Some(target.clone());
        self.phase = SyncPhase::Pending {
            target,
            deadline: now + self.settings.debounce,
            force: force || carried_force,
        };
    }

    fn settle(&mut self, target: K, force: bool, now: Instant) -> Option<FetchTicket<K>> {
        if let Some(request) = self.request_for(&target) {
            self.phase = SyncPhase::InFlight { target, request };
            return None;
        }
        if !force && self.cache.is_fresh(&target, self.settings.horizon, now) {
            self.phase = SyncPhase::Settled { target };
            return None;
        }
        let request = self.next_request;
        self.next_request += 1;
        self.in_flight.insert(request, target.clone());
        debug!("Issuing fetch {request} for {:?}", target);
        self.phase = SyncPhase::InFlight {
            target: target.clone(),
            request,
        };
        Some(FetchTicket { request, target })
    }

    fn request_for(&self, target: &K) -> Option<RequestId> {
        self.in_flight
            .iter()
            .find(|(_, pending)| *pending == target)
            .map(|(request, _)| *request)
    }
}
