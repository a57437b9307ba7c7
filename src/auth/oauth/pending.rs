//! The pending-authorization table.

use crate::auth::oauth::error::OAuthError;
use crate::auth::oauth::state::StateParam;
use crate::config::ShopDomain;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Smallest table size that triggers an automatic sweep.
const SWEEP_FLOOR: usize = 64;

/// Minimum gap between two sweeps triggered by `insert`.
const SWEEP_COOLDOWN: Duration = Duration::from_secs(1);

/// What `begin` recorded for a state value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingAuthorization {
    /// The shop the authorization was requested for.
    pub shop: ShopDomain,
    /// Whether an online token was requested.
    pub is_online: bool,
    /// When the state was issued.
    pub issued_at: Instant,
}

impl PendingAuthorization {
    /// Returns `true` once `ttl` has elapsed since issue.
    #[must_use]
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.issued_at.elapsed() > ttl
    }
}

/// Decides when `insert` pays for a full sweep.
///
/// The threshold doubles with the surviving population, so sweeping costs
/// amortized O(1) per insert, and the cooldown bounds how often a full
/// table is rescanned.
#[derive(Debug)]
struct SweepSchedule {
    origin: Instant,
    next_at_len: AtomicUsize,
    not_before_ms: AtomicU64,
}

impl SweepSchedule {
    fn new(capacity: usize) -> Self {
        Self {
            origin: Instant::now(),
            next_at_len: AtomicUsize::new(SWEEP_FLOOR.min(capacity)),
            not_before_ms: AtomicU64::new(0),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn is_due(&self, len: usize) -> bool {
        len >= self.next_at_len.load(Ordering::Relaxed)
            && self.elapsed_ms() >= self.not_before_ms.load(Ordering::Relaxed)
    }

    fn reschedule(&self, remaining: usize, capacity: usize) {
        let next = remaining
            .saturating_mul(2)
            .clamp(SWEEP_FLOOR.min(capacity), capacity);
        self.next_at_len.store(next, Ordering::Relaxed);

        let cooldown = u64::try_from(SWEEP_COOLDOWN.as_millis()).unwrap_or(u64::MAX);
        self.not_before_ms
            .store(self.elapsed_ms().saturating_add(cooldown), Ordering::Relaxed);
    }
}

/// States issued by `begin` and not yet consumed by a callback.
///
/// Consumption is a single `remove` on the underlying map, so two callbacks
/// racing on the same state can never both observe it.
///
/// The table holds at most `capacity` entries. The cap is checked before
/// insertion, so concurrent inserts may overshoot it by the number of
/// racing callers.
#[derive(Clone, Debug)]
pub struct PendingStates {
    entries: Arc<DashMap<StateParam, PendingAuthorization>>,
    schedule: Arc<SweepSchedule>,
    ttl: Duration,
    capacity: usize,
}

impl PendingStates {
    /// Creates an empty table whose entries live for `ttl`, holding at most
    /// `capacity` entries (at least one).
    #[must_use]
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(DashMap::new()),
            schedule: Arc::new(SweepSchedule::new(capacity)),
            ttl,
            capacity,
        }
    }

    /// Records a newly issued state.
    ///
    /// Expired entries are swept first when the table has grown enough
    /// since the last sweep.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::TooManyPendingAuthorizations`] if the table is
    /// full of live entries. Nothing is recorded in that case.
    pub fn insert(
        &self,
        state: StateParam,
        shop: ShopDomain,
        is_online: bool,
    ) -> Result<(), OAuthError> {
        if self.schedule.is_due(self.entries.len()) {
            self.sweep_expired();
        }
        if self.entries.len() >= self.capacity {
            return Err(OAuthError::TooManyPendingAuthorizations {
                limit: self.capacity,
            });
        }

        self.entries.insert(
            state,
            PendingAuthorization {
                shop,
                is_online,
                issued_at: Instant::now(),
            },
        );
        Ok(())
    }

    /// Removes and returns the entry for `state` if it has not expired.
    ///
    /// The entry is removed whether or not it is still valid.
    pub fn consume(&self, state: &StateParam) -> Option<PendingAuthorization> {
        let (_, pending) = self.entries.remove(state)?;
        (!pending.is_expired(self.ttl)).then_some(pending)
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, pending| !pending.is_expired(self.ttl));
        let remaining = self.entries.len();
        self.schedule.reschedule(remaining, self.capacity);
        before.saturating_sub(remaining)
    }

    /// Returns the number of pending entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the maximum number of pending entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
