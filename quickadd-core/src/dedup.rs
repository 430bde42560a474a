//! Dedup watermark shared by every notification path.
//!
//! The tracker stores the timestamp of the most recently accepted message.
//! A message is only "new" when its timestamp is strictly greater than the
//! watermark. The watermark never decreases and only moves after a
//! dispatch reached a terminal outcome.

use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Watermark value meaning "nothing processed yet".
pub const NOTHING_ACCEPTED: i64 = i64::MIN;

#[derive(Debug)]
pub struct DedupTracker {
    last_accepted: Mutex<i64>,
}

impl Default for DedupTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DedupTracker {
    pub fn new() -> Self {
        Self::starting_at(NOTHING_ACCEPTED)
    }

    /// Start from a known watermark (e.g. restored by the host app).
    pub fn starting_at(last_accepted: i64) -> Self {
        Self {
            last_accepted: Mutex::new(last_accepted),
        }
    }

    fn lock(&self) -> MutexGuard<'_, i64> {
        // The guarded value is a plain integer; a panic elsewhere cannot leave it half-written.
        self.last_accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn last_accepted(&self) -> i64 {
        *self.lock()
    }

    pub fn is_new(&self, timestamp: i64) -> bool {
        timestamp > *self.lock()
    }

    /// Advance the watermark to `timestamp` unless it is already past it.
    pub fn mark_accepted(&self, timestamp: i64) {
        let mut last = self.lock();
        *last = (*last).max(timestamp);
    }

    /// Enter the check-and-advance critical section for `timestamp`.
    ///
    /// Returns `None` when the timestamp is not newer than the watermark.
    /// While the returned claim is alive no other caller can observe or move
    /// the watermark, so a dispatch performed under the claim cannot race
    /// with an overlapping delivery of the same message. Dropping the claim
    /// without [`DedupClaim::commit`] leaves the watermark untouched.
    pub fn claim(&self, timestamp: i64) -> Option<DedupClaim<'_>> {
        let guard = self.lock();
        if timestamp > *guard {
            Some(DedupClaim { guard, timestamp })
        } else {
            None
        }
    }
}

/// Exclusive hold on the watermark for one candidate timestamp.
#[must_use = "dropping a claim without committing leaves the watermark unchanged"]
pub struct DedupClaim<'a> {
    guard: MutexGuard<'a, i64>,
    timestamp: i64,
}

impl DedupClaim<'_> {
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Advance the watermark to the claimed timestamp and release the claim.
    pub fn commit(mut self) {
        let previous = *self.guard;
        *self.guard = previous.max(self.timestamp);
        debug!(previous, current = *self.guard, "dedup watermark advanced");
    }
}
