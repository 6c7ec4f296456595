#![forbid(unsafe_code)]
//! Wall-clock sources in minute granularity.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use time::OffsetDateTime;

use crate::types::ExpiryTime;

/// Source of the current time, in whole minutes since the Unix epoch.
pub trait Clock: Send + Sync {
    /// Returns the current minute.
    fn now_minutes(&self) -> ExpiryTime;
}

/// Clock backed by the system's UTC time.
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_minutes(&self) -> ExpiryTime {
        let secs = OffsetDateTime::now_utc().unix_timestamp();
        u64::try_from(secs / 60).unwrap_or(0)
    }
}

/// Manually driven clock for tests and deterministic replays.
#[derive(Default)]
pub struct ManualClock {
    minutes: AtomicU64,
}

impl ManualClock {
    /// Creates a clock frozen at `minutes`.
    pub fn new(minutes: ExpiryTime) -> Self {
        Self {
            minutes: AtomicU64::new(minutes),
        }
    }

    /// Moves the clock to `minutes`.
    pub fn set(&self, minutes: ExpiryTime) {
        self.minutes.store(minutes, Ordering::Relaxed);
    }

    /// Moves the clock forward by `minutes`.
    pub fn advance(&self, minutes: ExpiryTime) {
        self.minutes.fetch_add(minutes, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_minutes(&self) -> ExpiryTime {
        self.minutes.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualClock")
            .field("minutes", &self.now_minutes())
            .finish()
    }
}
