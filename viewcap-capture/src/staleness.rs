//! Freshness protocol for push-style backends.
//!
//! Frames arrive asynchronously, so a reader may find a frame that was delivered
//! before its call started. The tracker records the last delivery time and, when
//! the held frame predates the call, waits one interval for a newer one before
//! handing back whatever is held at that point.

use serde::{Deserialize, Serialize};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default pause before re-reading a possibly stale frame.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(1);

/// Default number of freshness checks per retrieval.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Monotonic time of the most recent delivery.
///
/// `None` until the first frame arrives; afterwards it never moves backwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LivenessState {
    last_update: Option<Instant>,
}

impl LivenessState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a delivery at `at`. Earlier timestamps are ignored.
    pub fn record(&mut self, at: Instant) {
        match self.last_update {
            Some(last) if last >= at => {}
            _ => self.last_update = Some(at),
        }
    }

    pub fn last_update(&self) -> Option<Instant> {
        self.last_update
    }

    pub fn has_update(&self) -> bool {
        self.last_update.is_some()
    }

    /// True when the held data was delivered strictly before `call_start`.
    pub fn is_stale_at(&self, call_start: Instant) -> bool {
        matches!(self.last_update, Some(last) if last < call_start)
    }
}

/// Wait-and-retry policy applied before surfacing a pushed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StalenessTracker {
    /// Pause applied when the held frame predates the call.
    #[serde(with = "millis")]
    pub wait: Duration,
    /// Declared bound on freshness checks per retrieval.
    pub max_attempts: u32,
}

impl Default for StalenessTracker {
    fn default() -> Self {
        Self {
            wait: DEFAULT_WAIT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl StalenessTracker {
    pub fn new(wait: Duration, max_attempts: u32) -> Self {
        Self { wait, max_attempts }
    }

    /// Return the held value after applying the freshness wait.
    ///
    /// `read` yields the current liveness state and a copy of the held value. At
    /// most one wait happens: the first check either passes or sleeps once, then
    /// the value held at that point is returned even if it is still old.
    /// Returns `None` if nothing was ever delivered or `max_attempts` is zero.
    pub fn await_fresh<T>(
        &self,
        call_start: Instant,
        mut read: impl FnMut() -> (LivenessState, Option<T>),
    ) -> Option<T> {
        if self.max_attempts == 0 {
            warn!("Staleness tracker has no attempts configured; returning no frame");
            return None;
        }

        let (liveness, held) = read();
        if !liveness.is_stale_at(call_start) {
            return held;
        }

        debug!("Held frame predates the call, waiting {:?} for a newer one", self.wait);
        thread::sleep(self.wait);
        read().1
    }

    /// Liveness probe for push-style backends.
    ///
    /// If nothing has been delivered yet, waits one interval and checks again.
    pub fn await_first_update(&self, mut liveness: impl FnMut() -> LivenessState) -> bool {
        if liveness().has_update() {
            return true;
        }
        debug!("No delivery yet, waiting {:?} before reporting liveness", self.wait);
        thread::sleep(self.wait);
        liveness().has_update()
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
