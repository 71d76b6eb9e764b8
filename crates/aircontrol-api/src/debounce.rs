// Post-command refresh suppression.
//
// Right after a control command the cloud still reports the old device
// state for a few seconds. Listing inside that window returns nothing
// instead of stale data.

use std::time::Duration;

use chrono::Utc;

/// Window applied when nothing else is configured.
pub const DEFAULT_DEBOUNCE_INTERVAL: Duration = Duration::from_millis(5000);

/// Last control timestamp plus the minimum quiet interval after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebounceWindow {
    /// Milliseconds since the Unix epoch; `0` means no command sent yet.
    last_update_ms: i64,
    interval: Duration,
}

impl Default for DebounceWindow {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_INTERVAL)
    }
}

impl DebounceWindow {
    pub fn new(interval: Duration) -> Self {
        Self {
            last_update_ms: 0,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Interval in whole milliseconds, saturating.
    pub fn interval_ms(&self) -> i64 {
        i64::try_from(self.interval.as_millis()).unwrap_or(i64::MAX)
    }

    /// Timestamp of the last recorded control command.
    pub fn last_update_ms(&self) -> Option<i64> {
        (self.last_update_ms > 0).then_some(self.last_update_ms)
    }

    pub fn record_update(&mut self) {
        self.record_update_at(now_ms());
    }

    pub fn record_update_at(&mut self, at_ms: i64) {
        self.last_update_ms = at_ms;
    }

    /// `true` while listing should be suppressed.
    pub fn is_active(&self) -> bool {
        self.is_active_at(now_ms())
    }

    pub fn is_active_at(&self, now_ms: i64) -> bool {
        self.last_update_ms > 0 && now_ms.saturating_sub(self.last_update_ms) < self.interval_ms()
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
