//! Configuration for the station state manager.

use std::time::Duration;

/// Timing parameters for refreshing the station list.
#[derive(Debug, Clone)]
pub struct StationsConfig {
    /// Period of the background auto-refresh (seconds).
    pub refresh_interval_secs: u64,

    /// Minimum gap between two user-requested refreshes (seconds).
    /// Requests inside this window are rejected, not queued.
    pub manual_refresh_cooldown_secs: u64,
}

impl StationsConfig {
    pub fn new(refresh_interval_secs: u64, manual_refresh_cooldown_secs: u64) -> Self {
        Self {
            refresh_interval_secs,
            manual_refresh_cooldown_secs,
        }
    }

    /// Returns the auto-refresh period as a Duration.
    ///
    /// Clamped to at least one second; a zero period would spin.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    /// Returns the manual refresh cooldown as a Duration.
    pub fn manual_refresh_cooldown(&self) -> Duration {
        Duration::from_secs(self.manual_refresh_cooldown_secs)
    }
}

impl Default for StationsConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 120,
            manual_refresh_cooldown_secs: 15,
        }
    }
}
