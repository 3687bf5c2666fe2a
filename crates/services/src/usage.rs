//! Request-count bookkeeping against the free-tier limits.
//!
//! The counters are advisory: the real quota lives server-side. A 429
//! from the CLI pushes the daily counter to its limit so the UI shows
//! exhaustion immediately instead of waiting for the next tick.

use chrono::{Datelike, Local, Timelike};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Google AI Studio free-tier daily request limit.
pub const DAILY_LIMIT: u32 = 1500;
/// Requests per minute limit.
pub const RPM_LIMIT: u32 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageData {
    pub requests: u32,
    pub daily_limit: u32,
    pub rpm_limit: u32,
    /// Unix timestamp of the last daily reset.
    pub last_reset: i64,
    pub minute_requests: u32,
    /// Minute-of-hour of the most recent request.
    pub last_minute: u32,
}

impl Default for UsageData {
    fn default() -> Self {
        Self {
            requests: 0,
            daily_limit: DAILY_LIMIT,
            rpm_limit: RPM_LIMIT,
            last_reset: Local::now().timestamp(),
            minute_requests: 0,
            last_minute: Local::now().minute(),
        }
    }
}

/// Persisted usage counters (`usage.json`).
pub struct UsageTracker {
    path: PathBuf,
    data: UsageData,
}

impl UsageTracker {
    pub fn open(dir: PathBuf) -> Self {
        let path = dir.join("usage.json");
        let data = fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        let mut tracker = Self { path, data };
        tracker.reset_if_new_day();
        tracker
    }

    pub fn data(&self) -> &UsageData {
        &self.data
    }

    /// Count one request, rolling the minute counter over when the
    /// minute changed. Call once per chat turn, before the turn runs.
    pub fn increment(&mut self) {
        self.reset_if_new_day();
        let minute = Local::now().minute();
        if minute == self.data.last_minute {
            self.data.minute_requests += 1;
        } else {
            self.data.minute_requests = 1;
            self.data.last_minute = minute;
        }
        self.data.requests += 1;
        self.save();
    }

    /// Jump the daily counter to just under the limit after a 429.
    pub fn set_to_limit(&mut self) {
        self.data.requests = self
            .data
            .requests
            .max(self.data.daily_limit.saturating_sub(10));
        self.save();
    }

    /// Periodic tick from the UI; resets the counters at date change.
    pub fn tick(&mut self) {
        if self.reset_if_new_day() {
            self.save();
        }
    }

    pub fn daily_fraction(&self) -> f32 {
        (self.data.requests as f32 / self.data.daily_limit as f32).min(1.0)
    }

    pub fn remaining(&self) -> u32 {
        self.data.daily_limit.saturating_sub(self.data.requests)
    }

    pub fn minute_fraction(&self) -> f32 {
        (self.data.minute_requests as f32 / self.data.rpm_limit as f32).min(1.0)
    }

    fn reset_if_new_day(&mut self) -> bool {
        let last = chrono::DateTime::from_timestamp(self.data.last_reset, 0)
            .map(|t| t.with_timezone(&Local));
        let now = Local::now();
        let new_day = match last {
            Some(last) => {
                last.day() != now.day() || last.month() != now.month() || last.year() != now.year()
            }
            None => true,
        };
        if new_day {
            self.data = UsageData::default();
        }
        new_day
    }

    fn save(&self) {
        let result = serde_json::to_string_pretty(&self.data)
            .map_err(anyhow::Error::from)
            .and_then(|json| {
                if let Some(parent) = self.path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&self.path, json).map_err(Into::into)
            });
        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "failed to save usage data");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_counts_daily_and_minute() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = UsageTracker::open(dir.path().to_path_buf());
        tracker.increment();
        tracker.increment();
        assert_eq!(tracker.data().requests, 2);
        assert!(tracker.data().minute_requests >= 1);
        assert_eq!(tracker.remaining(), DAILY_LIMIT - 2);
    }

    #[test]
    fn set_to_limit_jumps_near_the_cap() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = UsageTracker::open(dir.path().to_path_buf());
        tracker.increment();
        tracker.set_to_limit();
        assert_eq!(tracker.data().requests, DAILY_LIMIT - 10);
        assert!(tracker.daily_fraction() > 0.9);
    }

    #[test]
    fn set_to_limit_never_lowers_the_counter() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = UsageTracker::open(dir.path().to_path_buf());
        for _ in 0..DAILY_LIMIT {
            tracker.increment();
        }
        tracker.set_to_limit();
        assert_eq!(tracker.data().requests, DAILY_LIMIT);
    }

    #[test]
    fn counters_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut tracker = UsageTracker::open(dir.path().to_path_buf());
            tracker.increment();
            tracker.increment();
            tracker.increment();
        }
        let tracker = UsageTracker::open(dir.path().to_path_buf());
        assert_eq!(tracker.data().requests, 3);
    }

    #[test]
    fn stale_day_resets_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let stale = UsageData {
            requests: 900,
            last_reset: 0, // 1970: definitely a different day
            ..UsageData::default()
        };
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(
            dir.path().join("usage.json"),
            serde_json::to_string(&stale).unwrap(),
        )
        .unwrap();
        let tracker = UsageTracker::open(dir.path().to_path_buf());
        assert_eq!(tracker.data().requests, 0);
    }
}
