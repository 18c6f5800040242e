//! Hourly activity buckets.

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::{ActivityEvent, ActivityKind};

/// Number of hourly buckets in a day.
pub const HOURS_PER_DAY: usize = 24;

/// Per-hour activity and completion counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyBuckets {
    /// All retained events per hour of day
    pub counts: [u64; HOURS_PER_DAY],
    /// `task_completed` events per hour of day
    pub completions: [u64; HOURS_PER_DAY],
}

impl HourlyBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one event in `hour`. Hours outside 0-23 are ignored.
    pub fn record(&mut self, hour: usize, completed: bool) {
        if hour >= HOURS_PER_DAY {
            return;
        }
        self.counts[hour] += 1;
        if completed {
            self.completions[hour] += 1;
        }
    }

    /// Completion ratio for one hour; 0 for an hour with no activity.
    ///
    /// This is a plain ratio, so a sparsely used hour can score 1.0. The
    /// window extractor's activity floor keeps such hours out of the
    /// high-productivity set.
    pub fn score(&self, hour: usize) -> f64 {
        match self.counts.get(hour) {
            Some(&count) if count > 0 => self.completions[hour] as f64 / count as f64,
            _ => 0.0,
        }
    }

    pub fn scores(&self) -> [f64; HOURS_PER_DAY] {
        let mut scores = [0.0; HOURS_PER_DAY];
        for (hour, score) in scores.iter_mut().enumerate() {
            *score = self.score(hour);
        }
        scores
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Result of bucketizing one activity window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucketized {
    pub buckets: HourlyBuckets,
    /// Events inside the analysis window
    pub retained: u64,
    /// Retained `task_completed` events
    pub completed: u64,
    /// Retained `task_missed` events
    pub missed: u64,
}

/// Aggregates a time-bounded activity log into 24 hourly buckets.
#[derive(Debug, Clone)]
pub struct Bucketizer {
    /// Look-back window in days
    pub window_days: u32,
    /// Minimum retained events before hourly data is trusted
    pub min_events: u64,
}

impl Default for Bucketizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Bucketizer {
    /// Create a bucketizer with the default 30-day window and 10-event floor.
    pub fn new() -> Self {
        Self {
            window_days: 30,
            min_events: 10,
        }
    }

    pub fn with_settings(window_days: u32, min_events: u64) -> Self {
        Self {
            window_days,
            min_events,
        }
    }

    /// Earliest timestamp retained for an analysis run at `now`.
    pub fn cutoff<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Utc> {
        now.with_timezone(&Utc) - Duration::days(self.window_days as i64)
    }

    /// Bucket every event with `timestamp >= now - window_days`.
    ///
    /// Hours are taken in the time zone of `now`, so the resulting windows
    /// line up with the clock the scheduler later compares them against.
    /// Event order does not matter.
    pub fn bucketize<Tz: TimeZone>(&self, events: &[ActivityEvent], now: &DateTime<Tz>) -> Bucketized {
        let cutoff = self.cutoff(now);
        let tz = now.timezone();
        let mut out = Bucketized::default();

        for event in events.iter().filter(|e| e.timestamp >= cutoff) {
            let hour = event.timestamp.with_timezone(&tz).hour() as usize;
            let completed = event.kind == ActivityKind::TaskCompleted;
            out.buckets.record(hour, completed);
            out.retained += 1;
            if completed {
                out.completed += 1;
            } else if event.kind == ActivityKind::TaskMissed {
                out.missed += 1;
            }
        }

        out
    }

    /// Whether enough events were retained to analyze instead of falling
    /// back to the default profile.
    pub fn is_sufficient(&self, bucketized: &Bucketized) -> bool {
        bucketized.retained >= self.min_events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn at(hour: u32, days_ago: i64, now: DateTime<Utc>) -> DateTime<Utc> {
        let day = (now - Duration::days(days_ago)).date_naive();
        Utc.from_utc_datetime(&day.and_hms_opt(hour, 15, 0).unwrap())
    }

    fn event(kind: ActivityKind, ts: DateTime<Utc>) -> ActivityEvent {
        ActivityEvent::new("u1", kind, ts)
    }

    #[test]
    fn score_is_completion_ratio() {
        let mut buckets = HourlyBuckets::new();
        buckets.record(9, true);
        buckets.record(9, true);
        buckets.record(9, false);
        buckets.record(9, false);
        assert_eq!(buckets.score(9), 0.5);
        assert_eq!(buckets.score(10), 0.0);
        assert_eq!(buckets.score(99), 0.0);
    }

    #[test]
    fn out_of_range_hour_ignored() {
        let mut buckets = HourlyBuckets::new();
        buckets.record(24, true);
        assert_eq!(buckets.total(), 0);
    }

    #[test]
    fn bucketize_counts_and_completions() {
        let now = Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
        let events = vec![
            event(ActivityKind::TaskCompleted, at(9, 1, now)),
            event(ActivityKind::TaskCompleted, at(9, 2, now)),
            event(ActivityKind::TaskCreated, at(9, 3, now)),
            event(ActivityKind::TaskMissed, at(20, 1, now)),
        ];

        let result = Bucketizer::new().bucketize(&events, &now);
        assert_eq!(result.retained, 4);
        assert_eq!(result.completed, 2);
        assert_eq!(result.missed, 1);
        assert_eq!(result.buckets.counts[9], 3);
        assert_eq!(result.buckets.completions[9], 2);
        assert_eq!(result.buckets.counts[20], 1);
    }

    #[test]
    fn bucketize_drops_events_outside_window() {
        let now = Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
        let events = vec![
            event(ActivityKind::TaskCompleted, at(9, 1, now)),
            event(ActivityKind::TaskCompleted, at(9, 31, now)),
        ];
        let result = Bucketizer::new().bucketize(&events, &now);
        assert_eq!(result.retained, 1);
    }

    #[test]
    fn cutoff_is_inclusive() {
        let now = Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
        let bucketizer = Bucketizer::with_settings(7, 1);
        let events = vec![event(ActivityKind::TaskCreated, now - Duration::days(7))];
        assert_eq!(bucketizer.bucketize(&events, &now).retained, 1);
    }

    #[test]
    fn hours_follow_the_clock_of_now() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let now = tokyo.with_ymd_and_hms(2024, 3, 20, 18, 0, 0).unwrap();
        // 00:30 UTC is 09:30 in Tokyo
        let ts = Utc.with_ymd_and_hms(2024, 3, 19, 0, 30, 0).unwrap();
        let result = Bucketizer::new().bucketize(&[event(ActivityKind::TaskCompleted, ts)], &now);
        assert_eq!(result.buckets.counts[9], 1);
        assert_eq!(result.buckets.counts[0], 0);
    }

    #[test]
    fn sufficiency_guard() {
        let bucketizer = Bucketizer::new();
        let mut result = Bucketized::default();
        result.retained = 9;
        assert!(!bucketizer.is_sufficient(&result));
        result.retained = 10;
        assert!(bucketizer.is_sufficient(&result));
    }
}
