//! Productivity profile and analyzer.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::buckets::{Bucketized, Bucketizer};
use super::windows::{HourRange, WindowExtractor};
use crate::activity::ActivityEvent;
use crate::reminder::Reminder;

/// Number of busiest hours reported in a profile.
const MOST_ACTIVE_LIMIT: usize = 5;

/// Where a profile's windows came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSource {
    /// Too little activity; fixed default windows.
    Default,
    /// Derived from the user's activity log.
    Observed,
}

/// A user's productivity profile.
///
/// Both window lists are derived and replaced wholesale on every recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductivityProfile {
    pub high_productivity_hours: Vec<HourRange>,
    pub low_energy_hours: Vec<HourRange>,
    pub total_activities: u64,
    pub completed_tasks: u64,
    pub missed_tasks: u64,
    pub average_response_time_minutes: Option<f64>,
    /// Busiest hours as `(hour, event count)`, busiest first
    pub most_active_hours: Vec<(u8, u64)>,
    pub source: ProfileSource,
}

impl ProductivityProfile {
    /// Profile used for new users and sparse activity logs.
    pub fn default_profile() -> Self {
        Self {
            high_productivity_hours: vec![HourRange::fixed(9, 12), HourRange::fixed(14, 17)],
            low_energy_hours: vec![HourRange::fixed(0, 7), HourRange::fixed(22, 23)],
            total_activities: 0,
            completed_tasks: 0,
            missed_tasks: 0,
            average_response_time_minutes: None,
            most_active_hours: Vec::new(),
            source: ProfileSource::Default,
        }
    }

    pub fn is_default(&self) -> bool {
        self.source == ProfileSource::Default
    }

    /// Next reminder slot for this profile. See [`crate::reminder::next_optimal_time`].
    pub fn next_optimal_time<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        crate::reminder::next_optimal_time(&self.high_productivity_hours, now)
    }

    /// Whether `now` is a good moment to notify. See [`crate::reminder::should_notify_now`].
    pub fn should_notify_now<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        crate::reminder::should_notify_now(&self.low_energy_hours, &self.high_productivity_hours, now)
    }
}

impl Default for ProductivityProfile {
    fn default() -> Self {
        Self::default_profile()
    }
}

/// Busiest non-empty hours, by count descending then hour ascending.
fn most_active_hours(bucketized: &Bucketized) -> Vec<(u8, u64)> {
    let mut hours: Vec<(u8, u64)> = bucketized
        .buckets
        .counts
        .iter()
        .enumerate()
        .filter(|(_, &count)| count > 0)
        .map(|(hour, &count)| (hour as u8, count))
        .collect();
    hours.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    hours.truncate(MOST_ACTIVE_LIMIT);
    hours
}

/// Analyzer composing the bucketizer and the window extractor.
#[derive(Debug, Clone, Default)]
pub struct ProductivityAnalyzer {
    pub bucketizer: Bucketizer,
    pub extractor: WindowExtractor,
}

impl ProductivityAnalyzer {
    /// Create an analyzer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create analyzer with custom settings.
    pub fn with_settings(window_days: u32, min_events: u64, activity_floor: u64) -> Self {
        Self {
            bucketizer: Bucketizer::with_settings(window_days, min_events),
            extractor: WindowExtractor::with_floor(activity_floor),
        }
    }

    /// Build a profile from a user's activity log.
    ///
    /// Returns the default profile when fewer than `min_events` events fall
    /// inside the analysis window. The response-time metric is left unset;
    /// see [`ResponseTimes`].
    pub fn analyze<Tz: TimeZone>(&self, events: &[ActivityEvent], now: &DateTime<Tz>) -> ProductivityProfile {
        let bucketized = self.bucketizer.bucketize(events, now);

        if !self.bucketizer.is_sufficient(&bucketized) {
            debug!(
                retained = bucketized.retained,
                min_events = self.bucketizer.min_events,
                "too little activity, using default productivity profile"
            );
            return ProductivityProfile::default_profile();
        }

        let windows = self
            .extractor
            .extract(&bucketized.buckets.counts, &bucketized.buckets.scores());

        debug!(
            retained = bucketized.retained,
            high = windows.high.len(),
            low = windows.low.len(),
            "productivity windows extracted"
        );

        ProductivityProfile {
            high_productivity_hours: windows.high,
            low_energy_hours: windows.low,
            total_activities: bucketized.retained,
            completed_tasks: bucketized.completed,
            missed_tasks: bucketized.missed,
            average_response_time_minutes: None,
            most_active_hours: most_active_hours(&bucketized),
            source: ProfileSource::Observed,
        }
    }
}

/// Minutes between a reminder's delivery and the user's first reaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseTimes {
    pub average: Option<f64>,
    pub median: Option<f64>,
    pub samples: usize,
}

impl ResponseTimes {
    /// Measure reminders that were delivered and then seen or dismissed.
    /// The first reaction is `seen_at`, falling back to `dismissed_at`.
    pub fn from_reminders(reminders: &[Reminder]) -> Self {
        let mut minutes: Vec<f64> = reminders
            .iter()
            .filter_map(|r| {
                let delivered = r.delivered_at?;
                let reacted = r.seen_at.or(r.dismissed_at)?;
                Some((reacted - delivered).num_seconds() as f64 / 60.0)
            })
            .filter(|m| *m >= 0.0)
            .collect();

        if minutes.is_empty() {
            return Self::default();
        }

        minutes.sort_by(|a, b| a.total_cmp(b));
        let n = minutes.len();
        let average = minutes.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 1 {
            minutes[n / 2]
        } else {
            (minutes[n / 2 - 1] + minutes[n / 2]) / 2.0
        };

        Self {
            average: Some(average),
            median: Some(median),
            samples: n,
        }
    }
}
