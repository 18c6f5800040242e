//! Productivity insights: profile, reminder engagement and recommendations.

use chrono::{DateTime, FixedOffset, TimeZone};
use serde::{Deserialize, Serialize};

use crate::productivity::{ProductivityProfile, ResponseTimes};
use crate::reminder::Reminder;

/// How often reminders led to action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    pub total_reminders: usize,
    pub acted_on: usize,
    /// Percentage of reminders acted on, rounded to two decimals
    pub engagement_rate: f64,
}

impl Engagement {
    pub fn from_counts(total_reminders: usize, acted_on: usize) -> Self {
        let engagement_rate = if total_reminders == 0 {
            0.0
        } else {
            let rate = acted_on as f64 / total_reminders as f64 * 100.0;
            (rate * 100.0).round() / 100.0
        };
        Self {
            total_reminders,
            acted_on,
            engagement_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    /// Rendered in the offset of the clock the insights were built with
    pub next_optimal_reminder_time: DateTime<FixedOffset>,
    pub should_send_reminder_now: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub profile: ProductivityProfile,
    pub engagement: Engagement,
    pub response_times: ResponseTimes,
    pub recommendations: Recommendations,
}

impl Insights {
    /// `engagement` covers the whole reminder history; `recent` is the
    /// sample response times are measured on.
    pub fn build<Tz: TimeZone>(
        profile: ProductivityProfile,
        engagement: Engagement,
        recent: &[Reminder],
        now: &DateTime<Tz>,
    ) -> Self {
        let recommendations = Recommendations {
            next_optimal_reminder_time: profile.next_optimal_time(now).fixed_offset(),
            should_send_reminder_now: profile.should_notify_now(now),
        };
        Self {
            engagement,
            response_times: ResponseTimes::from_reminders(recent),
            recommendations,
            profile,
        }
    }
}
