//! Reminder timing driven by productivity windows.
//!
//! Both functions are generic over the caller's clock: hours are read from
//! `now` in its own time zone, and returned instants carry the same zone.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::productivity::HourRange;

/// Hour used when there are no high-productivity windows at all.
pub const DEFAULT_REMINDER_HOUR: u32 = 9;

/// How an hour of the day relates to a user's windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HourClass {
    LowEnergy,
    HighProductivity,
    Neutral,
}

/// Classify `hour`. Low-energy ranges win over high-productivity ones.
pub fn classify_hour(low: &[HourRange], high: &[HourRange], hour: u32) -> HourClass {
    if low.iter().any(|r| r.contains(hour)) {
        HourClass::LowEnergy
    } else if high.iter().any(|r| r.contains(hour)) {
        HourClass::HighProductivity
    } else {
        HourClass::Neutral
    }
}

/// Whether it is appropriate to notify at `now`.
///
/// Only explicit low-energy hours suppress notification; high-productivity
/// and neutral hours both allow it.
pub fn should_notify_now<Tz: TimeZone>(low: &[HourRange], high: &[HourRange], now: &DateTime<Tz>) -> bool {
    match classify_hour(low, high, now.hour()) {
        HourClass::LowEnergy => false,
        HourClass::HighProductivity | HourClass::Neutral => true,
    }
}

/// Next reminder slot: the start of a high-productivity window.
///
/// Windows are scanned in the order given, and the first one whose start
/// hour is strictly later than the current hour is used today. Otherwise
/// the first window's start hour tomorrow is used, or 09:00 tomorrow when
/// there are no windows. Minutes and seconds are zeroed.
///
/// Precondition: `high` is ascending by start hour, as produced by
/// [`crate::productivity::coalesce`]. Unordered input is not re-sorted.
pub fn next_optimal_time<Tz: TimeZone>(high: &[HourRange], now: &DateTime<Tz>) -> DateTime<Tz> {
    let current_hour = now.hour();
    let today = now.date_naive();

    if let Some(range) = high.iter().find(|r| r.start as u32 > current_hour) {
        return at_hour(&now.timezone(), today, range.start as u32);
    }

    let tomorrow = today.succ_opt().unwrap_or(today);
    let hour = high
        .first()
        .map(|r| r.start as u32)
        .unwrap_or(DEFAULT_REMINDER_HOUR);
    at_hour(&now.timezone(), tomorrow, hour)
}

/// `date` at `hour:00:00` local time in `tz`.
///
/// A local time skipped by a DST jump resolves to the first valid instant
/// after it; ambiguous local times resolve to the earlier instant.
fn at_hour<Tz: TimeZone>(tz: &Tz, date: NaiveDate, hour: u32) -> DateTime<Tz> {
    let time = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    let naive = date.and_time(time);

    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}
