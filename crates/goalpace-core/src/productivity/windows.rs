//! Productivity window extraction.
//!
//! Turns hourly counts and completion scores into two ordered lists of
//! contiguous hour ranges: high-productivity windows and low-energy periods.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::buckets::HOURS_PER_DAY;
use crate::error::ValidationError;

/// High-productivity hours used when no hour clears the activity floor.
pub const DEFAULT_HIGH_HOURS: [u8; 4] = [9, 10, 14, 15];

/// A closed hour range `[start, end]` within one day. Ranges never wrap
/// past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawHourRange")]
pub struct HourRange {
    pub start: u8,
    pub end: u8,
}

/// Unchecked wire form; deserialized ranges go through [`HourRange::new`].
#[derive(Deserialize)]
struct RawHourRange {
    start: u8,
    end: u8,
}

impl TryFrom<RawHourRange> for HourRange {
    type Error = ValidationError;

    fn try_from(raw: RawHourRange) -> Result<Self, Self::Error> {
        HourRange::new(raw.start, raw.end)
    }
}

impl HourRange {
    /// Create a range, rejecting hours above 23 or `start > end`.
    pub fn new(start: u8, end: u8) -> Result<Self, ValidationError> {
        if end as usize >= HOURS_PER_DAY {
            return Err(ValidationError::HourOutOfRange(end as u32));
        }
        if start > end {
            return Err(ValidationError::InvalidValue {
                field: "hour_range".to_string(),
                message: format!("start {start} is after end {end}"),
            });
        }
        Ok(Self { start, end })
    }

    pub(crate) const fn fixed(start: u8, end: u8) -> Self {
        Self { start, end }
    }

    /// Inclusive membership test.
    pub fn contains(&self, hour: u32) -> bool {
        self.start as u32 <= hour && hour <= self.end as u32
    }

    pub fn len(&self) -> usize {
        (self.end - self.start) as usize + 1
    }
}

impl fmt::Display for HourRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:59", self.start, self.end)
    }
}

/// Coalesce hours into minimal contiguous ranges, in ascending order.
///
/// An hour extends the current range only when it equals `end + 1`; hour 23
/// and hour 0 are never joined. Duplicate hours are collapsed.
pub fn coalesce(hours: &[u8]) -> Vec<HourRange> {
    let mut sorted = hours.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut ranges = Vec::new();
    let mut iter = sorted.into_iter();
    let Some(first) = iter.next() else {
        return ranges;
    };

    let mut current = HourRange::fixed(first, first);
    for hour in iter {
        if hour == current.end + 1 {
            current.end = hour;
        } else {
            ranges.push(current);
            current = HourRange::fixed(hour, hour);
        }
    }
    ranges.push(current);
    ranges
}

/// Extracted window sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Windows {
    pub high: Vec<HourRange>,
    pub low: Vec<HourRange>,
}

/// Percentile-based window extractor.
#[derive(Debug, Clone)]
pub struct WindowExtractor {
    /// Minimum events an hour needs to be ranked at all
    pub activity_floor: u64,
}

impl Default for WindowExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowExtractor {
    pub fn new() -> Self {
        Self { activity_floor: 2 }
    }

    pub fn with_floor(activity_floor: u64) -> Self {
        Self { activity_floor }
    }

    /// Hours ranked high-productivity: the top quartile (floor division,
    /// at least one hour) of hours meeting the activity floor, by score.
    /// Ties keep ascending hour order. Falls back to [`DEFAULT_HIGH_HOURS`]
    /// when no hour qualifies.
    pub fn high_hours(&self, counts: &[u64; HOURS_PER_DAY], scores: &[f64; HOURS_PER_DAY]) -> Vec<u8> {
        let mut active: Vec<(u8, f64)> = (0..HOURS_PER_DAY)
            .filter(|&h| counts[h] >= self.activity_floor)
            .map(|h| (h as u8, scores[h]))
            .collect();

        if active.is_empty() {
            return DEFAULT_HIGH_HOURS.to_vec();
        }

        active.sort_by(|a, b| b.1.total_cmp(&a.1));
        let take = (active.len() / 4).max(1);
        active.into_iter().take(take).map(|(h, _)| h).collect()
    }

    /// Derive high-productivity and low-energy windows.
    ///
    /// Low-energy hours are the hours with no recorded activity that were
    /// not selected as high-productivity.
    pub fn extract(&self, counts: &[u64; HOURS_PER_DAY], scores: &[f64; HOURS_PER_DAY]) -> Windows {
        let high = self.high_hours(counts, scores);
        let low: Vec<u8> = (0..HOURS_PER_DAY as u8)
            .filter(|&h| counts[h as usize] == 0 && !high.contains(&h))
            .collect();

        Windows {
            high: coalesce(&high),
            low: coalesce(&low),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buckets(entries: &[(usize, u64, u64)]) -> ([u64; 24], [f64; 24]) {
        let mut counts = [0u64; 24];
        let mut scores = [0.0; 24];
        for &(hour, count, completions) in entries {
            counts[hour] = count;
            scores[hour] = completions as f64 / count as f64;
        }
        (counts, scores)
    }

    #[test]
    fn deserializing_validates_range() {
        let ok: HourRange = serde_json::from_str(r#"{"start": 9, "end": 12}"#).unwrap();
        assert_eq!(ok, HourRange::fixed(9, 12));
        assert_eq!(ok.len(), 4);
        assert!(serde_json::from_str::<HourRange>(r#"{"start": 12, "end": 9}"#).is_err());
        assert!(serde_json::from_str::<HourRange>(r#"{"start": 3, "end": 24}"#).is_err());
    }

    #[test]
    fn coalesce_groups_consecutive_hours() {
        let ranges = coalesce(&[1, 2, 3, 7, 8]);
        assert_eq!(ranges, vec![HourRange::fixed(1, 3), HourRange::fixed(7, 8)]);
    }

    #[test]
    fn coalesce_sorts_input_and_never_wraps_midnight() {
        let ranges = coalesce(&[0, 23, 22, 1]);
        assert_eq!(ranges, vec![HourRange::fixed(0, 1), HourRange::fixed(22, 23)]);
    }

    #[test]
    fn coalesce_empty_and_duplicates() {
        assert!(coalesce(&[]).is_empty());
        assert_eq!(coalesce(&[5, 5, 6]), vec![HourRange::fixed(5, 6)]);
    }

    #[test]
    fn two_active_hours_pick_the_best_one() {
        let (counts, scores) = buckets(&[(9, 5, 5), (10, 3, 0)]);
        let windows = WindowExtractor::new().extract(&counts, &scores);
        assert_eq!(windows.high, vec![HourRange::fixed(9, 9)]);
        assert_eq!(windows.low, vec![HourRange::fixed(0, 8), HourRange::fixed(11, 23)]);
    }

    #[test]
    fn quartile_uses_floor_division() {
        // 10 active hours -> top 2
        let entries: Vec<(usize, u64, u64)> = (8..18).map(|h| (h, 4, (h as u64) % 5)).collect();
        let (counts, scores) = buckets(&entries);
        let high = WindowExtractor::new().high_hours(&counts, &scores);
        assert_eq!(high.len(), 2);

        // 3 active hours -> top 1
        let (counts, scores) = buckets(&[(8, 2, 1), (9, 2, 2), (10, 2, 0)]);
        assert_eq!(WindowExtractor::new().high_hours(&counts, &scores), vec![9]);
    }

    #[test]
    fn ties_keep_ascending_hour_order() {
        let entries: Vec<(usize, u64, u64)> = (8..16).map(|h| (h, 2, 2)).collect();
        let (counts, scores) = buckets(&entries);
        assert_eq!(WindowExtractor::new().high_hours(&counts, &scores), vec![8, 9]);
    }

    #[test]
    fn single_sample_hours_are_not_ranked() {
        let (counts, scores) = buckets(&[(3, 1, 1), (4, 1, 1)]);
        let windows = WindowExtractor::new().extract(&counts, &scores);
        assert_eq!(
            windows.high,
            vec![HourRange::fixed(9, 10), HourRange::fixed(14, 15)]
        );
        // 3 and 4 had activity so they are not low-energy; defaults are excluded too
        assert_eq!(
            windows.low,
            vec![
                HourRange::fixed(0, 2),
                HourRange::fixed(5, 8),
                HourRange::fixed(11, 13),
                HourRange::fixed(16, 23),
            ]
        );
    }

    #[test]
    fn hour_range_validation() {
        assert!(HourRange::new(9, 12).is_ok());
        assert!(HourRange::new(12, 9).is_err());
        assert!(HourRange::new(20, 24).is_err());
    }

    #[test]
    fn hour_range_contains_is_inclusive() {
        let range = HourRange::fixed(14, 17);
        assert!(range.contains(14));
        assert!(range.contains(17));
        assert!(!range.contains(18));
        assert_eq!(range.len(), 4);
        assert_eq!(range.to_string(), "14:00-17:59");
    }
}
