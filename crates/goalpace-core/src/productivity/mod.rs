//! Productivity pattern analysis.
//!
//! This module infers when a user tends to get work done from their
//! activity log:
//! - [`Bucketizer`] folds events into 24 hourly buckets
//! - [`WindowExtractor`] ranks hours and coalesces them into ranges
//! - [`ProductivityAnalyzer`] composes both into a [`ProductivityProfile`]

mod buckets;
mod profile;
mod windows;

pub use buckets::{Bucketized, Bucketizer, HourlyBuckets, HOURS_PER_DAY};
pub use profile::{ProductivityAnalyzer, ProductivityProfile, ProfileSource, ResponseTimes};
pub use windows::{coalesce, HourRange, WindowExtractor, Windows, DEFAULT_HIGH_HOURS};
