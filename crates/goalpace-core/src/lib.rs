//! # Goalpace Core Library
//!
//! Core logic for goalpace, a goal-tracking companion. Goals are split into
//! week/day tasks that may depend on each other; the user's activity log is
//! analyzed into hourly productivity windows, and reminders are generated and
//! timed around those windows. The `goalpace` CLI is a thin layer over this
//! crate.
//!
//! ## Architecture
//!
//! - **Tasks**: goals, tasks and the dependency lock resolver
//! - **Productivity**: hour-of-day bucketing and window extraction
//! - **Reminders**: message generation, lifecycle and low-energy aware dispatch
//! - **Storage**: SQLite persistence and TOML configuration
//!
//! ## Key Components
//!
//! - [`lock_statuses`]: lock status of every task in a goal
//! - [`ProductivityAnalyzer`]: activity log to [`ProductivityProfile`]
//! - [`next_optimal_time`] and [`should_notify_now`]: reminder timing
//! - [`Companion`]: the service tying storage, config and analysis together

pub mod activity;
pub mod companion;
pub mod error;
pub mod insights;
pub mod productivity;
pub mod reminder;
pub mod storage;
pub mod task;

pub use activity::{ActivityEvent, ActivityKind, UserId};
pub use companion::{Companion, TaskUpdateOutcome};
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use insights::{Engagement, Insights, Recommendations};
pub use productivity::{
    coalesce, Bucketizer, HourRange, ProductivityAnalyzer, ProductivityProfile, ProfileSource, ResponseTimes,
    WindowExtractor,
};
pub use reminder::{
    next_optimal_time, should_notify_now, DispatchReport, Dispatcher, LogNotifier, MemoryNotifier, MotivationLevel,
    Notifier, Reminder, ReminderAction, ReminderGenerator, ReminderKind, ReminderStatus, ReminderTransitionError,
};
pub use storage::{Config, Database, Frequency};
pub use task::{
    dependents_of, group_by_week, is_unlocked, lock_statuses, Goal, GoalId, GoalProgress, GoalUpdate, Task, TaskId,
    TaskStatus, TaskUpdate, TaskView,
};
