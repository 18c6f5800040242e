//! Reminders and their lifecycle.
//!
//! A reminder is created `Pending`, becomes `Delivered` once it has been
//! handed to a notifier at or after its scheduled time, and may then be
//! marked `Seen` and/or `Dismissed` by the user:
//!
//!   PENDING ──deliver──> DELIVERED ──seen──> SEEN
//!      │                     │                 │
//!      └───────seen / dismiss┴─────dismiss─────┴──> DISMISSED
//!
//! Each lifecycle timestamp is set at most once and they never go
//! backwards: `delivered_at <= seen_at <= dismissed_at` when present.

mod catalog;
mod dispatch;
mod generator;
mod scheduler;

pub use catalog::{FirstPicker, MessagePicker, MessageTheme, RandomPicker};
pub use dispatch::{DispatchOutcome, DispatchReport, Dispatcher, LogNotifier, MemoryNotifier, Notifier};
pub use generator::{GoalSnapshot, ReminderContext, ReminderGenerator};
pub use scheduler::{classify_hour, next_optimal_time, should_notify_now, HourClass, DEFAULT_REMINDER_HOUR};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::activity::{ActivityEvent, ActivityKind, UserId};
use crate::error::ValidationError;
use crate::task::{GoalId, TaskId};

/// Delivery status of a reminder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Pending,
    Delivered,
    Seen,
    Dismissed,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStatus::Pending => "pending",
            ReminderStatus::Delivered => "delivered",
            ReminderStatus::Seen => "seen",
            ReminderStatus::Dismissed => "dismissed",
        }
    }
}

impl Default for ReminderStatus {
    fn default() -> Self {
        ReminderStatus::Pending
    }
}

impl fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReminderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ReminderStatus::Pending),
            "delivered" => Ok(ReminderStatus::Delivered),
            "seen" => Ok(ReminderStatus::Seen),
            "dismissed" => Ok(ReminderStatus::Dismissed),
            other => Err(ValidationError::InvalidValue {
                field: "status".to_string(),
                message: format!("unknown reminder status '{other}'"),
            }),
        }
    }
}

/// Kind of reminder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    DailyCheckin,
    MissedTask,
    ProgressUpdate,
    Celebration,
    WeeklyReview,
    Motivation,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderKind::DailyCheckin => "daily_checkin",
            ReminderKind::MissedTask => "missed_task",
            ReminderKind::ProgressUpdate => "progress_update",
            ReminderKind::Celebration => "celebration",
            ReminderKind::WeeklyReview => "weekly_review",
            ReminderKind::Motivation => "motivation",
        }
    }
}

impl fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReminderKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily_checkin" => Ok(ReminderKind::DailyCheckin),
            "missed_task" => Ok(ReminderKind::MissedTask),
            "progress_update" => Ok(ReminderKind::ProgressUpdate),
            "celebration" => Ok(ReminderKind::Celebration),
            "weekly_review" => Ok(ReminderKind::WeeklyReview),
            "motivation" => Ok(ReminderKind::Motivation),
            other => Err(ValidationError::InvalidValue {
                field: "kind".to_string(),
                message: format!("unknown reminder kind '{other}'"),
            }),
        }
    }
}

/// Tone of a reminder message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MotivationLevel {
    Positive,
    Encouraging,
    Gentle,
    Neutral,
}

impl MotivationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotivationLevel::Positive => "positive",
            MotivationLevel::Encouraging => "encouraging",
            MotivationLevel::Gentle => "gentle",
            MotivationLevel::Neutral => "neutral",
        }
    }
}

impl Default for MotivationLevel {
    fn default() -> Self {
        MotivationLevel::Neutral
    }
}

impl FromStr for MotivationLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(MotivationLevel::Positive),
            "encouraging" => Ok(MotivationLevel::Encouraging),
            "gentle" => Ok(MotivationLevel::Gentle),
            "neutral" => Ok(MotivationLevel::Neutral),
            other => Err(ValidationError::InvalidValue {
                field: "motivation_level".to_string(),
                message: format!("unknown motivation level '{other}'"),
            }),
        }
    }
}

/// User action on a delivered reminder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReminderAction {
    Seen,
    Dismissed,
}

impl FromStr for ReminderAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seen" => Ok(ReminderAction::Seen),
            "dismissed" | "dismiss" => Ok(ReminderAction::Dismissed),
            other => Err(ValidationError::InvalidValue {
                field: "status".to_string(),
                message: format!("expected 'seen' or 'dismissed', got '{other}'"),
            }),
        }
    }
}

/// Lifecycle violation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReminderTransitionError {
    #[error("Invalid reminder transition: {from} → {to}")]
    InvalidTransition {
        from: ReminderStatus,
        to: ReminderStatus,
    },

    #[error("Reminder is not due until {scheduled}")]
    NotDue { scheduled: DateTime<Utc> },

    #[error("{field} ({at}) cannot precede {previous}")]
    OutOfOrder {
        field: &'static str,
        at: DateTime<Utc>,
        previous: DateTime<Utc>,
    },
}

/// A scheduled user-facing notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reminder {
    pub id: String,
    pub user_id: UserId,
    pub kind: ReminderKind,
    pub goal_id: Option<GoalId>,
    pub task_id: Option<TaskId>,
    pub title: String,
    pub message: String,
    pub motivation_level: MotivationLevel,
    pub scheduled_time: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub status: ReminderStatus,
    pub seen_at: Option<DateTime<Utc>>,
    pub dismissed_at: Option<DateTime<Utc>>,
    /// Whether the user acted on the reminder
    pub action_taken: bool,
    pub created_at: DateTime<Utc>,
}

impl Reminder {
    /// Create a pending reminder.
    pub fn new(
        user_id: impl Into<UserId>,
        kind: ReminderKind,
        title: impl Into<String>,
        message: impl Into<String>,
        scheduled_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            kind,
            goal_id: None,
            task_id: None,
            title: title.into(),
            message: message.into(),
            motivation_level: MotivationLevel::Neutral,
            scheduled_time,
            delivered_at: None,
            status: ReminderStatus::Pending,
            seen_at: None,
            dismissed_at: None,
            action_taken: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_motivation(mut self, level: MotivationLevel) -> Self {
        self.motivation_level = level;
        self
    }

    pub fn for_goal(mut self, goal_id: impl Into<GoalId>) -> Self {
        self.goal_id = Some(goal_id.into());
        self
    }

    pub fn for_task(mut self, goal_id: impl Into<GoalId>, task_id: impl Into<TaskId>) -> Self {
        self.goal_id = Some(goal_id.into());
        self.task_id = Some(task_id.into());
        self
    }

    /// Whether the reminder is pending and its scheduled time has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == ReminderStatus::Pending && self.scheduled_time <= now
    }

    /// Pending → Delivered, at or after the scheduled time.
    pub fn deliver(&mut self, at: DateTime<Utc>) -> Result<(), ReminderTransitionError> {
        if self.status != ReminderStatus::Pending {
            return Err(ReminderTransitionError::InvalidTransition {
                from: self.status,
                to: ReminderStatus::Delivered,
            });
        }
        if at < self.scheduled_time {
            return Err(ReminderTransitionError::NotDue {
                scheduled: self.scheduled_time,
            });
        }
        self.delivered_at = Some(at);
        self.status = ReminderStatus::Delivered;
        Ok(())
    }

    /// Pending/Delivered → Seen.
    pub fn mark_seen(&mut self, at: DateTime<Utc>) -> Result<(), ReminderTransitionError> {
        if !matches!(self.status, ReminderStatus::Pending | ReminderStatus::Delivered) {
            return Err(ReminderTransitionError::InvalidTransition {
                from: self.status,
                to: ReminderStatus::Seen,
            });
        }
        if let Some(delivered) = self.delivered_at {
            if at < delivered {
                return Err(ReminderTransitionError::OutOfOrder {
                    field: "seen_at",
                    at,
                    previous: delivered,
                });
            }
        }
        self.seen_at = Some(at);
        self.status = ReminderStatus::Seen;
        Ok(())
    }

    /// Pending/Delivered/Seen → Dismissed.
    pub fn dismiss(&mut self, at: DateTime<Utc>) -> Result<(), ReminderTransitionError> {
        if self.status == ReminderStatus::Dismissed {
            return Err(ReminderTransitionError::InvalidTransition {
                from: self.status,
                to: ReminderStatus::Dismissed,
            });
        }
        if let Some(previous) = self.seen_at.or(self.delivered_at) {
            if at < previous {
                return Err(ReminderTransitionError::OutOfOrder {
                    field: "dismissed_at",
                    at,
                    previous,
                });
            }
        }
        self.dismissed_at = Some(at);
        self.status = ReminderStatus::Dismissed;
        Ok(())
    }

    /// Apply a user action and return the activity event it produces.
    pub fn apply(
        &mut self,
        action: ReminderAction,
        at: DateTime<Utc>,
        action_taken: Option<bool>,
    ) -> Result<ActivityEvent, ReminderTransitionError> {
        let kind = match action {
            ReminderAction::Seen => {
                self.mark_seen(at)?;
                ActivityKind::ReminderSeen
            }
            ReminderAction::Dismissed => {
                self.dismiss(at)?;
                ActivityKind::ReminderDismissed
            }
        };
        if let Some(taken) = action_taken {
            self.action_taken = taken;
        }
        Ok(ActivityEvent::new(self.user_id.clone(), kind, at).related_to("reminder", self.id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn reminder_at(scheduled: DateTime<Utc>) -> Reminder {
        Reminder::new("u1", ReminderKind::Motivation, "Keep going", "One step at a time", scheduled)
    }

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn new_reminder_is_pending() {
        let r = reminder_at(base());
        assert_eq!(r.status, ReminderStatus::Pending);
        assert!(r.delivered_at.is_none());
        assert!(!r.action_taken);
    }

    #[test]
    fn deliver_requires_due_time() {
        let mut r = reminder_at(base());
        let err = r.deliver(base() - Duration::minutes(1)).unwrap_err();
        assert!(matches!(err, ReminderTransitionError::NotDue { .. }));
        assert_eq!(r.status, ReminderStatus::Pending);

        r.deliver(base()).unwrap();
        assert_eq!(r.status, ReminderStatus::Delivered);
        assert_eq!(r.delivered_at, Some(base()));
    }

    #[test]
    fn deliver_only_once() {
        let mut r = reminder_at(base());
        r.deliver(base()).unwrap();
        assert!(r.deliver(base() + Duration::minutes(5)).is_err());
        assert_eq!(r.delivered_at, Some(base()));
    }

    #[test]
    fn seen_then_dismissed_is_monotonic() {
        let mut r = reminder_at(base());
        r.deliver(base()).unwrap();
        r.mark_seen(base() + Duration::minutes(3)).unwrap();
        let err = r.dismiss(base() + Duration::minutes(1)).unwrap_err();
        assert!(matches!(err, ReminderTransitionError::OutOfOrder { field: "dismissed_at", .. }));

        r.dismiss(base() + Duration::minutes(4)).unwrap();
        assert_eq!(r.status, ReminderStatus::Dismissed);
        assert!(r.delivered_at <= r.seen_at);
        assert!(r.seen_at <= r.dismissed_at);
    }

    #[test]
    fn seen_cannot_precede_delivery() {
        let mut r = reminder_at(base());
        r.deliver(base() + Duration::minutes(10)).unwrap();
        assert!(r.mark_seen(base()).is_err());
    }

    #[test]
    fn seen_is_set_once() {
        let mut r = reminder_at(base());
        r.mark_seen(base()).unwrap();
        let err = r.mark_seen(base() + Duration::minutes(1)).unwrap_err();
        assert_eq!(
            err,
            ReminderTransitionError::InvalidTransition {
                from: ReminderStatus::Seen,
                to: ReminderStatus::Seen,
            }
        );
    }

    #[test]
    fn dismissed_is_terminal() {
        let mut r = reminder_at(base());
        r.dismiss(base()).unwrap();
        assert!(r.mark_seen(base()).is_err());
        assert!(r.dismiss(base()).is_err());
        assert!(r.deliver(base()).is_err());
    }

    #[test]
    fn apply_returns_activity_side_effect() {
        let mut r = reminder_at(base());
        r.deliver(base()).unwrap();
        let event = r
            .apply(ReminderAction::Seen, base() + Duration::minutes(2), Some(true))
            .unwrap();
        assert_eq!(event.kind, ActivityKind::ReminderSeen);
        assert_eq!(event.related_entity_type.as_deref(), Some("reminder"));
        assert_eq!(event.related_entity_id.as_deref(), Some(r.id.as_str()));
        assert!(r.action_taken);
    }

    #[test]
    fn status_and_kind_parse() {
        assert_eq!("Seen".parse::<ReminderStatus>().unwrap(), ReminderStatus::Seen);
        assert!("archived".parse::<ReminderStatus>().is_err());
        assert_eq!("weekly_review".parse::<ReminderKind>().unwrap(), ReminderKind::WeeklyReview);
        assert_eq!("dismiss".parse::<ReminderAction>().unwrap(), ReminderAction::Dismissed);
    }

    #[test]
    fn is_due_checks_status_and_time() {
        let mut r = reminder_at(base());
        assert!(!r.is_due(base() - Duration::seconds(1)));
        assert!(r.is_due(base()));
        r.deliver(base()).unwrap();
        assert!(!r.is_due(base() + Duration::hours(1)));
    }
}
