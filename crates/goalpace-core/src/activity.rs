//! User activity log.
//!
//! Activity events are append-only: they are recorded once and never
//! mutated or deleted. The productivity analyzer reads them back in bulk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a user.
pub type UserId = String;

/// Kind tag of an activity event.
///
/// Known kinds serialize to their snake_case tag; anything else is kept
/// verbatim in [`ActivityKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityKind {
    TaskCreated,
    TaskCompleted,
    TaskUpdated,
    TaskMissed,
    GoalCreated,
    GoalUpdated,
    ReminderSeen,
    ReminderDismissed,
    Other(String),
}

impl ActivityKind {
    pub fn as_str(&self) -> &str {
        match self {
            ActivityKind::TaskCreated => "task_created",
            ActivityKind::TaskCompleted => "task_completed",
            ActivityKind::TaskUpdated => "task_updated",
            ActivityKind::TaskMissed => "task_missed",
            ActivityKind::GoalCreated => "goal_created",
            ActivityKind::GoalUpdated => "goal_updated",
            ActivityKind::ReminderSeen => "reminder_seen",
            ActivityKind::ReminderDismissed => "reminder_dismissed",
            ActivityKind::Other(kind) => kind,
        }
    }
}

impl From<&str> for ActivityKind {
    fn from(s: &str) -> Self {
        match s {
            "task_created" => ActivityKind::TaskCreated,
            "task_completed" => ActivityKind::TaskCompleted,
            "task_updated" => ActivityKind::TaskUpdated,
            "task_missed" => ActivityKind::TaskMissed,
            "goal_created" => ActivityKind::GoalCreated,
            "goal_updated" => ActivityKind::GoalUpdated,
            "reminder_seen" => ActivityKind::ReminderSeen,
            "reminder_dismissed" => ActivityKind::ReminderDismissed,
            other => ActivityKind::Other(other.to_string()),
        }
    }
}

impl From<String> for ActivityKind {
    fn from(s: String) -> Self {
        ActivityKind::from(s.as_str())
    }
}

impl From<ActivityKind> for String {
    fn from(kind: ActivityKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recorded user action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityEvent {
    pub id: String,
    pub user_id: UserId,
    pub kind: ActivityKind,
    /// Entity type of the related record ("goal", "task", "reminder")
    pub related_entity_type: Option<String>,
    pub related_entity_id: Option<String>,
    /// Additional free-form context
    pub data: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl ActivityEvent {
    /// Create an event with no related entity.
    pub fn new(user_id: impl Into<UserId>, kind: ActivityKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            kind,
            related_entity_type: None,
            related_entity_id: None,
            data: None,
            timestamp,
        }
    }

    /// Attach the related entity reference.
    pub fn related_to(mut self, entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        self.related_entity_type = Some(entity_type.into());
        self.related_entity_id = Some(entity_id.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn is_completion(&self) -> bool {
        self.kind == ActivityKind::TaskCompleted
    }
}
