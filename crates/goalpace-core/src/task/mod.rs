//! Goals, tasks and task lock status.
//!
//! A goal is a multi-week objective; its tasks are placed on a week/day and
//! may depend on other tasks of the same goal. Whether a task is actionable
//! is derived on demand by [`is_unlocked`], never stored.

mod dependency;

pub use dependency::{dependents_of, is_unlocked, lock_statuses};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Unique identifier for a goal.
pub type GoalId = String;

/// Unique identifier for a task.
pub type TaskId = String;

/// Completion status of a task.
///
/// Serialized with the human-readable labels used by the persistence layer
/// (`"Not Started"`, `"In Progress"`, `"Completed"`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not Started",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::NotStarted
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    /// Accepts the stored labels as well as the snake_case spellings used on
    /// the command line (`not_started`, `in_progress`, `completed`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Not Started" | "not_started" | "not-started" => Ok(TaskStatus::NotStarted),
            "In Progress" | "in_progress" | "in-progress" => Ok(TaskStatus::InProgress),
            "Completed" | "completed" => Ok(TaskStatus::Completed),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

/// A user-defined multi-week objective.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Goal {
    pub id: GoalId,
    pub title: String,
    pub duration_weeks: u32,
    /// Free-form priority label (e.g. "high", "medium", "low")
    pub priority: String,
    /// Free-form intensity label (e.g. "light", "moderate", "intense")
    pub intensity: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Goal {
    /// Create a goal starting now and ending `duration_weeks` later.
    pub fn new(
        title: impl Into<String>,
        duration_weeks: u32,
        priority: impl Into<String>,
        intensity: impl Into<String>,
    ) -> Self {
        Self::starting_at(title, duration_weeks, priority, intensity, Utc::now())
    }

    /// Create a goal with an explicit start instant.
    pub fn starting_at(
        title: impl Into<String>,
        duration_weeks: u32,
        priority: impl Into<String>,
        intensity: impl Into<String>,
        start: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            duration_weeks,
            priority: priority.into(),
            intensity: intensity.into(),
            start_date: start,
            end_date: start + Duration::weeks(duration_weeks as i64),
            created_at: start,
        }
    }

    /// Replace the editable fields. The schedule restarts at `now` and runs
    /// for the (possibly new) duration.
    pub fn apply(&mut self, update: &GoalUpdate, now: DateTime<Utc>) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(weeks) = update.duration_weeks {
            self.duration_weeks = weeks;
        }
        if let Some(priority) = &update.priority {
            self.priority = priority.clone();
        }
        if let Some(intensity) = &update.intensity {
            self.intensity = intensity.clone();
        }
        self.start_date = now;
        self.end_date = now + Duration::weeks(self.duration_weeks as i64);
    }
}

/// Partial goal update; `None` fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoalUpdate {
    pub title: Option<String>,
    pub duration_weeks: Option<u32>,
    pub priority: Option<String>,
    pub intensity: Option<String>,
}

impl GoalUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.duration_weeks.is_none() && self.priority.is_none() && self.intensity.is_none()
    }
}

/// A unit of work belonging to a goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,
    /// Owning goal
    pub goal_id: GoalId,
    /// Week placement (1-based)
    pub week_number: u32,
    /// Day placement within the week (1-based)
    pub day_number: u32,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    /// Tasks that must be completed first. References, not ownership: an id
    /// may point at a task that is not part of the loaded set.
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
    /// Display order within the week
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a not-started task with no dependencies.
    pub fn new(
        goal_id: impl Into<GoalId>,
        title: impl Into<String>,
        week_number: u32,
        day_number: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            goal_id: goal_id.into(),
            week_number,
            day_number,
            title: title.into(),
            description: String::new(),
            status: TaskStatus::NotStarted,
            dependencies: Vec::new(),
            order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<TaskId>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Apply a partial update. Validation of dependency ids is the
    /// persistence layer's job; this only copies fields.
    pub fn apply(&mut self, update: &TaskUpdate) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(deps) = &update.dependencies {
            self.dependencies = deps.clone();
        }
        if let Some(order) = update.order {
            self.order = order;
        }
        if let Some(week) = update.week_number {
            self.week_number = week;
        }
        if let Some(day) = update.day_number {
            self.day_number = day;
        }
        self.updated_at = Utc::now();
    }
}

/// Partial task update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub dependencies: Option<Vec<TaskId>>,
    pub order: Option<i32>,
    pub week_number: Option<u32>,
    pub day_number: Option<u32>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.dependencies.is_none()
            && self.order.is_none()
            && self.week_number.is_none()
            && self.day_number.is_none()
    }
}

/// Task together with its derived lock status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskView {
    pub task: Task,
    pub is_locked: bool,
}

/// Group task views by week number, preserving input order within a week.
pub fn group_by_week(views: &[TaskView]) -> BTreeMap<u32, Vec<TaskView>> {
    let mut weeks: BTreeMap<u32, Vec<TaskView>> = BTreeMap::new();
    for view in views {
        weeks
            .entry(view.task.week_number)
            .or_default()
            .push(view.clone());
    }
    weeks
}

/// Completion summary for one goal.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoalProgress {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub not_started: usize,
    /// Integer percentage of completed tasks (0 for an empty goal)
    pub percent: u32,
}

impl GoalProgress {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut progress = GoalProgress {
            total: tasks.len(),
            ..Default::default()
        };
        for task in tasks {
            match task.status {
                TaskStatus::Completed => progress.completed += 1,
                TaskStatus::InProgress => progress.in_progress += 1,
                TaskStatus::NotStarted => progress.not_started += 1,
            }
        }
        if progress.total > 0 {
            progress.percent = (progress.completed * 100 / progress.total) as u32;
        }
        progress
    }

    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}
