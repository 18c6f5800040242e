//! SQLite-based storage for goals, tasks, activity, reminders and profiles.
//!
//! Provides persistent storage for:
//! - Goals and their tasks (with dependency validation)
//! - The append-only activity log
//! - Reminders and their lifecycle state
//! - One productivity profile per user
//!
//! Only single-row writes are atomic; multi-row operations (goal deletion,
//! reordering) are not wrapped in a transaction.

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use indoc::indoc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::{data_dir, migrations};
use crate::activity::{ActivityEvent, ActivityKind};
use crate::error::{CoreError, DatabaseError, Result, ValidationError};
use crate::productivity::{ProductivityProfile, ProfileSource};
use crate::reminder::{Reminder, ReminderKind, ReminderStatus};
use crate::task::{dependents_of, Goal, GoalUpdate, Task, TaskStatus, TaskUpdate};

const GOAL_COLUMNS: &str =
    "id, title, duration_weeks, priority, intensity, start_date, end_date, created_at";

const TASK_COLUMNS: &str = "id, goal_id, week_number, day_number, title, description, status, \
     dependencies, sort_order, created_at, updated_at";

const ACTIVITY_COLUMNS: &str =
    "id, user_id, activity_type, related_entity_type, related_entity_id, data, timestamp";

const REMINDER_COLUMNS: &str = "id, user_id, reminder_type, goal_id, task_id, title, message, \
     motivation_level, scheduled_time, delivered_at, status, seen_at, dismissed_at, action_taken, \
     created_at";

const PROFILE_COLUMNS: &str = "high_productivity_hours, low_energy_hours, total_activities, \
     completed_tasks, missed_tasks, average_response_time_minutes, most_active_hours, source";

/// Fixed-width RFC 3339 so stored timestamps compare correctly as text.
fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn get_ts(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn get_opt_ts(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    row.get::<_, Option<String>>(idx)?
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| conversion_error(idx, e))
        })
        .transpose()
}

fn get_parsed<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|e| conversion_error(idx, e))
}

fn get_json<T: serde::de::DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn source_str(source: ProfileSource) -> &'static str {
    match source {
        ProfileSource::Default => "default",
        ProfileSource::Observed => "observed",
    }
}

fn row_to_goal(row: &Row) -> rusqlite::Result<Goal> {
    Ok(Goal {
        id: row.get(0)?,
        title: row.get(1)?,
        duration_weeks: row.get(2)?,
        priority: row.get(3)?,
        intensity: row.get(4)?,
        start_date: get_ts(row, 5)?,
        end_date: get_ts(row, 6)?,
        created_at: get_ts(row, 7)?,
    })
}

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        goal_id: row.get(1)?,
        week_number: row.get(2)?,
        day_number: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        status: get_parsed::<TaskStatus>(row, 6)?,
        dependencies: get_json(row, 7)?,
        order: row.get(8)?,
        created_at: get_ts(row, 9)?,
        updated_at: get_ts(row, 10)?,
    })
}

fn row_to_activity(row: &Row) -> rusqlite::Result<ActivityEvent> {
    let data = row
        .get::<_, Option<String>>(5)?
        .map(|raw| serde_json::from_str(&raw).map_err(|e| conversion_error(5, e)))
        .transpose()?;
    Ok(ActivityEvent {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: ActivityKind::from(row.get::<_, String>(2)?),
        related_entity_type: row.get(3)?,
        related_entity_id: row.get(4)?,
        data,
        timestamp: get_ts(row, 6)?,
    })
}

fn row_to_reminder(row: &Row) -> rusqlite::Result<Reminder> {
    Ok(Reminder {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: get_parsed::<ReminderKind>(row, 2)?,
        goal_id: row.get(3)?,
        task_id: row.get(4)?,
        title: row.get(5)?,
        message: row.get(6)?,
        motivation_level: get_parsed(row, 7)?,
        scheduled_time: get_ts(row, 8)?,
        delivered_at: get_opt_ts(row, 9)?,
        status: get_parsed::<ReminderStatus>(row, 10)?,
        seen_at: get_opt_ts(row, 11)?,
        dismissed_at: get_opt_ts(row, 12)?,
        action_taken: row.get(13)?,
        created_at: get_ts(row, 14)?,
    })
}

fn row_to_profile(row: &Row) -> rusqlite::Result<ProductivityProfile> {
    let source = match row.get::<_, String>(7)?.as_str() {
        "observed" => ProfileSource::Observed,
        _ => ProfileSource::Default,
    };
    Ok(ProductivityProfile {
        high_productivity_hours: get_json(row, 0)?,
        low_energy_hours: get_json(row, 1)?,
        total_activities: row.get(2)?,
        completed_tasks: row.get(3)?,
        missed_tasks: row.get(4)?,
        average_response_time_minutes: row.get(5)?,
        most_active_hours: get_json(row, 6)?,
        source,
    })
}

/// SQLite database for goalpace state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/goalpace/goalpace.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("goalpace.db");
        Self::open_at(&path)
    }

    /// Open (or create) the database at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self::init(conn)?;
        debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    /// Turn on foreign key enforcement and bring the schema up to date.
    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        migrations::migrate(&conn)?;
        Ok(Self { conn })
    }

    // ── Goals ───────────────────────────────────────────────────────────

    pub fn insert_goal(&self, goal: &Goal) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO goals ({GOAL_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
            params![
                goal.id,
                goal.title,
                goal.duration_weeks,
                goal.priority,
                goal.intensity,
                ts(&goal.start_date),
                ts(&goal.end_date),
                ts(&goal.created_at),
            ],
        )?;
        info!(goal_id = %goal.id, "goal created");
        Ok(())
    }

    pub fn get_goal(&self, id: &str) -> Result<Option<Goal>> {
        let goal = self
            .conn
            .query_row(
                &format!("SELECT {GOAL_COLUMNS} FROM goals WHERE id = ?1"),
                params![id],
                row_to_goal,
            )
            .optional()?;
        Ok(goal)
    }

    /// Like [`Database::get_goal`], but a missing goal is an error.
    pub fn require_goal(&self, id: &str) -> Result<Goal> {
        self.get_goal(id)?
            .ok_or_else(|| CoreError::not_found("Goal", id))
    }

    /// All goals, oldest first.
    pub fn list_goals(&self) -> Result<Vec<Goal>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {GOAL_COLUMNS} FROM goals ORDER BY created_at ASC"))?;
        let goals = stmt
            .query_map([], row_to_goal)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(goals)
    }

    /// Apply a goal update and return the stored goal.
    pub fn update_goal(&self, id: &str, update: &GoalUpdate, now: DateTime<Utc>) -> Result<Goal> {
        let mut goal = self.require_goal(id)?;
        goal.apply(update, now);

        self.conn.execute(
            indoc! {"
                UPDATE goals
                SET title = ?2, duration_weeks = ?3, priority = ?4, intensity = ?5,
                    start_date = ?6, end_date = ?7
                WHERE id = ?1
            "},
            params![
                goal.id,
                goal.title,
                goal.duration_weeks,
                goal.priority,
                goal.intensity,
                ts(&goal.start_date),
                ts(&goal.end_date),
            ],
        )?;
        info!(goal_id = %goal.id, "goal updated");
        Ok(goal)
    }

    /// Delete a goal and every task under it. Returns the number of tasks deleted.
    pub fn delete_goal(&self, id: &str) -> Result<usize> {
        self.require_goal(id)?;
        let tasks = self
            .conn
            .execute("DELETE FROM tasks WHERE goal_id = ?1", params![id])?;
        self.conn.execute("DELETE FROM goals WHERE id = ?1", params![id])?;
        info!(goal_id = %id, tasks, "goal deleted");
        Ok(tasks)
    }

    // ── Tasks ───────────────────────────────────────────────────────────

    fn task_exists(&self, id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn validate_dependencies(&self, task_id: &str, deps: &[String]) -> Result<()> {
        for dep in deps {
            // A task may name itself; it then stays locked forever.
            if dep != task_id && !self.task_exists(dep)? {
                return Err(ValidationError::MissingDependency(dep.clone()).into());
            }
        }
        Ok(())
    }

    /// Insert a task. The goal and every dependency must already exist.
    pub fn insert_task(&self, task: &Task) -> Result<()> {
        self.require_goal(&task.goal_id)?;
        self.validate_dependencies(&task.id, &task.dependencies)?;

        self.conn.execute(
            &format!(
                "INSERT INTO tasks ({TASK_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ),
            params![
                task.id,
                task.goal_id,
                task.week_number,
                task.day_number,
                task.title,
                task.description,
                task.status.as_str(),
                serde_json::to_string(&task.dependencies)?,
                task.order,
                ts(&task.created_at),
                ts(&task.updated_at),
            ],
        )?;
        debug!(task_id = %task.id, goal_id = %task.goal_id, "task created");
        Ok(())
    }

    pub fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let task = self
            .conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id],
                row_to_task,
            )
            .optional()?;
        Ok(task)
    }

    pub fn require_task(&self, id: &str) -> Result<Task> {
        self.get_task(id)?
            .ok_or_else(|| CoreError::not_found("Task", id))
    }

    /// Tasks of one goal, by week then display order.
    pub fn tasks_for_goal(&self, goal_id: &str) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE goal_id = ?1
             ORDER BY week_number ASC, sort_order ASC, created_at ASC"
        ))?;
        let tasks = stmt
            .query_map(params![goal_id], row_to_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    pub fn all_tasks(&self) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY goal_id, week_number, sort_order"
        ))?;
        let tasks = stmt
            .query_map([], row_to_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    pub fn count_tasks_with_status(&self, status: TaskStatus) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE status = ?1",
            params![status.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Tasks completed (last updated while completed) at or after `since`.
    pub fn count_completed_since(&self, since: DateTime<Utc>) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE status = ?1 AND updated_at >= ?2",
            params![TaskStatus::Completed.as_str(), ts(&since)],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Apply a partial update and return the stored task.
    pub fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<Task> {
        let mut task = self.require_task(id)?;
        if let Some(deps) = &update.dependencies {
            self.validate_dependencies(id, deps)?;
        }
        task.apply(update);

        self.conn.execute(
            indoc! {"
                UPDATE tasks
                SET title = ?2, description = ?3, status = ?4, dependencies = ?5,
                    sort_order = ?6, week_number = ?7, day_number = ?8, updated_at = ?9
                WHERE id = ?1
            "},
            params![
                task.id,
                task.title,
                task.description,
                task.status.as_str(),
                serde_json::to_string(&task.dependencies)?,
                task.order,
                task.week_number,
                task.day_number,
                ts(&task.updated_at),
            ],
        )?;
        Ok(task)
    }

    /// Delete a task. Refused while other tasks depend on it.
    pub fn delete_task(&self, id: &str) -> Result<()> {
        self.require_task(id)?;
        let all = self.all_tasks()?;
        let dependents = dependents_of(id, &all);
        if !dependents.is_empty() {
            let ids: Vec<&str> = dependents.iter().map(|t| t.id.as_str()).collect();
            return Err(CoreError::Conflict(format!(
                "task {id} is a dependency of {}",
                ids.join(", ")
            )));
        }
        self.conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Set display order within a goal to the position of each id in `order`.
    pub fn reorder_tasks(&self, goal_id: &str, order: &[String]) -> Result<()> {
        self.require_goal(goal_id)?;
        for task_id in order {
            let task = self.require_task(task_id)?;
            if task.goal_id != goal_id {
                return Err(ValidationError::ForeignTask {
                    task_id: task_id.clone(),
                    goal_id: goal_id.to_string(),
                }
                .into());
            }
        }

        let now = ts(&Utc::now());
        for (position, task_id) in order.iter().enumerate() {
            self.conn.execute(
                "UPDATE tasks SET sort_order = ?1, updated_at = ?2 WHERE id = ?3",
                params![position as i64, now, task_id],
            )?;
        }
        Ok(())
    }

    // ── Activity ────────────────────────────────────────────────────────

    /// Append an activity event and bump the counters of the user's stored
    /// profile, if there is one.
    pub fn append_activity(&self, event: &ActivityEvent) -> Result<()> {
        let data = event.data.as_ref().map(serde_json::to_string).transpose()?;
        self.conn.execute(
            &format!("INSERT INTO activity_logs ({ACTIVITY_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                event.id,
                event.user_id,
                event.kind.as_str(),
                event.related_entity_type,
                event.related_entity_id,
                data,
                ts(&event.timestamp),
            ],
        )?;

        self.conn.execute(
            indoc! {"
                UPDATE productivity_profiles
                SET total_activities = total_activities + 1,
                    completed_tasks = completed_tasks + ?2,
                    missed_tasks = missed_tasks + ?3
                WHERE user_id = ?1
            "},
            params![
                event.user_id,
                (event.kind == ActivityKind::TaskCompleted) as i64,
                (event.kind == ActivityKind::TaskMissed) as i64,
            ],
        )?;
        Ok(())
    }

    /// A user's events at or after `since`, oldest first.
    pub fn activities_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<Vec<ActivityEvent>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activity_logs
             WHERE user_id = ?1 AND timestamp >= ?2
             ORDER BY timestamp ASC"
        ))?;
        let events = stmt
            .query_map(params![user_id, ts(&since)], row_to_activity)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(events)
    }

    /// A user's most recent events, newest first.
    pub fn recent_activities(&self, user_id: &str, limit: usize) -> Result<Vec<ActivityEvent>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activity_logs
             WHERE user_id = ?1
             ORDER BY timestamp DESC
             LIMIT ?2"
        ))?;
        let events = stmt
            .query_map(params![user_id, limit as i64], row_to_activity)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(events)
    }

    // ── Reminders ───────────────────────────────────────────────────────

    pub fn insert_reminder(&self, reminder: &Reminder) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO reminders ({REMINDER_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
            ),
            params![
                reminder.id,
                reminder.user_id,
                reminder.kind.as_str(),
                reminder.goal_id,
                reminder.task_id,
                reminder.title,
                reminder.message,
                reminder.motivation_level.as_str(),
                ts(&reminder.scheduled_time),
                reminder.delivered_at.as_ref().map(ts),
                reminder.status.as_str(),
                reminder.seen_at.as_ref().map(ts),
                reminder.dismissed_at.as_ref().map(ts),
                reminder.action_taken,
                ts(&reminder.created_at),
            ],
        )?;
        debug!(reminder_id = %reminder.id, kind = %reminder.kind, "reminder stored");
        Ok(())
    }

    pub fn get_reminder(&self, id: &str) -> Result<Option<Reminder>> {
        let reminder = self
            .conn
            .query_row(
                &format!("SELECT {REMINDER_COLUMNS} FROM reminders WHERE id = ?1"),
                params![id],
                row_to_reminder,
            )
            .optional()?;
        Ok(reminder)
    }

    pub fn require_reminder(&self, id: &str) -> Result<Reminder> {
        self.get_reminder(id)?
            .ok_or_else(|| CoreError::not_found("Reminder", id))
    }

    /// A user's reminders, latest scheduled first, optionally filtered by status.
    pub fn list_reminders(
        &self,
        user_id: &str,
        status: Option<ReminderStatus>,
        limit: usize,
    ) -> Result<Vec<Reminder>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {REMINDER_COLUMNS} FROM reminders
             WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2)
             ORDER BY scheduled_time DESC, created_at DESC
             LIMIT ?3"
        ))?;
        let reminders = stmt
            .query_map(
                params![user_id, status.map(|s| s.as_str()), limit as i64],
                row_to_reminder,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(reminders)
    }

    /// Pending reminders scheduled at or before `now`, earliest first.
    pub fn due_reminders(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<Reminder>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {REMINDER_COLUMNS} FROM reminders
             WHERE user_id = ?1 AND status = 'pending' AND scheduled_time <= ?2
             ORDER BY scheduled_time ASC"
        ))?;
        let reminders = stmt
            .query_map(params![user_id, ts(&now)], row_to_reminder)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(reminders)
    }

    pub fn count_reminders_with_status(&self, user_id: &str, status: ReminderStatus) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM reminders WHERE user_id = ?1 AND status = ?2",
            params![user_id, status.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Every reminder the user has, regardless of status.
    pub fn count_reminders(&self, user_id: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM reminders WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Reminders the user marked as having led to action.
    pub fn count_acted_reminders(&self, user_id: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM reminders WHERE user_id = ?1 AND action_taken = 1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Persist lifecycle fields of an existing reminder.
    pub fn update_reminder(&self, reminder: &Reminder) -> Result<()> {
        let changed = self.conn.execute(
            indoc! {"
                UPDATE reminders
                SET status = ?2, delivered_at = ?3, seen_at = ?4, dismissed_at = ?5,
                    action_taken = ?6, scheduled_time = ?7
                WHERE id = ?1
            "},
            params![
                reminder.id,
                reminder.status.as_str(),
                reminder.delivered_at.as_ref().map(ts),
                reminder.seen_at.as_ref().map(ts),
                reminder.dismissed_at.as_ref().map(ts),
                reminder.action_taken,
                ts(&reminder.scheduled_time),
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::not_found("Reminder", reminder.id.clone()));
        }
        Ok(())
    }

    pub fn delete_reminder(&self, id: &str) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM reminders WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(CoreError::not_found("Reminder", id));
        }
        Ok(())
    }

    /// Delete a user's reminders, optionally only those with `status`.
    /// Returns the number deleted.
    pub fn clear_reminders(&self, user_id: &str, status: Option<ReminderStatus>) -> Result<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM reminders WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2)",
            params![user_id, status.map(|s| s.as_str())],
        )?;
        Ok(deleted)
    }

    /// Most recently created reminder of `kind` created at or after `since`.
    pub fn latest_reminder_of_kind_since(
        &self,
        user_id: &str,
        kind: ReminderKind,
        since: DateTime<Utc>,
    ) -> Result<Option<Reminder>> {
        let reminder = self
            .conn
            .query_row(
                &format!(
                    "SELECT {REMINDER_COLUMNS} FROM reminders
                     WHERE user_id = ?1 AND reminder_type = ?2 AND created_at >= ?3
                     ORDER BY created_at DESC
                     LIMIT 1"
                ),
                params![user_id, kind.as_str(), ts(&since)],
                row_to_reminder,
            )
            .optional()?;
        Ok(reminder)
    }

    // ── Profiles ────────────────────────────────────────────────────────

    pub fn get_profile(&self, user_id: &str) -> Result<Option<ProductivityProfile>> {
        let profile = self
            .conn
            .query_row(
                &format!("SELECT {PROFILE_COLUMNS} FROM productivity_profiles WHERE user_id = ?1"),
                params![user_id],
                row_to_profile,
            )
            .optional()?;
        Ok(profile)
    }

    /// Store a profile, replacing any previous one wholesale.
    pub fn save_profile(&self, user_id: &str, profile: &ProductivityProfile) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT OR REPLACE INTO productivity_profiles (user_id, {PROFILE_COLUMNS}, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            params![
                user_id,
                serde_json::to_string(&profile.high_productivity_hours)?,
                serde_json::to_string(&profile.low_energy_hours)?,
                profile.total_activities,
                profile.completed_tasks,
                profile.missed_tasks,
                profile.average_response_time_minutes,
                serde_json::to_string(&profile.most_active_hours)?,
                source_str(profile.source),
                ts(&Utc::now()),
            ],
        )?;
        Ok(())
    }
}
