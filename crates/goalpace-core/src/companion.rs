//! Service layer tying configuration, storage and the analysis components.
//!
//! `Companion` is what the CLI talks to. Every method that depends on the
//! current time takes the caller's clock explicitly, so hours are always
//! interpreted in the caller's time zone.

use chrono::{DateTime, Duration, TimeZone, Utc};
use tracing::{debug, info};

use crate::activity::{ActivityEvent, ActivityKind};
use crate::error::{CoreError, Result};
use crate::insights::{Engagement, Insights};
use crate::productivity::{ProductivityProfile, ResponseTimes};
use crate::reminder::{
    DispatchReport, GoalSnapshot, MessagePicker, Notifier, RandomPicker, Reminder, ReminderAction,
    ReminderContext, ReminderGenerator, ReminderKind, ReminderStatus,
};
use crate::storage::{Config, Database};
use crate::task::{
    is_unlocked, lock_statuses, Goal, GoalProgress, GoalUpdate, Task, TaskStatus, TaskUpdate, TaskView,
};

/// Most recent reminders sampled for response times.
const RESPONSE_SAMPLE_LIMIT: usize = 1000;

/// Result of a task update.
#[derive(Debug, Clone)]
pub struct TaskUpdateOutcome {
    pub task: Task,
    /// Created when the update completed the task
    pub celebration: Option<Reminder>,
}

pub struct Companion<P: MessagePicker = RandomPicker> {
    db: Database,
    config: Config,
    generator: ReminderGenerator<P>,
}

impl Companion<RandomPicker> {
    pub fn new(db: Database, config: Config) -> Self {
        Self::with_generator(db, config, ReminderGenerator::default())
    }
}

impl<P: MessagePicker> Companion<P> {
    pub fn with_generator(db: Database, config: Config, generator: ReminderGenerator<P>) -> Self {
        Self {
            db,
            config,
            generator,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn user(&self) -> &str {
        &self.config.user_id
    }

    fn log(&self, kind: ActivityKind, entity_type: &str, entity_id: &str, at: DateTime<Utc>) -> Result<()> {
        let event = ActivityEvent::new(self.user(), kind, at).related_to(entity_type, entity_id);
        self.db.append_activity(&event)
    }

    // ── Goals and tasks ─────────────────────────────────────────────────

    pub fn create_goal(&self, goal: &Goal) -> Result<()> {
        self.db.insert_goal(goal)?;
        self.log(ActivityKind::GoalCreated, "goal", &goal.id, goal.created_at)
    }

    /// Update a goal; its schedule restarts at `now`.
    pub fn update_goal(&self, goal_id: &str, update: &GoalUpdate, now: DateTime<Utc>) -> Result<Goal> {
        let goal = self.db.update_goal(goal_id, update, now)?;
        self.log(ActivityKind::GoalUpdated, "goal", &goal.id, now)?;
        Ok(goal)
    }

    pub fn add_task(&self, task: &Task) -> Result<()> {
        self.db.insert_task(task)?;
        self.log(ActivityKind::TaskCreated, "task", &task.id, task.created_at)
    }

    /// Tasks of a goal with their lock status, re-evaluated against the
    /// goal's current task set.
    pub fn task_views(&self, goal_id: &str) -> Result<Vec<TaskView>> {
        self.db.require_goal(goal_id)?;
        Ok(lock_statuses(&self.db.tasks_for_goal(goal_id)?))
    }

    pub fn task_view(&self, task_id: &str) -> Result<TaskView> {
        let task = self.db.require_task(task_id)?;
        let siblings = self.db.tasks_for_goal(&task.goal_id)?;
        let is_locked = !is_unlocked(&task, &siblings);
        Ok(TaskView { task, is_locked })
    }

    pub fn goal_progress(&self, goal_id: &str) -> Result<GoalProgress> {
        self.db.require_goal(goal_id)?;
        Ok(GoalProgress::from_tasks(&self.db.tasks_for_goal(goal_id)?))
    }

    /// Update a task and log the change. Completing a task also records a
    /// celebration reminder, already delivered.
    pub fn update_task(&mut self, task_id: &str, update: &TaskUpdate, now: DateTime<Utc>) -> Result<TaskUpdateOutcome> {
        let before = self.db.require_task(task_id)?;
        let task = self.db.update_task(task_id, update)?;

        let completed_now = !before.is_completed() && task.is_completed();
        if !completed_now {
            self.log(ActivityKind::TaskUpdated, "task", &task.id, now)?;
            return Ok(TaskUpdateOutcome { task, celebration: None });
        }

        self.log(ActivityKind::TaskCompleted, "task", &task.id, now)?;
        let celebration = self.generator.celebration(&self.config.user_id, &task, now);
        self.db.insert_reminder(&celebration)?;
        info!(task_id = %task.id, "task completed");
        Ok(TaskUpdateOutcome {
            task,
            celebration: Some(celebration),
        })
    }

    /// Record that a task slipped and queue a gentle nudge for it. The nudge
    /// is due at `now` and, like any generated reminder, waits for dispatch.
    pub fn record_missed_task(&mut self, task_id: &str, now: DateTime<Utc>) -> Result<Reminder> {
        let task = self.db.require_task(task_id)?;
        if task.is_completed() {
            return Err(CoreError::Conflict(format!("task {task_id} is already completed")));
        }
        self.log(ActivityKind::TaskMissed, "task", &task.id, now)?;
        let reminder = self.generator.missed_task(&self.config.user_id, &task, now);
        self.db.insert_reminder(&reminder)?;
        info!(task_id = %task.id, "missed task recorded");
        Ok(reminder)
    }

    // ── Activity ────────────────────────────────────────────────────────

    pub fn log_activity(&self, event: &ActivityEvent) -> Result<()> {
        self.db.append_activity(event)
    }

    /// The user's events from the last `days` days, newest first.
    pub fn activity_history(&self, days: u32, now: DateTime<Utc>) -> Result<Vec<ActivityEvent>> {
        let mut events = self
            .db
            .activities_since(self.user(), now - Duration::days(days as i64))?;
        events.reverse();
        Ok(events)
    }

    // ── Productivity ────────────────────────────────────────────────────

    /// Profile from the activity log plus the reminder sample its response
    /// times came from. Nothing is stored.
    fn observe<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<(ProductivityProfile, Vec<Reminder>)> {
        let analyzer = self.config.analyzer();
        let events = self
            .db
            .activities_since(self.user(), analyzer.bucketizer.cutoff(now))?;
        let mut profile = analyzer.analyze(&events, now);

        let recent = self.db.list_reminders(self.user(), None, RESPONSE_SAMPLE_LIMIT)?;
        profile.average_response_time_minutes = ResponseTimes::from_reminders(&recent).average;
        debug!(events = events.len(), reminders = recent.len(), "activity analyzed");
        Ok((profile, recent))
    }

    /// Recompute the user's profile from their activity log and store it,
    /// replacing the previous one.
    pub fn analyze<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<ProductivityProfile> {
        let (profile, _) = self.observe(now)?;
        self.db.save_profile(self.user(), &profile)?;
        info!(user_id = %self.user(), source = ?profile.source, "productivity profile updated");
        Ok(profile)
    }

    /// Stored profile, creating the default one on first use.
    pub fn profile_or_create(&self) -> Result<ProductivityProfile> {
        if let Some(profile) = self.db.get_profile(self.user())? {
            return Ok(profile);
        }
        let profile = ProductivityProfile::default_profile();
        self.db.save_profile(self.user(), &profile)?;
        debug!(user_id = %self.user(), "created default productivity profile");
        Ok(profile)
    }

    /// Fresh analysis plus engagement metrics and recommendations. Read
    /// only: the stored profile is left as it is.
    pub fn insights<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<Insights> {
        let (profile, recent) = self.observe(now)?;
        let engagement = Engagement::from_counts(
            self.db.count_reminders(self.user())?,
            self.db.count_acted_reminders(self.user())?,
        );
        Ok(Insights::build(profile, engagement, &recent, now))
    }

    // ── Reminders ───────────────────────────────────────────────────────

    fn reminder_context(&self, now: DateTime<Utc>) -> Result<ReminderContext> {
        let goals = self
            .db
            .list_goals()?
            .into_iter()
            .map(|goal| {
                let progress = GoalProgress::from_tasks(&self.db.tasks_for_goal(&goal.id)?);
                Ok(GoalSnapshot { goal, progress })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ReminderContext {
            goals,
            not_started_tasks: self.db.count_tasks_with_status(TaskStatus::NotStarted)?,
            completed_this_week: self.db.count_completed_since(now - Duration::days(7))?,
        })
    }

    /// Create today's check-in, delivered immediately. Refused while a
    /// previous check-in is younger than the configured cooldown.
    pub fn daily_checkin<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Result<Reminder> {
        let at = now.with_timezone(&Utc);
        let cooldown = Duration::hours(self.config.reminders.checkin_cooldown_hours as i64);
        if self
            .db
            .latest_reminder_of_kind_since(self.user(), ReminderKind::DailyCheckin, at - cooldown)?
            .is_some()
        {
            return Err(CoreError::Conflict(
                "Daily check-in already generated. Come back tomorrow!".to_string(),
            ));
        }

        let ctx = self.reminder_context(at)?;
        let mut reminder = self.generator.daily_checkin(&self.config.user_id, &ctx, now);
        reminder.created_at = at;
        reminder.deliver(at)?;
        self.db.insert_reminder(&reminder)?;
        Ok(reminder)
    }

    /// Store the reminders the current state calls for, up to the pending
    /// queue cap of the configured frequency.
    pub fn generate_reminders(&mut self, now: DateTime<Utc>) -> Result<Vec<Reminder>> {
        let cap = self.config.reminders.frequency.max_pending();
        let pending = self
            .db
            .count_reminders_with_status(self.user(), ReminderStatus::Pending)?;
        if pending >= cap {
            debug!(pending, cap, "pending queue full, not generating reminders");
            return Ok(Vec::new());
        }

        let ctx = self.reminder_context(now)?;
        let mut reminders = self.generator.detect_needed(&self.config.user_id, &ctx, now);
        reminders.truncate(cap - pending);
        for reminder in &reminders {
            self.db.insert_reminder(reminder)?;
        }
        info!(count = reminders.len(), "reminders generated");
        Ok(reminders)
    }

    /// Schedule the weekly review for the coming Sunday evening.
    pub fn schedule_weekly_review<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Result<Reminder> {
        let ctx = self.reminder_context(now.with_timezone(&Utc))?;
        let reminder = self.generator.weekly_review(&self.config.user_id, &ctx, now);
        self.db.insert_reminder(&reminder)?;
        Ok(reminder)
    }

    /// Apply a user action to a reminder, store it and log the matching
    /// activity.
    pub fn update_reminder_status(
        &self,
        reminder_id: &str,
        action: ReminderAction,
        action_taken: Option<bool>,
        now: DateTime<Utc>,
    ) -> Result<Reminder> {
        let mut reminder = self.db.require_reminder(reminder_id)?;
        let event = reminder.apply(action, now, action_taken)?;
        self.db.update_reminder(&reminder)?;
        self.db.append_activity(&event)?;
        Ok(reminder)
    }

    /// Deliver due reminders through `notifier` and store the new states.
    pub fn dispatch_due<Tz: TimeZone>(&self, notifier: &dyn Notifier, now: &DateTime<Tz>) -> Result<DispatchReport> {
        let due = self.db.due_reminders(self.user(), now.with_timezone(&Utc))?;
        let profile = self.profile_or_create()?;
        let outcome = self.config.dispatcher().dispatch(due, &profile, notifier, now);

        for reminder in &outcome.delivered {
            self.db.update_reminder(reminder)?;
        }
        let report = outcome.report();
        info!(
            delivered = report.delivered,
            deferred = report.deferred,
            failed = report.failed,
            "reminders dispatched"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::{FirstPicker, MemoryNotifier};

    fn companion() -> Companion<FirstPicker> {
        Companion::with_generator(
            Database::open_memory().unwrap(),
            Config::default(),
            ReminderGenerator::new(FirstPicker),
        )
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 5, 12, 0, 0).unwrap()
    }

    #[test]
    fn creating_goal_and_task_logs_activity() {
        let c = companion();
        let goal = Goal::new("Run a 10k", 6, "high", "moderate");
        c.create_goal(&goal).unwrap();
        c.add_task(&Task::new(goal.id.clone(), "Buy shoes", 1, 1)).unwrap();

        let history = c.activity_history(1, Utc::now() + Duration::minutes(1)).unwrap();
        let kinds: Vec<ActivityKind> = history.into_iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&ActivityKind::GoalCreated));
        assert!(kinds.contains(&ActivityKind::TaskCreated));
    }

    #[test]
    fn completing_task_unlocks_dependent_and_celebrates() {
        let mut c = companion();
        let goal = Goal::new("Write a book", 8, "high", "intense");
        c.create_goal(&goal).unwrap();
        let outline = Task::new(goal.id.clone(), "Outline", 1, 1);
        let draft = Task::new(goal.id.clone(), "Draft", 1, 2).with_dependencies(vec![outline.id.clone()]);
        c.add_task(&outline).unwrap();
        c.add_task(&draft).unwrap();

        assert!(c.task_view(&draft.id).unwrap().is_locked);

        let outcome = c
            .update_task(
                &outline.id,
                &TaskUpdate {
                    status: Some(TaskStatus::Completed),
                    ..Default::default()
                },
                noon(),
            )
            .unwrap();
        let celebration = outcome.celebration.unwrap();
        assert_eq!(celebration.status, ReminderStatus::Delivered);
        assert!(!c.task_view(&draft.id).unwrap().is_locked);

        // Completing again is an ordinary update.
        let again = c
            .update_task(
                &outline.id,
                &TaskUpdate {
                    status: Some(TaskStatus::Completed),
                    ..Default::default()
                },
                noon(),
            )
            .unwrap();
        assert!(again.celebration.is_none());
    }

    #[test]
    fn updating_goal_logs_activity() {
        let c = companion();
        let goal = Goal::starting_at("Run a 10k", 6, "high", "moderate", noon() - Duration::weeks(2));
        c.create_goal(&goal).unwrap();

        let update = GoalUpdate {
            title: Some("Run a half marathon".into()),
            duration_weeks: Some(12),
            ..Default::default()
        };
        let updated = c.update_goal(&goal.id, &update, noon()).unwrap();
        assert_eq!(updated.start_date, noon());
        assert_eq!(updated.end_date, noon() + Duration::weeks(12));

        let history = c.activity_history(1, noon()).unwrap();
        assert_eq!(history[0].kind, ActivityKind::GoalUpdated);
        assert_eq!(history[0].related_entity_id.as_deref(), Some(goal.id.as_str()));
        assert!(c.update_goal("missing", &update, noon()).is_err());
    }

    #[test]
    fn missed_task_queues_nudge_and_counts() {
        let mut c = companion();
        c.profile_or_create().unwrap();
        let goal = Goal::new("Learn guitar", 4, "medium", "light");
        c.create_goal(&goal).unwrap();
        let task = Task::new(goal.id.clone(), "Practice chords", 1, 1);
        c.add_task(&task).unwrap();

        let nudge = c.record_missed_task(&task.id, noon()).unwrap();
        assert_eq!(nudge.kind, ReminderKind::MissedTask);
        assert_eq!(nudge.task_id.as_deref(), Some(task.id.as_str()));
        assert_eq!(nudge.status, ReminderStatus::Pending);
        assert_eq!(c.db().require_reminder(&nudge.id).unwrap(), nudge);
        assert_eq!(c.db().get_profile("default_user").unwrap().unwrap().missed_tasks, 1);

        c.update_task(
            &task.id,
            &TaskUpdate {
                status: Some(TaskStatus::Completed),
                ..Default::default()
            },
            noon(),
        )
        .unwrap();
        assert!(matches!(c.record_missed_task(&task.id, noon()), Err(CoreError::Conflict(_))));
    }

    #[test]
    fn daily_checkin_respects_cooldown() {
        let mut c = companion();
        let first = c.daily_checkin(&noon()).unwrap();
        assert_eq!(first.status, ReminderStatus::Delivered);
        assert!(matches!(
            c.daily_checkin(&(noon() + Duration::hours(23))),
            Err(CoreError::Conflict(_))
        ));
        assert!(c.daily_checkin(&(noon() + Duration::hours(25))).is_ok());
    }

    #[test]
    fn generate_respects_pending_cap() {
        let mut c = companion();
        // Medium frequency allows three pending reminders.
        let mut total = 0;
        for _ in 0..5 {
            total += c.generate_reminders(noon()).unwrap().len();
        }
        assert_eq!(total, 3);
        assert!(c.generate_reminders(noon()).unwrap().is_empty());
    }

    #[test]
    fn reminder_status_update_logs_activity() {
        let mut c = companion();
        let reminder = c.generate_reminders(noon()).unwrap().remove(0);
        let seen = c
            .update_reminder_status(&reminder.id, ReminderAction::Seen, Some(true), noon() + Duration::minutes(3))
            .unwrap();
        assert_eq!(seen.status, ReminderStatus::Seen);
        assert!(seen.action_taken);

        let history = c.activity_history(1, noon() + Duration::minutes(5)).unwrap();
        assert_eq!(history[0].kind, ActivityKind::ReminderSeen);
        assert_eq!(history[0].related_entity_id.as_deref(), Some(reminder.id.as_str()));

        assert!(c
            .update_reminder_status(&reminder.id, ReminderAction::Seen, None, noon() + Duration::minutes(4))
            .is_err());
    }

    #[test]
    fn dispatch_delivers_and_persists() {
        let mut c = companion();
        let generated = c.generate_reminders(noon()).unwrap();
        let notifier = MemoryNotifier::new();

        let report = c.dispatch_due(&notifier, &(noon() + Duration::minutes(1))).unwrap();
        assert_eq!(report.delivered, generated.len());
        let stored = c.db().require_reminder(&generated[0].id).unwrap();
        assert_eq!(stored.status, ReminderStatus::Delivered);

        let again = c.dispatch_due(&notifier, &(noon() + Duration::minutes(2))).unwrap();
        assert_eq!(again, DispatchReport::default());
    }

    #[test]
    fn dispatch_defers_in_low_energy_hours() {
        let mut c = companion();
        let night = Utc.with_ymd_and_hms(2024, 6, 5, 2, 0, 0).unwrap();
        c.generate_reminders(night).unwrap();
        let report = c.dispatch_due(&MemoryNotifier::new(), &night).unwrap();
        assert_eq!(report.delivered, 0);
        assert_eq!(report.deferred, 1);
    }

    #[test]
    fn analyze_persists_profile() {
        let c = companion();
        assert!(c.profile_or_create().unwrap().is_default());

        let now = noon();
        for i in 0..12 {
            let kind = if i % 2 == 0 { ActivityKind::TaskCompleted } else { ActivityKind::TaskCreated };
            c.log_activity(&ActivityEvent::new("default_user", kind, now - Duration::hours(1)))
                .unwrap();
        }
        let profile = c.analyze(&now).unwrap();
        assert!(!profile.is_default());
        assert_eq!(c.db().get_profile("default_user").unwrap(), Some(profile));
    }

    #[test]
    fn insights_include_engagement() {
        let mut c = companion();
        let r = c.generate_reminders(noon()).unwrap().remove(0);
        c.update_reminder_status(&r.id, ReminderAction::Dismissed, Some(true), noon()).unwrap();
        let insights = c.insights(&noon()).unwrap();
        assert_eq!(insights.engagement.total_reminders, 1);
        assert_eq!(insights.engagement.engagement_rate, 100.0);
    }

    #[test]
    fn insights_leave_stored_profile_alone() {
        let c = companion();
        let now = noon();
        for _ in 0..12 {
            c.log_activity(&ActivityEvent::new("default_user", ActivityKind::TaskCompleted, now - Duration::hours(2)))
                .unwrap();
        }
        let insights = c.insights(&now).unwrap();
        assert!(!insights.profile.is_default());
        assert!(c.db().get_profile("default_user").unwrap().is_none());

        let stored = c.profile_or_create().unwrap();
        c.insights(&now).unwrap();
        assert_eq!(c.db().get_profile("default_user").unwrap(), Some(stored));
    }

    #[test]
    fn weekly_review_is_pending() {
        let mut c = companion();
        let review = c.schedule_weekly_review(&noon()).unwrap();
        assert_eq!(review.kind, ReminderKind::WeeklyReview);
        assert_eq!(review.status, ReminderStatus::Pending);
    }
}
