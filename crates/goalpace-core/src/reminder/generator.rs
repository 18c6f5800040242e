//! Reminder generation from goal and task state.

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};

use super::catalog::{MessagePicker, MessageTheme, RandomPicker};
use super::{MotivationLevel, Reminder, ReminderKind};
use crate::task::{Goal, GoalProgress, Task};

/// Not-started tasks needed before the generator nudges the user to start one.
const PENDING_NUDGE_THRESHOLD: usize = 3;

/// Hour (local to the caller's clock) of the weekly review.
const WEEKLY_REVIEW_HOUR: u32 = 18;

/// A goal together with its task progress.
#[derive(Debug, Clone)]
pub struct GoalSnapshot {
    pub goal: Goal,
    pub progress: GoalProgress,
}

/// State the generator reasons about.
#[derive(Debug, Clone, Default)]
pub struct ReminderContext {
    pub goals: Vec<GoalSnapshot>,
    pub not_started_tasks: usize,
    pub completed_this_week: usize,
}

impl ReminderContext {
    pub fn goal_count(&self) -> usize {
        self.goals.len()
    }
}

/// Builds reminders. Messages come from the catalog through `P`.
#[derive(Debug, Clone)]
pub struct ReminderGenerator<P = RandomPicker> {
    picker: P,
}

impl Default for ReminderGenerator<RandomPicker> {
    fn default() -> Self {
        Self::new(RandomPicker::new())
    }
}

impl<P: MessagePicker> ReminderGenerator<P> {
    pub fn new(picker: P) -> Self {
        Self { picker }
    }

    /// Daily check-in; the greeting depends on the hour of `scheduled`.
    pub fn daily_checkin<Tz: TimeZone>(
        &mut self,
        user_id: &str,
        ctx: &ReminderContext,
        scheduled: &DateTime<Tz>,
    ) -> Reminder {
        let greeting = match scheduled.hour() {
            5..=11 => self.picker.pick(MessageTheme::Morning),
            12..=16 => "Good afternoon! Ready to power through?",
            17..=20 => "Good evening! Let's make the most of your time.",
            _ => "Hey there! Late night session?",
        };
        let message = format!(
            "{greeting}\n\nYou have {} active goal(s) and {} task(s) waiting for you.\n\nWhat would you like to focus on right now?",
            ctx.goal_count(),
            ctx.not_started_tasks,
        );

        Reminder::new(
            user_id,
            ReminderKind::DailyCheckin,
            "Daily Check-In",
            message,
            scheduled.with_timezone(&Utc),
        )
        .with_motivation(MotivationLevel::Encouraging)
    }

    /// Gentle nudge for a task that slipped.
    pub fn missed_task(&mut self, user_id: &str, task: &Task, scheduled: DateTime<Utc>) -> Reminder {
        let line = self.picker.pick(MessageTheme::MissedTask);
        let message = format!(
            "{line}\n\nTask: {}\n\nTake your time, and pick it up when you're ready.",
            task.title
        );

        Reminder::new(user_id, ReminderKind::MissedTask, "Gentle Nudge", message, scheduled)
            .for_task(task.goal_id.clone(), task.id.clone())
            .with_motivation(MotivationLevel::Gentle)
    }

    pub fn progress_update(&mut self, user_id: &str, snapshot: &GoalSnapshot, scheduled: DateTime<Utc>) -> Reminder {
        let line = self.picker.pick(MessageTheme::Progress);
        let p = &snapshot.progress;
        let message = format!(
            "{line}\n\nGoal: {}\nProgress: {}/{} tasks ({}%)\n\nKeep that momentum going!",
            snapshot.goal.title, p.completed, p.total, p.percent
        );

        Reminder::new(user_id, ReminderKind::ProgressUpdate, "Progress Update", message, scheduled)
            .for_goal(snapshot.goal.id.clone())
            .with_motivation(MotivationLevel::Positive)
    }

    /// Celebration for a completed task. It is shown immediately, so it is
    /// created already delivered at `at`.
    pub fn celebration(&mut self, user_id: &str, task: &Task, at: DateTime<Utc>) -> Reminder {
        let line = self.picker.pick(MessageTheme::Completion);
        let message = format!(
            "{line}\n\nYou completed: {}\n\nEvery accomplishment is worth celebrating.",
            task.title
        );

        let mut reminder = Reminder::new(user_id, ReminderKind::Celebration, "Achievement Unlocked!", message, at)
            .for_task(task.goal_id.clone(), task.id.clone())
            .with_motivation(MotivationLevel::Positive);
        reminder.status = super::ReminderStatus::Delivered;
        reminder.delivered_at = Some(at);
        reminder
    }

    /// Weekly review, scheduled for the coming Sunday at 18:00 on the
    /// caller's clock (today if it is Sunday).
    pub fn weekly_review<Tz: TimeZone>(&mut self, user_id: &str, ctx: &ReminderContext, now: &DateTime<Tz>) -> Reminder {
        let scheduled = next_weekly_review(now);
        let line = self.picker.pick(MessageTheme::Weekly);
        let message = format!(
            "{line}\n\nThis week, you completed {} task(s).\n\nTake a moment to reflect and plan the week ahead.",
            ctx.completed_this_week
        );

        Reminder::new(
            user_id,
            ReminderKind::WeeklyReview,
            "Weekly Review",
            message,
            scheduled.with_timezone(&Utc),
        )
        .with_motivation(MotivationLevel::Encouraging)
    }

    /// General encouragement with a summary of open work.
    pub fn motivation(&mut self, user_id: &str, ctx: &ReminderContext, scheduled: DateTime<Utc>) -> Reminder {
        let line = self.picker.pick(MessageTheme::Encouragement);
        let mut message = format!("{line}\n\nYou have {} active goal(s).", ctx.goal_count());
        if ctx.not_started_tasks > 0 {
            message.push_str(&format!(
                "\nReady to tackle one of your {} pending task(s)?",
                ctx.not_started_tasks
            ));
        } else {
            message.push_str("\nYou're all caught up. Great work staying on top of your goals!");
        }

        Reminder::new(user_id, ReminderKind::Motivation, "You've Got This!", message, scheduled)
            .with_motivation(MotivationLevel::Encouraging)
    }

    /// Reminders warranted by the current state. Never empty.
    ///
    /// - three or more not-started tasks: a nudge to start one
    /// - the first goal (in the given order) that is at least a quarter but
    ///   not fully complete gets a progress update; failing that, the first
    ///   goal with work in progress gets a "keep going" note; at most one
    ///   goal reminder is produced
    /// - nothing above: general motivation
    pub fn detect_needed(&mut self, user_id: &str, ctx: &ReminderContext, now: DateTime<Utc>) -> Vec<Reminder> {
        let mut reminders = Vec::new();

        if ctx.not_started_tasks >= PENDING_NUDGE_THRESHOLD {
            let line = self.picker.pick(MessageTheme::Encouragement);
            let message = format!(
                "{line}\n\nYou have {} tasks waiting. Pick one and let's get started!",
                ctx.not_started_tasks
            );
            reminders.push(
                Reminder::new(user_id, ReminderKind::Motivation, "Time to Make Progress!", message, now)
                    .with_motivation(MotivationLevel::Encouraging),
            );
        }

        for snapshot in &ctx.goals {
            let p = &snapshot.progress;
            if p.total == 0 {
                continue;
            }
            let quarter_done = p.completed * 4 >= p.total;
            if quarter_done && p.completed < p.total {
                reminders.push(self.progress_update(user_id, snapshot, now));
                break;
            }
            if p.in_progress > 0 {
                let message = format!(
                    "You're making progress on '{}'!\n\nYou have {} task(s) in progress. Keep the momentum going.",
                    snapshot.goal.title, p.in_progress
                );
                reminders.push(
                    Reminder::new(user_id, ReminderKind::ProgressUpdate, "Keep Going!", message, now)
                        .for_goal(snapshot.goal.id.clone())
                        .with_motivation(MotivationLevel::Encouraging),
                );
                break;
            }
        }

        if reminders.is_empty() {
            reminders.push(self.motivation(user_id, ctx, now));
        }
        reminders
    }
}

/// Coming Sunday (or today, on Sunday) at 18:00 in `now`'s time zone.
fn next_weekly_review<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let days_until_sunday = (6 - now.weekday().num_days_from_monday()) % 7;
    let target = now.clone() + Duration::days(days_until_sunday as i64);
    target
        .with_hour(WEEKLY_REVIEW_HOUR)
        .and_then(|t| t.with_minute(0))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::{FirstPicker, ReminderStatus};
    use crate::task::{Task, TaskStatus};
    use chrono::Weekday;

    fn generator() -> ReminderGenerator<FirstPicker> {
        ReminderGenerator::new(FirstPicker)
    }

    fn snapshot(title: &str, statuses: &[TaskStatus]) -> GoalSnapshot {
        let goal = Goal::new(title, 4, "medium", "moderate");
        let tasks: Vec<Task> = statuses
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let mut t = Task::new(goal.id.clone(), format!("task {i}"), 1, 1);
                t.status = *s;
                t
            })
            .collect();
        GoalSnapshot {
            progress: GoalProgress::from_tasks(&tasks),
            goal,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 5, 10, 30, 0).unwrap()
    }

    #[test]
    fn empty_state_yields_motivation() {
        let reminders = generator().detect_needed("u1", &ReminderContext::default(), now());
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].kind, ReminderKind::Motivation);
        assert!(reminders[0].message.contains("all caught up"));
    }

    #[test]
    fn many_pending_tasks_nudge() {
        let ctx = ReminderContext {
            not_started_tasks: 4,
            ..Default::default()
        };
        let reminders = generator().detect_needed("u1", &ctx, now());
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].title, "Time to Make Progress!");
        assert!(reminders[0].message.contains("4 tasks waiting"));
    }

    #[test]
    fn only_first_qualifying_goal_gets_progress_update() {
        use TaskStatus::*;
        let ctx = ReminderContext {
            goals: vec![
                snapshot("untouched", &[NotStarted, NotStarted]),
                snapshot("halfway", &[Completed, NotStarted]),
                snapshot("also halfway", &[Completed, NotStarted]),
            ],
            not_started_tasks: 0,
            completed_this_week: 0,
        };
        let reminders = generator().detect_needed("u1", &ctx, now());
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].kind, ReminderKind::ProgressUpdate);
        assert_eq!(reminders[0].goal_id.as_deref(), Some(ctx.goals[1].goal.id.as_str()));
        assert_eq!(reminders[0].motivation_level, MotivationLevel::Positive);
    }

    #[test]
    fn finished_goal_is_skipped_and_in_progress_encouraged() {
        use TaskStatus::*;
        let ctx = ReminderContext {
            goals: vec![
                snapshot("done", &[Completed, Completed]),
                snapshot("started", &[InProgress, NotStarted, NotStarted, NotStarted, NotStarted]),
            ],
            ..Default::default()
        };
        let reminders = generator().detect_needed("u1", &ctx, now());
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].title, "Keep Going!");
        assert_eq!(reminders[0].motivation_level, MotivationLevel::Encouraging);
    }

    #[test]
    fn daily_checkin_greeting_by_hour() {
        let ctx = ReminderContext::default();
        let at = |h| Utc.with_ymd_and_hms(2024, 6, 5, h, 0, 0).unwrap();
        let mut generator = generator();

        let morning = generator.daily_checkin("u1", &ctx, &at(8));
        assert!(morning.message.starts_with(MessageTheme::Morning.lines()[0]));
        assert!(generator.daily_checkin("u1", &ctx, &at(13)).message.starts_with("Good afternoon"));
        assert!(generator.daily_checkin("u1", &ctx, &at(19)).message.starts_with("Good evening"));
        assert!(generator.daily_checkin("u1", &ctx, &at(23)).message.starts_with("Hey there"));
        assert_eq!(morning.status, ReminderStatus::Pending);
    }

    #[test]
    fn celebration_is_delivered_immediately() {
        let task = Task::new("g1", "Write intro", 1, 1);
        let reminder = generator().celebration("u1", &task, now());
        assert_eq!(reminder.status, ReminderStatus::Delivered);
        assert_eq!(reminder.delivered_at, Some(now()));
        assert_eq!(reminder.task_id.as_deref(), Some(task.id.as_str()));
    }

    #[test]
    fn weekly_review_lands_on_sunday_evening() {
        // 2024-06-05 is a Wednesday
        let reminder = generator().weekly_review("u1", &ReminderContext::default(), &now());
        assert_eq!(reminder.scheduled_time.weekday(), Weekday::Sun);
        assert_eq!(reminder.scheduled_time, Utc.with_ymd_and_hms(2024, 6, 9, 18, 0, 0).unwrap());
    }

    #[test]
    fn weekly_review_on_sunday_is_same_day() {
        let sunday = Utc.with_ymd_and_hms(2024, 6, 9, 7, 0, 0).unwrap();
        let reminder = generator().weekly_review("u1", &ReminderContext::default(), &sunday);
        assert_eq!(reminder.scheduled_time, Utc.with_ymd_and_hms(2024, 6, 9, 18, 0, 0).unwrap());
    }

    #[test]
    fn missed_task_links_goal_and_task() {
        let task = Task::new("g1", "Outline chapter", 2, 3);
        let reminder = generator().missed_task("u1", &task, now());
        assert_eq!(reminder.goal_id.as_deref(), Some("g1"));
        assert_eq!(reminder.motivation_level, MotivationLevel::Gentle);
        assert!(reminder.message.contains("Outline chapter"));
    }
}
