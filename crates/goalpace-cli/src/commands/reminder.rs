//! Reminder commands.

use chrono::{Local, Utc};
use clap::Subcommand;
use goalpace_core::{LogNotifier, Reminder, ReminderAction as Action, ReminderStatus};

use super::{open_companion, print_json, CliResult};

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Next optimal reminder time for the current profile
    Next,
    /// Whether now is a good time for a reminder
    Now,
    /// Generate the reminders the current state calls for
    Generate,
    /// Create today's check-in
    Checkin,
    /// Schedule the weekly review
    Weekly,
    /// List reminders, latest scheduled first
    List {
        /// Filter by status (pending, delivered, seen, dismissed)
        #[arg(long)]
        status: Option<ReminderStatus>,
        /// Maximum number of reminders
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Deliver due reminders to the log
    Dispatch,
    /// Mark a reminder as seen
    Seen {
        /// Reminder ID
        id: String,
        /// Record that the reminder led to action
        #[arg(long)]
        acted: bool,
    },
    /// Dismiss a reminder
    Dismiss {
        /// Reminder ID
        id: String,
        /// Record that the reminder led to action
        #[arg(long)]
        acted: bool,
    },
    /// Delete a reminder
    Delete {
        /// Reminder ID
        id: String,
    },
    /// Delete reminders, optionally only those with a given status
    Clear {
        #[arg(long)]
        status: Option<ReminderStatus>,
    },
}

pub fn run(action: ReminderAction) -> CliResult {
    let mut companion = open_companion()?;
    let user = companion.config().user_id.clone();

    match action {
        ReminderAction::Next => {
            let next = companion.profile_or_create()?.next_optimal_time(&Local::now());
            println!("{}", next.to_rfc3339());
        }
        ReminderAction::Now => {
            let ok = companion.profile_or_create()?.should_notify_now(&Local::now());
            println!("{}", if ok { "yes" } else { "no (low-energy hour)" });
        }
        ReminderAction::Generate => {
            let reminders = companion.generate_reminders(Utc::now())?;
            if reminders.is_empty() {
                println!("Pending queue is full, nothing generated");
            }
            for reminder in &reminders {
                print_reminder(reminder);
            }
        }
        ReminderAction::Checkin => {
            let reminder = companion.daily_checkin(&Local::now())?;
            println!("{}\n\n{}", reminder.title, reminder.message);
        }
        ReminderAction::Weekly => {
            let reminder = companion.schedule_weekly_review(&Local::now())?;
            print_reminder(&reminder);
        }
        ReminderAction::List { status, limit, json } => {
            let reminders = companion.db().list_reminders(&user, status, limit)?;
            if json {
                return print_json(&reminders);
            }
            if reminders.is_empty() {
                println!("No reminders");
            }
            for reminder in &reminders {
                print_reminder(reminder);
            }
        }
        ReminderAction::Dispatch => {
            let report = companion.dispatch_due(&LogNotifier, &Local::now())?;
            println!(
                "delivered {}, deferred {}, failed {}",
                report.delivered, report.deferred, report.failed
            );
        }
        ReminderAction::Seen { id, acted } => {
            let reminder = companion.update_reminder_status(&id, Action::Seen, acted.then_some(true), Utc::now())?;
            println!("Reminder {} is now {}", reminder.id, reminder.status);
        }
        ReminderAction::Dismiss { id, acted } => {
            let reminder =
                companion.update_reminder_status(&id, Action::Dismissed, acted.then_some(true), Utc::now())?;
            println!("Reminder {} is now {}", reminder.id, reminder.status);
        }
        ReminderAction::Delete { id } => {
            companion.db().delete_reminder(&id)?;
            println!("Reminder deleted");
        }
        ReminderAction::Clear { status } => {
            let removed = companion.db().clear_reminders(&user, status)?;
            println!("Removed {removed} reminder(s)");
        }
    }
    Ok(())
}

fn print_reminder(reminder: &Reminder) {
    println!(
        "{}  {:<9} {:<15} {}  ({})",
        reminder.scheduled_time.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
        reminder.status.as_str(),
        reminder.kind.as_str(),
        reminder.title,
        reminder.id
    );
}
