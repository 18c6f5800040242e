//! Activity log commands.

use chrono::{Local, Utc};
use clap::Subcommand;
use goalpace_core::{ActivityEvent, ActivityKind};

use super::{open_companion, print_json, CliResult};

#[derive(Subcommand)]
pub enum ActivityAction {
    /// Record an activity event now
    Log {
        /// Activity kind (e.g. "task_completed", "task_missed")
        kind: String,
        /// Related entity type ("goal", "task", "reminder")
        #[arg(long, requires = "entity_id")]
        entity_type: Option<String>,
        /// Related entity ID
        #[arg(long, requires = "entity_type")]
        entity_id: Option<String>,
        /// Extra JSON data
        #[arg(long)]
        data: Option<String>,
    },
    /// Show recent activity, newest first
    History {
        /// Look-back window in days
        #[arg(long, default_value = "7")]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: ActivityAction) -> CliResult {
    let companion = open_companion()?;
    let user = companion.config().user_id.clone();

    match action {
        ActivityAction::Log {
            kind,
            entity_type,
            entity_id,
            data,
        } => {
            let mut event = ActivityEvent::new(user, ActivityKind::from(kind), Utc::now());
            if let (Some(entity_type), Some(entity_id)) = (entity_type, entity_id) {
                event = event.related_to(entity_type, entity_id);
            }
            if let Some(raw) = data {
                event = event.with_data(serde_json::from_str(&raw)?);
            }
            companion.log_activity(&event)?;
            println!("Activity logged: {}", event.id);
        }
        ActivityAction::History { days, json } => {
            let events = companion.activity_history(days, Utc::now())?;
            if json {
                return print_json(&events);
            }
            if events.is_empty() {
                println!("No activity in the last {days} day(s)");
            }
            for event in events {
                let related = match (&event.related_entity_type, &event.related_entity_id) {
                    (Some(t), Some(id)) => format!("  {t}:{id}"),
                    _ => String::new(),
                };
                println!(
                    "{}  {}{}",
                    event.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    event.kind,
                    related
                );
            }
        }
    }
    Ok(())
}
