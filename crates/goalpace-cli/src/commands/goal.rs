//! Goal management commands.

use chrono::Utc;
use clap::Subcommand;
use goalpace_core::{Goal, GoalUpdate};

use super::{open_companion, print_json, CliResult};

#[derive(Subcommand)]
pub enum GoalAction {
    /// Create a new goal starting now
    Create {
        /// Goal title
        title: String,
        /// Duration in weeks
        #[arg(long, default_value = "4")]
        weeks: u32,
        /// Priority label
        #[arg(long, default_value = "medium")]
        priority: String,
        /// Intensity label
        #[arg(long, default_value = "moderate")]
        intensity: String,
    },
    /// List goals
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a goal with its progress
    Show {
        /// Goal ID
        id: String,
    },
    /// Update a goal; its schedule restarts today
    Update {
        /// Goal ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New duration in weeks
        #[arg(long)]
        weeks: Option<u32>,
        /// New priority label
        #[arg(long)]
        priority: Option<String>,
        /// New intensity label
        #[arg(long)]
        intensity: Option<String>,
    },
    /// Delete a goal and all of its tasks
    Delete {
        /// Goal ID
        id: String,
    },
    /// Show completion progress for a goal
    Progress {
        /// Goal ID
        id: String,
    },
}

pub fn run(action: GoalAction) -> CliResult {
    let companion = open_companion()?;

    match action {
        GoalAction::Create {
            title,
            weeks,
            priority,
            intensity,
        } => {
            if weeks == 0 {
                return Err("goal must last at least one week".into());
            }
            let goal = Goal::new(title, weeks, priority, intensity);
            companion.create_goal(&goal)?;
            println!("Goal created: {}", goal.id);
            print_json(&goal)?;
        }
        GoalAction::List { json } => {
            let goals = companion.db().list_goals()?;
            if json {
                return print_json(&goals);
            }
            if goals.is_empty() {
                println!("No goals");
            }
            for goal in goals {
                println!(
                    "{}  {}  ({} weeks, {} priority, ends {})",
                    goal.id,
                    goal.title,
                    goal.duration_weeks,
                    goal.priority,
                    goal.end_date.format("%Y-%m-%d")
                );
            }
        }
        GoalAction::Show { id } => {
            let goal = companion.db().require_goal(&id)?;
            let progress = companion.goal_progress(&id)?;
            print_json(&serde_json::json!({
                "goal": goal,
                "progress": progress,
            }))?;
        }
        GoalAction::Update {
            id,
            title,
            weeks,
            priority,
            intensity,
        } => {
            if weeks == Some(0) {
                return Err("goal must last at least one week".into());
            }
            let update = GoalUpdate {
                title,
                duration_weeks: weeks,
                priority,
                intensity,
            };
            if update.is_empty() {
                return Err("nothing to update".into());
            }
            let goal = companion.update_goal(&id, &update, Utc::now())?;
            println!("Goal updated: {}", goal.id);
            print_json(&goal)?;
        }
        GoalAction::Delete { id } => {
            let removed = companion.db().delete_goal(&id)?;
            println!("Goal deleted ({removed} task(s) removed)");
        }
        GoalAction::Progress { id } => {
            let p = companion.goal_progress(&id)?;
            println!(
                "{}/{} completed ({}%), {} in progress, {} not started",
                p.completed, p.total, p.percent, p.in_progress, p.not_started
            );
        }
    }
    Ok(())
}
