//! Task management commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use goalpace_core::{group_by_week, Task, TaskStatus, TaskUpdate, TaskView};

use super::{open_companion, print_json, split_ids, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task to a goal
    Add {
        /// Goal ID
        goal_id: String,
        /// Task title
        title: String,
        /// Week number (1-based)
        #[arg(long, default_value = "1")]
        week: u32,
        /// Day within the week (1-based)
        #[arg(long, default_value = "1")]
        day: u32,
        /// Task description
        #[arg(long)]
        description: Option<String>,
        /// Comma-separated IDs of tasks that must be completed first
        #[arg(long)]
        depends_on: Option<String>,
    },
    /// List a goal's tasks with lock status, grouped by week
    List {
        /// Goal ID
        goal_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show task details
    Show {
        /// Task ID
        id: String,
    },
    /// Update a task
    Update {
        /// Task ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New status: not_started, in_progress or completed
        #[arg(long)]
        status: Option<TaskStatus>,
        /// Replace dependencies (comma-separated IDs, empty to clear)
        #[arg(long)]
        depends_on: Option<String>,
        /// Move to week
        #[arg(long)]
        week: Option<u32>,
        /// Move to day
        #[arg(long)]
        day: Option<u32>,
    },
    /// Record that a task slipped and queue a gentle nudge for it
    Missed {
        /// Task ID
        id: String,
    },
    /// Delete a task that no other task depends on
    Delete {
        /// Task ID
        id: String,
    },
    /// Set display order of a goal's tasks
    Reorder {
        /// Goal ID
        goal_id: String,
        /// Task IDs in the new order
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

pub fn run(action: TaskAction) -> CliResult {
    let mut companion = open_companion()?;

    match action {
        TaskAction::Add {
            goal_id,
            title,
            week,
            day,
            description,
            depends_on,
        } => {
            if week == 0 || day == 0 {
                return Err("week and day are 1-based".into());
            }
            let mut task = Task::new(goal_id, title, week, day)
                .with_dependencies(depends_on.as_deref().map(split_ids).unwrap_or_default());
            task.description = description.unwrap_or_default();
            companion.add_task(&task)?;
            println!("Task created: {}", task.id);
            print_json(&companion.task_view(&task.id)?)?;
        }
        TaskAction::List { goal_id, json } => {
            let views = companion.task_views(&goal_id)?;
            if json {
                return print_json(&views);
            }
            if views.is_empty() {
                println!("No tasks");
            }
            for (week, tasks) in group_by_week(&views) {
                println!("Week {week}");
                for view in &tasks {
                    print_view(view);
                }
            }
        }
        TaskAction::Show { id } => {
            print_json(&companion.task_view(&id)?)?;
        }
        TaskAction::Update {
            id,
            title,
            description,
            status,
            depends_on,
            week,
            day,
        } => {
            let update = TaskUpdate {
                title,
                description,
                status,
                dependencies: depends_on.as_deref().map(split_ids),
                week_number: week,
                day_number: day,
                ..Default::default()
            };
            if update.is_empty() {
                return Err("nothing to update".into());
            }
            let outcome = companion.update_task(&id, &update, Utc::now())?;
            if let Some(celebration) = outcome.celebration {
                println!("{}\n\n{}\n", celebration.title, celebration.message);
            }
            print_json(&companion.task_view(&outcome.task.id)?)?;
        }
        TaskAction::Missed { id } => {
            let reminder = companion.record_missed_task(&id, Utc::now())?;
            println!("{}\n\n{}", reminder.title, reminder.message);
        }
        TaskAction::Delete { id } => {
            companion.db().delete_task(&id)?;
            println!("Task deleted");
        }
        TaskAction::Reorder { goal_id, ids } => {
            companion.db().reorder_tasks(&goal_id, &ids)?;
            println!("Reordered {} task(s)", ids.len());
        }
    }
    Ok(())
}

fn print_view(view: &TaskView) {
    let lock = if view.is_locked { " [locked]" } else { "" };
    println!(
        "  day {}  {:<12} {}{}  ({})",
        view.task.day_number,
        view.task.status.as_str(),
        view.task.title,
        lock,
        view.task.id
    );
}
