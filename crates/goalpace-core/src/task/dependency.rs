//! Dependency resolution for task lock status.
//!
//! Resolution is a pure function of the task and the sibling set it is
//! evaluated against. Nothing is cached: callers re-run it whenever any
//! status or dependency list in the goal changes.
//!
//! Cycles are not detected. Every task on a dependency cycle stays locked,
//! because none of them can reach `Completed` through its prerequisites.

use super::{Task, TaskStatus, TaskView};

/// Whether every dependency of `task` resolves to a completed sibling.
///
/// - An empty dependency list is always unlocked.
/// - A dependency id missing from `siblings` is unsatisfied (locked), so a
///   partial view of the goal fails closed.
/// - A task listing itself as a dependency is always locked, whatever its
///   own status.
pub fn is_unlocked(task: &Task, siblings: &[Task]) -> bool {
    task.dependencies.iter().all(|dep_id| {
        if *dep_id == task.id {
            return false;
        }
        siblings
            .iter()
            .find(|sibling| sibling.id == *dep_id)
            .is_some_and(|dep| dep.status == TaskStatus::Completed)
    })
}

/// Evaluate lock status for every task of a goal against the whole set.
pub fn lock_statuses(tasks: &[Task]) -> Vec<TaskView> {
    tasks
        .iter()
        .map(|task| TaskView {
            task: task.clone(),
            is_locked: !is_unlocked(task, tasks),
        })
        .collect()
}

/// Tasks that list `task_id` among their dependencies.
pub fn dependents_of<'a>(task_id: &str, tasks: &'a [Task]) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| t.id != task_id && t.dependencies.iter().any(|d| d == task_id))
        .collect()
}
