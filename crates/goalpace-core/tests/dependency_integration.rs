//! Integration tests for task lock resolution.

use goalpace_core::{dependents_of, group_by_week, is_unlocked, lock_statuses, Task, TaskStatus};

fn task(goal: &str, title: &str, week: u32, day: u32) -> Task {
    Task::new(goal, title, week, day)
}

#[test]
fn test_chain_unlocks_step_by_step() {
    let mut a = task("g1", "A", 1, 1);
    let mut b = task("g1", "B", 1, 2).with_dependencies(vec![a.id.clone()]);
    let c = task("g1", "C", 2, 1).with_dependencies(vec![b.id.clone()]);

    let locked: Vec<bool> = lock_statuses(&[a.clone(), b.clone(), c.clone()])
        .into_iter()
        .map(|v| v.is_locked)
        .collect();
    assert_eq!(locked, vec![false, true, true]);

    a.status = TaskStatus::Completed;
    let locked: Vec<bool> = lock_statuses(&[a.clone(), b.clone(), c.clone()])
        .into_iter()
        .map(|v| v.is_locked)
        .collect();
    assert_eq!(locked, vec![false, false, true]);

    // In progress is not enough.
    b.status = TaskStatus::InProgress;
    assert!(!is_unlocked(&c, &[a.clone(), b.clone(), c.clone()]));

    b.status = TaskStatus::Completed;
    assert!(is_unlocked(&c, &[a, b, c.clone()]));
}

#[test]
fn test_missing_dependency_fails_closed() {
    let t = task("g1", "Orphan", 1, 1).with_dependencies(vec!["gone".to_string()]);
    assert!(!is_unlocked(&t, &[t.clone()]));
}

#[test]
fn test_all_dependencies_required() {
    let mut a = task("g1", "A", 1, 1);
    let b = task("g1", "B", 1, 1);
    let c = task("g1", "C", 1, 2).with_dependencies(vec![a.id.clone(), b.id.clone()]);

    a.status = TaskStatus::Completed;
    assert!(!is_unlocked(&c, &[a, b, c.clone()]));
}

#[test]
fn test_cycle_stays_locked() {
    let mut a = task("g1", "A", 1, 1);
    let mut b = task("g1", "B", 1, 2);
    a.dependencies = vec![b.id.clone()];
    b.dependencies = vec![a.id.clone()];

    let views = lock_statuses(&[a, b]);
    assert!(views.iter().all(|v| v.is_locked));
}

#[test]
fn test_self_dependency_locked_even_when_completed() {
    let mut t = task("g1", "Loop", 1, 1);
    t.dependencies = vec![t.id.clone()];
    t.status = TaskStatus::Completed;
    assert!(!is_unlocked(&t, &[t.clone()]));
}

#[test]
fn test_dependents_and_week_grouping() {
    let a = task("g1", "A", 1, 1);
    let b = task("g1", "B", 2, 1).with_dependencies(vec![a.id.clone()]);
    let c = task("g1", "C", 3, 1).with_dependencies(vec![a.id.clone()]);
    let tasks = vec![a.clone(), b, c];

    let dependents: Vec<&str> = dependents_of(&a.id, &tasks).iter().map(|t| t.title.as_str()).collect();
    assert_eq!(dependents, vec!["B", "C"]);

    let weeks = group_by_week(&lock_statuses(&tasks));
    assert_eq!(weeks.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    assert!(weeks[&2][0].is_locked);
}
