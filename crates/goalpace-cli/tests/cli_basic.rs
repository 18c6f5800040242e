//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary HOME, so the
//! config file and database never touch the real user directory.

use std::process::Command;
use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_goalpace"))
        .args(args)
        .env("HOME", home.path())
        .env_remove("GOALPACE_ENV")
        .env_remove("GOALPACE_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(home: &TempDir, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    stdout
}

/// Id printed on the "... created: <id>" first line.
fn created_id(stdout: &str) -> String {
    stdout
        .lines()
        .next()
        .and_then(|line| line.rsplit(' ').next())
        .expect("missing created line")
        .to_string()
}

#[test]
fn test_goal_create_and_list() {
    let home = TempDir::new().unwrap();
    let out = run_ok(&home, &["goal", "create", "Learn piano", "--weeks", "6"]);
    assert!(out.starts_with("Goal created:"));
    let id = created_id(&out);

    let list = run_ok(&home, &["goal", "list", "--json"]);
    let goals: serde_json::Value = serde_json::from_str(&list).unwrap();
    assert_eq!(goals[0]["id"], id.as_str());
    assert_eq!(goals[0]["duration_weeks"], 6);
}

#[test]
fn test_task_lock_cycle() {
    let home = TempDir::new().unwrap();
    let goal = created_id(&run_ok(&home, &["goal", "create", "Ship app"]));
    let design = created_id(&run_ok(&home, &["task", "add", &goal, "Design"]));
    let build = created_id(&run_ok(
        &home,
        &["task", "add", &goal, "Build", "--day", "2", "--depends-on", &design],
    ));

    let show: serde_json::Value = serde_json::from_str(&run_ok(&home, &["task", "show", &build])).unwrap();
    assert_eq!(show["is_locked"], true);

    let out = run_ok(&home, &["task", "update", &design, "--status", "completed"]);
    assert!(out.contains("Achievement Unlocked!"));

    let show: serde_json::Value = serde_json::from_str(&run_ok(&home, &["task", "show", &build])).unwrap();
    assert_eq!(show["is_locked"], false);

    let progress = run_ok(&home, &["goal", "progress", &goal]);
    assert!(progress.starts_with("1/2 completed (50%)"));
}

#[test]
fn test_goal_update_restarts_schedule() {
    let home = TempDir::new().unwrap();
    let id = created_id(&run_ok(&home, &["goal", "create", "Learn piano", "--weeks", "6"]));

    let out = run_ok(&home, &["goal", "update", &id, "--weeks", "10", "--priority", "high"]);
    assert!(out.starts_with("Goal updated:"));

    let show: serde_json::Value = serde_json::from_str(&run_ok(&home, &["goal", "show", &id])).unwrap();
    assert_eq!(show["goal"]["duration_weeks"], 10);
    assert_eq!(show["goal"]["priority"], "high");
    assert_eq!(show["goal"]["title"], "Learn piano");

    let (_, _, code) = run_cli(&home, &["goal", "update", &id]);
    assert_eq!(code, 1);
    let (_, _, code) = run_cli(&home, &["goal", "update", "missing", "--title", "x"]);
    assert_eq!(code, 1);
}

#[test]
fn test_task_missed_queues_nudge() {
    let home = TempDir::new().unwrap();
    let goal = created_id(&run_ok(&home, &["goal", "create", "Learn guitar"]));
    let task = created_id(&run_ok(&home, &["task", "add", &goal, "Practice chords"]));

    let out = run_ok(&home, &["task", "missed", &task]);
    assert!(out.starts_with("Gentle Nudge"));

    let list = run_ok(&home, &["reminder", "list", "--json"]);
    let reminders: serde_json::Value = serde_json::from_str(&list).unwrap();
    assert_eq!(reminders[0]["kind"], "missed_task");
    assert_eq!(reminders[0]["task_id"], task.as_str());
}

#[test]
fn test_delete_task_with_dependents_fails() {
    let home = TempDir::new().unwrap();
    let goal = created_id(&run_ok(&home, &["goal", "create", "Move house"]));
    let pack = created_id(&run_ok(&home, &["task", "add", &goal, "Pack"]));
    run_ok(&home, &["task", "add", &goal, "Load van", "--depends-on", &pack]);

    let (_, stderr, code) = run_cli(&home, &["task", "delete", &pack]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));
}

#[test]
fn test_unknown_dependency_rejected() {
    let home = TempDir::new().unwrap();
    let goal = created_id(&run_ok(&home, &["goal", "create", "Read more"]));
    let (_, _, code) = run_cli(&home, &["task", "add", &goal, "Chapter 2", "--depends-on", "nope"]);
    assert_eq!(code, 1);
}

#[test]
fn test_reminder_generate_and_list() {
    let home = TempDir::new().unwrap();
    run_ok(&home, &["reminder", "generate"]);
    let list = run_ok(&home, &["reminder", "list", "--json"]);
    let reminders: serde_json::Value = serde_json::from_str(&list).unwrap();
    let reminders = reminders.as_array().unwrap();
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0]["status"], "pending");

    let id = reminders[0]["id"].as_str().unwrap();
    let out = run_ok(&home, &["reminder", "dismiss", id, "--acted"]);
    assert!(out.contains("dismissed"));
    let (_, _, code) = run_cli(&home, &["reminder", "dismiss", id]);
    assert_eq!(code, 1);
}

#[test]
fn test_checkin_only_once_per_day() {
    let home = TempDir::new().unwrap();
    let out = run_ok(&home, &["reminder", "checkin"]);
    assert!(out.starts_with("Daily Check-In"));
    let (_, stderr, code) = run_cli(&home, &["reminder", "checkin"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("already generated"));
}

#[test]
fn test_profile_defaults() {
    let home = TempDir::new().unwrap();
    let out = run_ok(&home, &["profile", "show", "--json"]);
    let profile: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(profile["source"], "default");
    assert_eq!(profile["high_productivity_hours"][0]["start"], 9);

    let insights: serde_json::Value = serde_json::from_str(&run_ok(&home, &["profile", "insights"])).unwrap();
    assert_eq!(insights["engagement"]["total_reminders"], 0);
}

#[test]
fn test_config_get_set() {
    let home = TempDir::new().unwrap();
    assert_eq!(run_ok(&home, &["config", "get", "reminders.frequency"]).trim(), "medium");
    run_ok(&home, &["config", "set", "reminders.frequency", "low"]);
    assert_eq!(run_ok(&home, &["config", "get", "reminders.frequency"]).trim(), "low");

    let (_, _, code) = run_cli(&home, &["config", "set", "reminders.frequency", "sometimes"]);
    assert_eq!(code, 1);
    let (_, _, code) = run_cli(&home, &["config", "get", "no_such_key"]);
    assert_eq!(code, 1);

    let list = run_ok(&home, &["config", "list"]);
    assert!(list.contains("user_id = default_user"));
}

#[test]
fn test_completions() {
    let home = TempDir::new().unwrap();
    let out = run_ok(&home, &["completions", "bash"]);
    assert!(out.contains("goalpace"));
}
