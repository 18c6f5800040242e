//! Database schema migrations for goalpace.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use indoc::indoc;
use rusqlite::{Connection, Result as SqliteResult};
use tracing::{debug, warn};

use crate::error::DatabaseError;

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> Result<(), DatabaseError> {
    run(conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
}

fn run(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(indoc! {"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );
    "})
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            warn!("failed to read schema_version: {e}");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: goals, tasks, activity log, reminders and profiles.
///
/// Timestamps are RFC 3339 UTC strings with a fixed nanosecond width, so
/// they order correctly as text. Task dependencies are a JSON array of ids.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(indoc! {"
        CREATE TABLE IF NOT EXISTS goals (
            id              TEXT PRIMARY KEY,
            title           TEXT NOT NULL,
            duration_weeks  INTEGER NOT NULL,
            priority        TEXT NOT NULL DEFAULT 'medium',
            intensity       TEXT NOT NULL DEFAULT 'moderate',
            start_date      TEXT NOT NULL,
            end_date        TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id            TEXT PRIMARY KEY,
            goal_id       TEXT NOT NULL REFERENCES goals(id),
            week_number   INTEGER NOT NULL,
            day_number    INTEGER NOT NULL,
            title         TEXT NOT NULL,
            description   TEXT NOT NULL DEFAULT '',
            status        TEXT NOT NULL DEFAULT 'Not Started',
            dependencies  TEXT NOT NULL DEFAULT '[]',
            sort_order    INTEGER NOT NULL DEFAULT 0,
            created_at    TEXT NOT NULL,
            updated_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS activity_logs (
            id                   TEXT PRIMARY KEY,
            user_id              TEXT NOT NULL,
            activity_type        TEXT NOT NULL,
            related_entity_type  TEXT,
            related_entity_id    TEXT,
            data                 TEXT,
            timestamp            TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS reminders (
            id                TEXT PRIMARY KEY,
            user_id           TEXT NOT NULL,
            reminder_type     TEXT NOT NULL,
            goal_id           TEXT,
            task_id           TEXT,
            title             TEXT NOT NULL,
            message           TEXT NOT NULL,
            motivation_level  TEXT NOT NULL DEFAULT 'neutral',
            scheduled_time    TEXT NOT NULL,
            delivered_at      TEXT,
            status            TEXT NOT NULL DEFAULT 'pending',
            seen_at           TEXT,
            dismissed_at      TEXT,
            action_taken      INTEGER NOT NULL DEFAULT 0,
            created_at        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS productivity_profiles (
            user_id                        TEXT PRIMARY KEY,
            high_productivity_hours        TEXT NOT NULL DEFAULT '[]',
            low_energy_hours               TEXT NOT NULL DEFAULT '[]',
            total_activities               INTEGER NOT NULL DEFAULT 0,
            completed_tasks                INTEGER NOT NULL DEFAULT 0,
            missed_tasks                   INTEGER NOT NULL DEFAULT 0,
            average_response_time_minutes  REAL,
            most_active_hours              TEXT NOT NULL DEFAULT '[]',
            source                         TEXT NOT NULL DEFAULT 'default',
            updated_at                     TEXT NOT NULL
        );
    "})?;

    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: indexes for the common query patterns.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(indoc! {"
        CREATE INDEX IF NOT EXISTS idx_tasks_goal ON tasks(goal_id, week_number, sort_order);
        CREATE INDEX IF NOT EXISTS idx_activity_user_time ON activity_logs(user_id, timestamp);
        CREATE INDEX IF NOT EXISTS idx_reminders_user_status ON reminders(user_id, status, scheduled_time);
    "})?;

    set_schema_version(&tx, 2)?;
    tx.commit()?;
    debug!(version = SCHEMA_VERSION, "database schema up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get::<_, i32>(0),
        )
        .unwrap()
            > 0
    }

    #[test]
    fn test_migrate_from_scratch() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        assert_eq!(schema_version(&conn), SCHEMA_VERSION);
        for table in [
            "goals",
            "tasks",
            "activity_logs",
            "reminders",
            "productivity_profiles",
        ] {
            assert!(table_exists(&conn, table), "missing table {table}");
        }
    }

    #[test]
    fn test_migrate_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(schema_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn test_incremental_migration() {
        let conn = Connection::open_in_memory().unwrap();
        run_v1_only(&conn);
        assert_eq!(schema_version(&conn), 1);

        migrate(&conn).unwrap();
        assert_eq!(schema_version(&conn), 2);

        let indexes: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(indexes, 3);
    }

    fn run_v1_only(conn: &Connection) {
        create_schema_version_table(conn).unwrap();
        migrate_v1(conn).unwrap();
    }

    #[test]
    fn task_defaults_apply() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn.execute(
            "INSERT INTO goals (id, title, duration_weeks, start_date, end_date, created_at)
             VALUES ('g1', 'Learn', 4, '2024-01-01T00:00:00Z', '2024-01-29T00:00:00Z', '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO tasks (id, goal_id, week_number, day_number, title, created_at, updated_at)
             VALUES ('t1', 'g1', 1, 1, 'Read', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        let (status, deps): (String, String) = conn
            .query_row("SELECT status, dependencies FROM tasks WHERE id = 't1'", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(status, "Not Started");
        assert_eq!(deps, "[]");

        let priority: String = conn
            .query_row("SELECT priority FROM goals WHERE id = 'g1'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(priority, "medium");
    }
}
