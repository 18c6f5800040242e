pub mod activity;
pub mod config;
pub mod goal;
pub mod profile;
pub mod reminder;
pub mod task;

use goalpace_core::{Companion, Config, Database};
use tracing::debug;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Companion over the on-disk config and database.
pub fn open_companion() -> Result<Companion, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    debug!(user_id = %config.user_id, "companion opened");
    Ok(Companion::new(db, config))
}

/// Split a comma-separated id list, dropping empty entries.
pub fn split_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
