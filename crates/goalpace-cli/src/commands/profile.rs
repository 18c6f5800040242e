//! Productivity profile commands.

use chrono::Local;
use clap::Subcommand;
use goalpace_core::{HourRange, ProductivityProfile};

use super::{open_companion, print_json, CliResult};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show the stored productivity profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Recompute the profile from the activity log
    Analyze {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Profile, reminder engagement and recommendations
    Insights,
}

pub fn run(action: ProfileAction) -> CliResult {
    let companion = open_companion()?;

    match action {
        ProfileAction::Show { json } => {
            let profile = companion.profile_or_create()?;
            if json {
                return print_json(&profile);
            }
            print_profile(&profile);
        }
        ProfileAction::Analyze { json } => {
            let profile = companion.analyze(&Local::now())?;
            if json {
                return print_json(&profile);
            }
            print_profile(&profile);
        }
        ProfileAction::Insights => {
            print_json(&companion.insights(&Local::now())?)?;
        }
    }
    Ok(())
}

fn ranges(list: &[HourRange]) -> String {
    if list.is_empty() {
        return "-".to_string();
    }
    list.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

fn print_profile(profile: &ProductivityProfile) {
    let source = if profile.is_default() { "default" } else { "observed" };
    println!("Productivity profile ({source})");
    println!("  high productivity: {}", ranges(&profile.high_productivity_hours));
    println!("  low energy:        {}", ranges(&profile.low_energy_hours));
    println!(
        "  activities: {}  completed: {}  missed: {}",
        profile.total_activities, profile.completed_tasks, profile.missed_tasks
    );
    if let Some(avg) = profile.average_response_time_minutes {
        println!("  avg response: {avg:.1} min");
    }
    if !profile.most_active_hours.is_empty() {
        let busiest: Vec<String> = profile
            .most_active_hours
            .iter()
            .map(|(hour, count)| format!("{hour:02}:00 ({count})"))
            .collect();
        println!("  busiest hours: {}", busiest.join(", "));
    }
}
