//! Delivery of due reminders through a notifier.

use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::Reminder;
use crate::productivity::ProductivityProfile;

/// Delivery channel for reminders (desktop toast, terminal, log, ...).
pub trait Notifier: Send + Sync {
    /// Unique identifier (e.g. "log", "memory").
    fn name(&self) -> &str;

    /// Show one reminder to the user.
    fn deliver(&self, reminder: &Reminder) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Writes reminders to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    fn deliver(&self, reminder: &Reminder) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!(
            id = %reminder.id,
            kind = %reminder.kind,
            title = %reminder.title,
            "reminder"
        );
        Ok(())
    }
}

/// Collects reminder ids in memory. Can be told to fail every delivery.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    delivered: Mutex<Vec<String>>,
    failing: bool,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            delivered: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    /// Ids of delivered reminders, in delivery order.
    pub fn delivered(&self) -> Vec<String> {
        self.delivered
            .lock()
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }
}

impl Notifier for MemoryNotifier {
    fn name(&self) -> &str {
        "memory"
    }

    fn deliver(&self, reminder: &Reminder) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.failing {
            return Err("notifier unavailable".into());
        }
        self.delivered
            .lock()
            .map_err(|e| e.to_string())?
            .push(reminder.id.clone());
        Ok(())
    }
}

/// Result of one dispatch pass. Reminders that were not due are not listed.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Now in `Delivered` state
    pub delivered: Vec<Reminder>,
    /// Due, but held back because `now` is a low-energy hour
    pub deferred: Vec<Reminder>,
    /// Due, but the notifier failed; still `Pending`
    pub failed: Vec<(Reminder, String)>,
}

impl DispatchOutcome {
    pub fn report(&self) -> DispatchReport {
        DispatchReport {
            delivered: self.delivered.len(),
            deferred: self.deferred.len(),
            failed: self.failed.len(),
        }
    }
}

/// Counts from a dispatch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub delivered: usize,
    pub deferred: usize,
    pub failed: usize,
}

/// Hands due reminders to a notifier.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    /// Hold reminders back during the profile's low-energy hours
    pub respect_low_energy: bool,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self {
            respect_low_energy: true,
        }
    }
}

impl Dispatcher {
    pub fn new(respect_low_energy: bool) -> Self {
        Self { respect_low_energy }
    }

    /// Deliver every due reminder in `reminders`.
    pub fn dispatch<Tz: TimeZone>(
        &self,
        reminders: Vec<Reminder>,
        profile: &ProductivityProfile,
        notifier: &dyn Notifier,
        now: &DateTime<Tz>,
    ) -> DispatchOutcome {
        let at = now.with_timezone(&Utc);
        let due: Vec<Reminder> = reminders.into_iter().filter(|r| r.is_due(at)).collect();
        let mut outcome = DispatchOutcome::default();

        if due.is_empty() {
            return outcome;
        }

        if self.respect_low_energy && !profile.should_notify_now(now) {
            debug!(count = due.len(), "low-energy hour, deferring reminders");
            outcome.deferred = due;
            return outcome;
        }

        for mut reminder in due {
            if let Err(e) = notifier.deliver(&reminder) {
                warn!(id = %reminder.id, notifier = notifier.name(), "delivery failed: {e}");
                outcome.failed.push((reminder, e.to_string()));
                continue;
            }
            match reminder.deliver(at) {
                Ok(()) => outcome.delivered.push(reminder),
                Err(e) => outcome.failed.push((reminder, e.to_string())),
            }
        }

        debug!(
            delivered = outcome.delivered.len(),
            failed = outcome.failed.len(),
            notifier = notifier.name(),
            "dispatch finished"
        );
        outcome
    }
}
