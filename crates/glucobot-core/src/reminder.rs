//! Reminder job record handed from the conversation layer to the scheduler.

use chrono::{DateTime, Local};
use uuid::Uuid;

/// A one-shot reminder job.
///
/// Owned by the scheduler queue until it fires, then consumed by exactly one
/// notification loop. Never persisted; a restart forgets all pending jobs.
#[derive(Debug, Clone)]
pub struct ReminderJob {
    /// UUID v4 string, used for logging.
    pub id: String,
    /// Target chat.
    pub chat_id: i64,
    /// Absolute instant at which delivery should begin. May already be in
    /// the past; the scheduler fires such jobs on its next tick.
    pub fire_at: DateTime<Local>,
    /// Flag-registry generation created when this job was scheduled.
    pub generation: u64,
}

impl ReminderJob {
    pub fn new(chat_id: i64, fire_at: DateTime<Local>, generation: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            chat_id,
            fire_at,
            generation,
        }
    }
}
