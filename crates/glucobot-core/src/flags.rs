//! Keyed liveness flags for running notification loops.
//!
//! The registry is the only state shared across tasks: the dispatcher
//! activates and deactivates entries, the notification loops poll and
//! retire them. Keys are chat ids; absence means inactive.
//!
//! Every activation carries a fresh generation, so a newly scheduled
//! reminder supersedes whatever loop is still serving the chat: the old
//! loop's next poll fails the generation check and it exits without
//! touching the newer entry.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct FlagEntry {
    generation: u64,
    active: bool,
}

/// Keyed store of per-chat notification liveness flags.
#[derive(Debug, Default)]
pub struct NotifyFlags {
    entries: DashMap<i64, FlagEntry>,
    next_generation: AtomicU64,
}

impl NotifyFlags {
    /// Mark `chat_id` active and return the generation token for the loop
    /// that will serve it. Any earlier generation for this chat goes stale.
    pub fn activate(&self, chat_id: i64) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        self.entries.insert(
            chat_id,
            FlagEntry {
                generation,
                active: true,
            },
        );
        debug!(chat_id, generation, "notify flag activated");
        generation
    }

    /// Clear the active bit so a running loop stops at its next poll.
    /// No-op when the chat has no entry.
    pub fn deactivate(&self, chat_id: i64) {
        if let Some(mut entry) = self.entries.get_mut(&chat_id) {
            entry.active = false;
            debug!(chat_id, "notify flag deactivated");
        }
    }

    /// True when the chat's entry exists, is active, and matches `generation`.
    pub fn is_live(&self, chat_id: i64, generation: u64) -> bool {
        self.entries
            .get(&chat_id)
            .map(|entry| entry.active && entry.generation == generation)
            .unwrap_or(false)
    }

    /// True when the chat has any active entry.
    pub fn is_active(&self, chat_id: i64) -> bool {
        self.entries
            .get(&chat_id)
            .map(|entry| entry.active)
            .unwrap_or(false)
    }

    /// Remove the chat's entry if it still belongs to `generation`.
    /// Idempotent; a stale loop never removes a newer entry.
    pub fn retire(&self, chat_id: i64, generation: u64) {
        self.entries
            .remove_if(&chat_id, |_, entry| entry.generation == generation);
    }
}
