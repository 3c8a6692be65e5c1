//! Reminder delivery: receives fired jobs and runs the bounded
//! notification loop for each one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use glucobot_core::config::ReminderConfig;
use glucobot_core::flags::NotifyFlags;
use glucobot_core::reminder::ReminderJob;

use crate::error::TelegramError;

/// Fixed reminder text sent on every loop iteration.
pub const REMINDER_TEXT: &str =
    "⏰ Time for your blood draw!\n\nDon't forget to take the sample, just like we agreed. 😊";

/// Transport seam for the notification loop. The production implementation
/// wraps `Bot::send_message`; tests substitute a recording sink.
#[async_trait]
pub trait ReminderSink: Send + Sync {
    async fn deliver(&self, chat_id: i64, text: &str) -> Result<(), TelegramError>;
}

/// Teloxide-backed sink.
pub struct BotSink {
    bot: teloxide::Bot,
}

impl BotSink {
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ReminderSink for BotSink {
    async fn deliver(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        use teloxide::prelude::*;
        self.bot.send_message(ChatId(chat_id), text).await?;
        Ok(())
    }
}

/// Background task: drains fired jobs and spawns one notification loop per
/// job. Loops run concurrently and independently, including two loops for
/// the same chat (the scheduler never dedupes; a superseded loop exits at
/// its first poll instead).
pub async fn run_delivery<S>(
    sink: Arc<S>,
    flags: Arc<NotifyFlags>,
    config: ReminderConfig,
    mut fired_rx: mpsc::Receiver<ReminderJob>,
) where
    S: ReminderSink + 'static,
{
    while let Some(job) = fired_rx.recv().await {
        let sink = Arc::clone(&sink);
        let flags = Arc::clone(&flags);
        let config = config.clone();
        tokio::spawn(async move {
            notification_loop(sink.as_ref(), &flags, &config, &job).await;
        });
    }
    info!("delivery task exiting (channel closed)");
}

/// Repeatedly send the reminder until the chat's flag clears or the window
/// elapses, then retire the flag entry.
///
/// A send failure is logged and swallowed; the next iteration is the only
/// retry. Cancellation is cooperative: the stop action only clears the
/// flag, so cessation lags it by at most one interval.
pub async fn notification_loop<S>(
    sink: &S,
    flags: &NotifyFlags,
    config: &ReminderConfig,
    job: &ReminderJob,
) where
    S: ReminderSink + ?Sized,
{
    info!(job_id = %job.id, chat_id = job.chat_id, "notification loop started");
    let started = tokio::time::Instant::now();
    let window = Duration::from_secs(config.duration);
    let interval = Duration::from_secs(config.interval);

    while started.elapsed() < window {
        if !flags.is_live(job.chat_id, job.generation) {
            debug!(chat_id = job.chat_id, "notify flag cleared, stopping");
            break;
        }
        if let Err(e) = sink.deliver(job.chat_id, REMINDER_TEXT).await {
            warn!(chat_id = job.chat_id, error = %e, "reminder send failed");
        }
        tokio::time::sleep(interval).await;
    }

    flags.retire(job.chat_id, job.generation);
    info!(job_id = %job.id, chat_id = job.chat_id, "notification loop finished");
}
