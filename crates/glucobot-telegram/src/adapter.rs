//! Telegram channel adapter.
//!
//! Wraps a teloxide `Bot` + `Dispatcher` and drives the long-polling event
//! loop until the process exits. Long polling, so no public URL is needed.

use std::sync::Arc;

use teloxide::prelude::*;
use tokio::sync::mpsc;
use tracing::info;

use glucobot_core::config::GlucobotConfig;
use glucobot_core::conversation::SessionStore;
use glucobot_core::flags::NotifyFlags;
use glucobot_core::reminder::ReminderJob;
use glucobot_scheduler::SchedulerHandle;

use crate::commands;
use crate::handler::{handle_message, BotContext};
use crate::notifier::{self, BotSink};

/// Telegram adapter: owns the dispatcher and the reminder delivery task.
pub struct TelegramAdapter {
    config: GlucobotConfig,
    ctx: Arc<BotContext>,
}

impl TelegramAdapter {
    pub fn new(
        config: &GlucobotConfig,
        scheduler: SchedulerHandle,
        flags: Arc<NotifyFlags>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        let ctx = Arc::new(BotContext {
            sessions,
            flags,
            scheduler,
        });
        Self {
            config: config.clone(),
            ctx,
        }
    }

    /// Connect to Telegram and drive the long-polling loop until ctrl-c.
    ///
    /// Spawns the reminder delivery task over `fired_rx` and registers the
    /// command menu before dispatching.
    pub async fn run(self, fired_rx: mpsc::Receiver<ReminderJob>) {
        let bot = Bot::new(&self.config.telegram.token);

        let sink = Arc::new(BotSink::new(bot.clone()));
        tokio::spawn(notifier::run_delivery(
            sink,
            Arc::clone(&self.ctx.flags),
            self.config.reminder.clone(),
            fired_rx,
        ));

        commands::register(&bot).await;

        info!("telegram: starting long-polling dispatcher");
        let handler = Update::filter_message().endpoint(handle_message);
        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![Arc::clone(&self.ctx)])
            .default_handler(|_upd| async {})
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}
