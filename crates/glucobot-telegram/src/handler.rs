//! Inbound message routing registered in the teloxide Dispatcher.

use std::sync::Arc;

use chrono::Local;
use teloxide::prelude::*;
use tracing::debug;

use glucobot_core::conversation::{transition, Action, Event, Reply, SessionStore};
use glucobot_core::flags::NotifyFlags;
use glucobot_core::reminder::ReminderJob;
use glucobot_scheduler::SchedulerHandle;

use crate::keyboard;
use crate::send;

const HELP_TEXT: &str = "Send /start and I'll walk you through it: first the time you ate (HH:MM), then how many minutes to wait before the reminder. Press Stop to silence an active reminder.";

/// Shared dependencies injected into the dispatcher.
pub struct BotContext {
    pub sessions: Arc<SessionStore>,
    pub flags: Arc<NotifyFlags>,
    pub scheduler: SchedulerHandle,
}

/// How a raw inbound text routes before touching the state machine.
///
/// Keyboard button presses arrive as plain text, so the Start/Stop labels
/// map to the same events as their slash commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inbound<'a> {
    Start,
    Stop,
    Help,
    Text(&'a str),
}

fn classify(text: &str) -> Inbound<'_> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("/start") || trimmed == keyboard::START_LABEL {
        Inbound::Start
    } else if trimmed.eq_ignore_ascii_case("/stop") || trimmed == keyboard::STOP_LABEL {
        Inbound::Stop
    } else if trimmed.eq_ignore_ascii_case("/help") {
        Inbound::Help
    } else {
        Inbound::Text(text)
    }
}

/// Endpoint for every incoming `Message`.
///
/// Always returns `Ok`: failures are handled (or swallowed) per event, so
/// one bad update cannot stop the dispatcher.
pub async fn handle_message(bot: Bot, msg: Message, ctx: Arc<BotContext>) -> ResponseResult<()> {
    // Ignore messages from other bots.
    if msg.from.as_ref().map(|u| u.is_bot).unwrap_or(false) {
        return Ok(());
    }
    // Stickers, photos etc. carry no text and mean nothing to the dialogue.
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let chat_id = msg.chat.id;
    match classify(text) {
        Inbound::Help => send::send_text(&bot, chat_id, HELP_TEXT).await,
        Inbound::Start => apply(&bot, chat_id, Event::Start, &ctx).await,
        Inbound::Stop => apply(&bot, chat_id, Event::Stop, &ctx).await,
        Inbound::Text(t) => apply(&bot, chat_id, Event::Text(t), &ctx).await,
    }
    Ok(())
}

/// Feed one event through the chat's state machine and execute its actions.
async fn apply(bot: &Bot, chat_id: ChatId, event: Event<'_>, ctx: &BotContext) {
    let chat = chat_id.0;
    let current = ctx.sessions.state(chat);
    let (next, actions) = transition(current, event, Local::now());
    ctx.sessions.put(chat, next);
    debug!(chat_id = chat, state = ?next, "conversation advanced");

    for action in actions {
        match action {
            // The welcome prompt carries the reply keyboard.
            Action::Reply(Reply::Welcome) => {
                send::send_with_keyboard(
                    bot,
                    chat_id,
                    &Reply::Welcome.text(),
                    keyboard::main_keyboard(),
                )
                .await;
            }
            Action::Reply(reply) => send::send_text(bot, chat_id, &reply.text()).await,
            Action::ScheduleReminder { at } => {
                let generation = ctx.flags.activate(chat);
                ctx.scheduler.schedule(ReminderJob::new(chat, at, generation));
            }
            Action::StopNotifications => ctx.flags.deactivate(chat),
        }
    }
}
