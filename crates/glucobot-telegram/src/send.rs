//! Best-effort message sending.
//!
//! Sends are fire-and-forget at the call site: a transport failure is
//! logged and swallowed. Delivery is at-least-attempted, never guaranteed.

use teloxide::prelude::*;
use teloxide::types::KeyboardMarkup;
use tracing::warn;

/// Send `text` to `chat_id`; log and swallow any transport error.
pub async fn send_text(bot: &Bot, chat_id: ChatId, text: &str) {
    if let Err(e) = bot.send_message(chat_id, text).await {
        warn!(chat_id = chat_id.0, error = %e, "failed to send message");
    }
}

/// Like [`send_text`] but attaches a reply keyboard.
pub async fn send_with_keyboard(bot: &Bot, chat_id: ChatId, text: &str, keyboard: KeyboardMarkup) {
    if let Err(e) = bot.send_message(chat_id, text).reply_markup(keyboard).await {
        warn!(chat_id = chat_id.0, error = %e, "failed to send message");
    }
}
