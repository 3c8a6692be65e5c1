//! Bot command menu registration.

use teloxide::prelude::*;
use teloxide::types::BotCommand;
use tracing::warn;

/// Register the command menu (`/start`, `/help`) with Telegram.
///
/// A registration failure is logged and ignored: the bot still answers the
/// commands, the menu just stays empty.
pub async fn register(bot: &Bot) {
    let commands = vec![
        BotCommand::new("start", "set up a reminder"),
        BotCommand::new("help", "how to use the bot"),
    ];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!(error = %e, "failed to register bot commands");
    }
}
