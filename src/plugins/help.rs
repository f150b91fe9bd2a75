//! /help command plugin.

use teloxide::prelude::*;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::i18n::get_text;

/// Handle the /help command.
pub async fn help_handler(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let locale = state.locale(msg.chat.id, msg.from.as_ref()).await;
    bot.send_message(msg.chat.id, get_text(&locale, "help.text"))
        .await?;
    Ok(())
}
