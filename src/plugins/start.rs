//! /start command plugin.
//!
//! Greets the user and offers the registration button.

use teloxide::prelude::*;

use super::keyboards::register_keyboard;
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::i18n::get_text;

/// Handle the /start command.
pub async fn start_handler(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let locale = state.locale(msg.chat.id, msg.from.as_ref()).await;

    bot.send_message(msg.chat.id, get_text(&locale, "start.welcome"))
        .reply_markup(register_keyboard(&locale, "start.register_btn"))
        .await?;

    Ok(())
}
