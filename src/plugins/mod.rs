//! Plugin system for command handlers.
//!
//! Add new plugins by:
//! 1. Creating a new file in this directory
//! 2. Adding `pub mod your_plugin;` below
//! 3. Adding the handler to `command_handler()` or `callback_handler()`

pub mod admin;
pub mod broadcast;
pub mod callback;
pub mod help;
pub mod horoscope;
pub mod keyboards;
pub mod profile;
pub mod register;
pub mod start;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, ParseMode};
use teloxide::utils::command::BotCommands;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::i18n::get_text;
use callback::CallbackData;

/// All bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,

    #[command(description = "Register or change your settings")]
    Register,

    #[command(description = "View your profile")]
    Profile,

    #[command(description = "Get today's horoscope")]
    Horoscope,

    #[command(description = "Show help")]
    Help,

    #[command(description = "Admin panel")]
    Admin,

    #[command(description = "Cancel a pending broadcast")]
    Cancel,
}

/// Build the command handler.
pub fn command_handler() -> UpdateHandler<anyhow::Error> {
    use dptree::case;

    teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(start::start_handler))
        .branch(case![Command::Register].endpoint(register::register_command))
        .branch(case![Command::Profile].endpoint(profile::profile_command))
        .branch(case![Command::Horoscope].endpoint(horoscope::horoscope_command))
        .branch(case![Command::Help].endpoint(help::help_handler))
        .branch(case![Command::Admin].endpoint(admin::admin_command))
        .branch(case![Command::Cancel].endpoint(broadcast::cancel_command))
}

/// Build the callback query handler.
///
/// Unknown data and admin-only actions from non-admins are answered and
/// otherwise ignored.
pub fn callback_handler() -> UpdateHandler<anyhow::Error> {
    use dptree::case;

    Update::filter_callback_query()
        .branch(
            dptree::filter_map(|q: CallbackQuery| q.data.as_deref().and_then(CallbackData::parse))
                .filter(|data: CallbackData, q: CallbackQuery, state: AppState| {
                    data.is_permitted(state.is_admin(q.from.id.0))
                })
                .branch(case![CallbackData::Register].endpoint(register::register_callback))
                .branch(case![CallbackData::Language(code)].endpoint(register::language_callback))
                .branch(case![CallbackData::Sign(code, index)].endpoint(register::sign_callback))
                .branch(case![CallbackData::Admin(view)].endpoint(admin::admin_callback))
                .branch(case![CallbackData::BroadcastAll].endpoint(broadcast::target_all))
                .branch(case![CallbackData::BroadcastPickLanguage].endpoint(broadcast::pick_language))
                .branch(case![CallbackData::BroadcastPickSign].endpoint(broadcast::pick_sign))
                .branch(case![CallbackData::BroadcastLanguage(code)].endpoint(broadcast::target_language))
                .branch(case![CallbackData::BroadcastSign(index)].endpoint(broadcast::target_sign)),
        )
        .branch(dptree::endpoint(ignore_callback))
}

/// A pending broadcast body from an administrator.
pub fn broadcast_message_handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter(|msg: Message, state: AppState| {
        msg.text().is_some()
            && msg
                .from
                .as_ref()
                .map(|u| state.is_admin(u.id.0) && state.broadcasts.is_active(u.id.0))
                .unwrap_or(false)
    })
    .endpoint(broadcast::broadcast_message)
}

/// Any other private text gets a usage hint.
pub fn text_handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter(|msg: Message| msg.chat.is_private() && msg.text().is_some())
        .endpoint(use_commands_hint)
}

async fn use_commands_hint(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let locale = state.locale(msg.chat.id, msg.from.as_ref()).await;
    bot.send_message(msg.chat.id, get_text(&locale, "common.use_commands"))
        .await?;
    Ok(())
}

async fn ignore_callback(bot: ThrottledBot, q: CallbackQuery) -> anyhow::Result<()> {
    bot.answer_callback_query(&q.id).await?;
    Ok(())
}

/// Chat the callback button was pressed in, or the user's private chat.
pub(crate) fn callback_chat_id(q: &CallbackQuery) -> ChatId {
    q.message
        .as_ref()
        .map(|m| m.chat().id)
        .unwrap_or(ChatId(q.from.id.0 as i64))
}

/// Replace the callback's message with `text`, or send a new one when
/// that message is no longer accessible.
pub(crate) async fn show(
    bot: &ThrottledBot,
    q: &CallbackQuery,
    text: String,
    keyboard: Option<InlineKeyboardMarkup>,
    parse_mode: Option<ParseMode>,
) -> anyhow::Result<()> {
    if let Some(msg) = q.message.as_ref() {
        let mut edit = bot.edit_message_text(msg.chat().id, msg.id(), text);
        if let Some(keyboard) = keyboard {
            edit = edit.reply_markup(keyboard);
        }
        if let Some(mode) = parse_mode {
            edit = edit.parse_mode(mode);
        }
        edit.await?;
    } else {
        let mut send = bot.send_message(callback_chat_id(q), text);
        if let Some(keyboard) = keyboard {
            send = send.reply_markup(keyboard);
        }
        if let Some(mode) = parse_mode {
            send = send.parse_mode(mode);
        }
        send.await?;
    }
    Ok(())
}

/// Localized generic failure reply.
pub(crate) async fn reply_error(bot: &ThrottledBot, chat_id: ChatId, locale: &str) -> anyhow::Result<()> {
    bot.send_message(chat_id, get_text(locale, "common.error")).await?;
    Ok(())
}
