//! /horoscope command plugin.
//!
//! Serves today's horoscope for the subscriber's sign and language,
//! generating it on demand if the daily job has not produced it yet.

use chrono::Local;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::error;

use super::keyboards::register_keyboard;
use super::reply_error;
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::catalog::{Category, Language};
use crate::content::horoscope_message;
use crate::i18n::{get_text, resolve_locale};

/// Handle the /horoscope command.
pub async fn horoscope_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let chat_id = msg.chat.id;
    let client_lang = msg.from.as_ref().and_then(|u| u.language_code.as_deref());

    let subscriber = match state.subscribers.find_one(chat_id.0).await {
        Ok(subscriber) => subscriber,
        Err(e) => {
            error!("Failed to load subscriber {}: {}", chat_id, e);
            return reply_error(&bot, chat_id, &resolve_locale(None, client_lang)).await;
        }
    };

    let Some(subscriber) = subscriber else {
        let locale = resolve_locale(None, client_lang);
        bot.send_message(chat_id, get_text(&locale, "profile.not_registered"))
            .reply_markup(register_keyboard(&locale, "start.register_btn"))
            .await?;
        return Ok(());
    };

    let category = state.catalog.category(&subscriber.zodiac_sign);
    let language = state.catalog.language(&subscriber.language);
    let (Some(category), Some(language)) = (category, language) else {
        // Stored preference no longer in the catalog
        let locale = resolve_locale(Some(&subscriber.language), client_lang);
        bot.send_message(chat_id, get_text(&locale, "register.invalid"))
            .await?;
        return Ok(());
    };

    send_horoscope(&bot, chat_id, &state, category, language).await
}

/// Resolve today's text for the pair and send it to `chat_id`.
pub async fn send_horoscope(
    bot: &ThrottledBot,
    chat_id: ChatId,
    state: &AppState,
    category: &Category,
    language: &Language,
) -> anyhow::Result<()> {
    match state.resolver.resolve(category, language).await {
        Ok(text) => {
            let message = horoscope_message(
                &language.code,
                &category.name,
                Local::now().date_naive(),
                &text,
            );
            bot.send_message(chat_id, message)
                .parse_mode(ParseMode::Html)
                .await?;
            Ok(())
        }
        Err(e) => {
            error!(
                "Failed to resolve horoscope for {}/{}: {}",
                category.key, language.code, e
            );
            reply_error(bot, chat_id, &language.code).await
        }
    }
}
