//! /profile command plugin.

use chrono::{DateTime, Local, Utc};
use teloxide::prelude::*;
use tracing::error;

use super::keyboards::register_keyboard;
use super::reply_error;
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::catalog::Catalog;
use crate::database::Subscriber;
use crate::i18n::{get_text, resolve_locale};

/// Handle the /profile command.
pub async fn profile_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let chat_id = msg.chat.id;
    let client_lang = msg.from.as_ref().and_then(|u| u.language_code.as_deref());

    match state.subscribers.find_one(chat_id.0).await {
        Ok(Some(subscriber)) => {
            let locale = resolve_locale(Some(&subscriber.language), client_lang);
            bot.send_message(chat_id, profile_text(&state.catalog, &subscriber, &locale))
                .reply_markup(register_keyboard(&locale, "profile.change_btn"))
                .await?;
        }
        Ok(None) => {
            let locale = resolve_locale(None, client_lang);
            bot.send_message(chat_id, get_text(&locale, "profile.not_registered"))
                .reply_markup(register_keyboard(&locale, "start.register_btn"))
                .await?;
        }
        Err(e) => {
            error!("Failed to load profile for {}: {}", chat_id, e);
            reply_error(&bot, chat_id, &resolve_locale(None, client_lang)).await?;
        }
    }

    Ok(())
}

fn profile_text(catalog: &Catalog, subscriber: &Subscriber, locale: &str) -> String {
    let registered = DateTime::<Utc>::from_timestamp_millis(subscriber.registered_at.timestamp_millis())
        .map(|d| {
            d.with_timezone(&Local)
                .format(&get_text(locale, "horoscope.date_format"))
                .to_string()
        })
        .unwrap_or_default();

    get_text(locale, "profile.info")
        .replace("{sign}", catalog.category_name(&subscriber.zodiac_sign))
        .replace("{language}", catalog.language_label(&subscriber.language))
        .replace("{date}", &registered)
}
