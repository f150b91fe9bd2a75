//! Registration flow: /register, language menu, sign menu.
//!
//! The chosen language drives every reply after the first menu, so the
//! sign menu and the confirmation are already in the new language.

use teloxide::prelude::*;
use tracing::{error, info};

use super::callback::CallbackData;
use super::horoscope::send_horoscope;
use super::keyboards::{language_keyboard, sign_keyboard};
use super::{callback_chat_id, show};
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::catalog::Catalog;
use crate::database::Registration;
use crate::i18n::get_text;

fn language_menu(catalog: &Catalog) -> teloxide::types::InlineKeyboardMarkup {
    language_keyboard(catalog, |l| CallbackData::Language(l.code.clone()))
}

/// Handle the /register command.
pub async fn register_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let locale = state.locale(msg.chat.id, msg.from.as_ref()).await;

    bot.send_message(msg.chat.id, get_text(&locale, "register.choose_language"))
        .reply_markup(language_menu(&state.catalog))
        .await?;

    Ok(())
}

/// "Register" / "Change settings" button.
pub async fn register_callback(bot: ThrottledBot, q: CallbackQuery, state: AppState) -> anyhow::Result<()> {
    bot.answer_callback_query(&q.id).await?;

    let locale = state.locale(callback_chat_id(&q), Some(&q.from)).await;
    show(
        &bot,
        &q,
        get_text(&locale, "register.choose_language"),
        Some(language_menu(&state.catalog)),
        None,
    )
    .await
}

/// Language chosen: show the sign menu in that language.
pub async fn language_callback(
    bot: ThrottledBot,
    q: CallbackQuery,
    state: AppState,
    code: String,
) -> anyhow::Result<()> {
    let Some(language) = state.catalog.language(&code) else {
        bot.answer_callback_query(&q.id)
            .text(get_text(&code, "register.invalid"))
            .await?;
        return Ok(());
    };
    bot.answer_callback_query(&q.id).await?;

    let keyboard = sign_keyboard(&state.catalog, |index, _| {
        CallbackData::Sign(language.code.clone(), index)
    });
    show(
        &bot,
        &q,
        get_text(&language.code, "register.choose_sign"),
        Some(keyboard),
        None,
    )
    .await
}

/// Sign chosen: store the preference, confirm, then send today's horoscope.
pub async fn sign_callback(
    bot: ThrottledBot,
    q: CallbackQuery,
    state: AppState,
    (code, index): (String, usize),
) -> anyhow::Result<()> {
    let category = state.catalog.category_at(index);
    let language = state.catalog.language(&code);
    let (Some(category), Some(language)) = (category, language) else {
        bot.answer_callback_query(&q.id)
            .text(get_text(&code, "register.invalid"))
            .await?;
        return Ok(());
    };
    bot.answer_callback_query(&q.id).await?;

    let chat_id = callback_chat_id(&q);
    let registration = match state
        .subscribers
        .upsert(chat_id.0, &category.key, &language.code)
        .await
    {
        Ok(registration) => registration,
        Err(e) => {
            error!("Failed to register {}: {}", chat_id, e);
            return show(&bot, &q, get_text(&language.code, "common.error"), None, None).await;
        }
    };

    info!(
        "Chat {} {} as {}/{}",
        chat_id,
        if registration.created { "registered" } else { "updated" },
        category.key,
        language.code
    );

    show(
        &bot,
        &q,
        confirmation_text(&state.catalog, &registration),
        None,
        None,
    )
    .await?;

    send_horoscope(&bot, chat_id, &state, category, language).await
}

fn confirmation_text(catalog: &Catalog, registration: &Registration) -> String {
    let subscriber = &registration.subscriber;
    let key = if registration.created {
        "register.created"
    } else {
        "register.updated"
    };

    get_text(&subscriber.language, key)
        .replace("{sign}", catalog.category_name(&subscriber.zodiac_sign))
        .replace("{language}", catalog.language_label(&subscriber.language))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Subscriber;

    #[test]
    fn test_confirmation_distinguishes_create_and_update() {
        let catalog = Catalog::zodiac();
        let created = Registration {
            subscriber: Subscriber::new(1, "leo", "en"),
            created: true,
        };
        let updated = Registration {
            subscriber: Subscriber::new(1, "leo", "en"),
            created: false,
        };

        let created = confirmation_text(&catalog, &created);
        let updated = confirmation_text(&catalog, &updated);
        assert!(created.starts_with("You have successfully registered"));
        assert!(updated.starts_with("Your profile has been updated"));
        assert!(created.contains("Leo"));
        assert!(updated.contains("🇬🇧 English"));
    }

    #[test]
    fn test_confirmation_in_chosen_language() {
        let catalog = Catalog::zodiac();
        let registration = Registration {
            subscriber: Subscriber::new(1, "aries", "uk"),
            created: true,
        };
        let text = confirmation_text(&catalog, &registration);
        assert_eq!(
            text,
            get_text("uk", "register.created")
                .replace("{sign}", "Aries")
                .replace("{language}", "🇺🇦 Українська")
        );
    }
}
