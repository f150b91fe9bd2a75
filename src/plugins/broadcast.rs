//! Admin broadcast handlers.
//!
//! Target menus, the pending-session prompt, and the message that
//! completes a session.

use teloxide::prelude::*;
use tracing::error;

use super::callback::CallbackData;
use super::keyboards::{broadcast_target_keyboard, language_keyboard, sign_keyboard};
use super::show;
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::broadcast::{self, BroadcastTarget};
use crate::catalog::Catalog;

pub async fn broadcast_menu(bot: ThrottledBot, q: CallbackQuery) -> anyhow::Result<()> {
    show(
        &bot,
        &q,
        "📢 Who should receive the broadcast?".to_string(),
        Some(broadcast_target_keyboard()),
        None,
    )
    .await
}

pub async fn pick_language(bot: ThrottledBot, q: CallbackQuery, state: AppState) -> anyhow::Result<()> {
    bot.answer_callback_query(&q.id).await?;
    let keyboard = language_keyboard(&state.catalog, |l| {
        CallbackData::BroadcastLanguage(l.code.clone())
    });
    show(&bot, &q, "🌐 Choose the language:".to_string(), Some(keyboard), None).await
}

pub async fn pick_sign(bot: ThrottledBot, q: CallbackQuery, state: AppState) -> anyhow::Result<()> {
    bot.answer_callback_query(&q.id).await?;
    let keyboard = sign_keyboard(&state.catalog, |index, _| CallbackData::BroadcastSign(index));
    show(&bot, &q, "♈ Choose the sign:".to_string(), Some(keyboard), None).await
}

pub async fn target_all(bot: ThrottledBot, q: CallbackQuery, state: AppState) -> anyhow::Result<()> {
    begin(bot, q, state, BroadcastTarget::All).await
}

pub async fn target_language(
    bot: ThrottledBot,
    q: CallbackQuery,
    state: AppState,
    code: String,
) -> anyhow::Result<()> {
    if state.catalog.language(&code).is_none() {
        bot.answer_callback_query(&q.id).text("Unknown language.").await?;
        return Ok(());
    }
    begin(bot, q, state, BroadcastTarget::Language(code)).await
}

pub async fn target_sign(
    bot: ThrottledBot,
    q: CallbackQuery,
    state: AppState,
    index: usize,
) -> anyhow::Result<()> {
    let Some(category) = state.catalog.category_at(index) else {
        bot.answer_callback_query(&q.id).text("Unknown sign.").await?;
        return Ok(());
    };
    let target = BroadcastTarget::Category(category.key.clone());
    begin(bot, q, state, target).await
}

async fn begin(
    bot: ThrottledBot,
    q: CallbackQuery,
    state: AppState,
    target: BroadcastTarget,
) -> anyhow::Result<()> {
    bot.answer_callback_query(&q.id).await?;

    let text = format!(
        "✉️ Send the message to broadcast to {}.\nUse /cancel to abort.",
        describe(&state.catalog, &target)
    );
    state.broadcasts.begin(q.from.id.0, target);
    show(&bot, &q, text, None, None).await
}

/// The admin's next text after choosing a target.
pub async fn broadcast_message(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let (Some(user), Some(text)) = (msg.from.as_ref(), msg.text()) else {
        return Ok(());
    };
    let Some(target) = state.broadcasts.take(user.id.0) else {
        return Ok(());
    };

    let reply = match broadcast::broadcast(
        state.subscribers.as_ref(),
        state.sender.as_ref(),
        &target,
        text,
    )
    .await
    {
        Ok(report) => format!(
            "✅ Broadcast to {} finished.\nDelivered: {}\nFailed: {}",
            describe(&state.catalog, &target),
            report.delivered,
            report.failed
        ),
        Err(e) => {
            error!("Broadcast to {:?} failed: {}", target, e);
            "❌ Broadcast failed: could not load recipients.".to_string()
        }
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// Handle the /cancel command.
pub async fn cancel_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref().filter(|u| state.is_admin(u.id.0)) else {
        return Ok(());
    };

    let reply = match state.broadcasts.take(user.id.0) {
        Some(_) => "Broadcast cancelled.",
        None => "No broadcast is pending.",
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

fn describe(catalog: &Catalog, target: &BroadcastTarget) -> String {
    match target {
        BroadcastTarget::All => "all subscribers".to_string(),
        BroadcastTarget::Language(code) => {
            format!("{} subscribers", catalog.language_label(code))
        }
        BroadcastTarget::Category(key) => format!("{} subscribers", catalog.category_name(key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_targets() {
        let catalog = Catalog::zodiac();
        assert_eq!(describe(&catalog, &BroadcastTarget::All), "all subscribers");
        assert_eq!(
            describe(&catalog, &BroadcastTarget::Category("pisces".into())),
            "Pisces subscribers"
        );
        assert_eq!(
            describe(&catalog, &BroadcastTarget::Language("es".into())),
            "🇪🇸 Español subscribers"
        );
    }
}
