//! Admin panel: subscriber statistics and the broadcast entry point.
//!
//! Only users listed in `ADMIN_IDS` can open the panel. Panel texts are
//! English-only.

use std::fmt::Write;

use anyhow::Result;
use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, Utc};
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::error;

use super::broadcast;
use super::callback::AdminView;
use super::keyboards::admin_panel_keyboard;
use super::show;
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::catalog::Catalog;
use crate::database::SubscriberDirectory;
use crate::utils::html_escape;
use crate::utils::time::day_start;

const PANEL_TITLE: &str = "🔐 <b>Admin panel</b>\n\nChoose a report:";
const MAX_TODAY_LINES: usize = 50;
const GRAPH_DAYS: u64 = 7;
const GRAPH_WIDTH: i64 = 10;

/// Handle the /admin command.
pub async fn admin_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let is_admin = msg.from.as_ref().map(|u| state.is_admin(u.id.0)).unwrap_or(false);
    if !is_admin {
        bot.send_message(msg.chat.id, "You do not have access to this command.")
            .await?;
        return Ok(());
    }

    bot.send_message(msg.chat.id, PANEL_TITLE)
        .parse_mode(ParseMode::Html)
        .reply_markup(admin_panel_keyboard())
        .await?;
    Ok(())
}

/// Panel button pressed.
pub async fn admin_callback(
    bot: ThrottledBot,
    q: CallbackQuery,
    state: AppState,
    view: AdminView,
) -> anyhow::Result<()> {
    bot.answer_callback_query(&q.id).await?;

    let directory = state.subscribers.as_ref();
    let report = match view {
        AdminView::Broadcast => return broadcast::broadcast_menu(bot, q).await,
        AdminView::Stats => stats_report(directory, day_start(&Local::now())).await,
        AdminView::Today => today_report(directory, &state.catalog, day_start(&Local::now())).await,
        AdminView::Languages => languages_report(directory, &state.catalog).await,
        AdminView::Signs => signs_report(directory, &state.catalog).await,
        AdminView::Graph => graph_report(directory, Utc::now().date_naive()).await,
    };

    let text = report.unwrap_or_else(|e| {
        error!("Failed to build {:?} report: {}", view, e);
        "❌ Failed to load statistics.".to_string()
    });

    show(&bot, &q, text, Some(admin_panel_keyboard()), Some(ParseMode::Html)).await
}

pub async fn stats_report(directory: &dyn SubscriberDirectory, today: DateTime<Utc>) -> Result<String> {
    let total = directory.count_all().await?;
    let new_today = directory.count_registered_since(today).await?;

    Ok(format!(
        "📊 <b>General statistics</b>\n\nTotal subscribers: {}\nNew today: {}",
        total, new_today
    ))
}

pub async fn today_report(
    directory: &dyn SubscriberDirectory,
    catalog: &Catalog,
    today: DateTime<Utc>,
) -> Result<String> {
    let mut subscribers = directory.find_registered_since(today).await?;
    if subscribers.is_empty() {
        return Ok("🆕 <b>New subscribers today</b>\n\nNo registrations today.".to_string());
    }
    subscribers.sort_by_key(|s| s.registered_at);

    let mut text = format!("🆕 <b>New subscribers today</b> ({})\n\n", subscribers.len());
    for s in subscribers.iter().take(MAX_TODAY_LINES) {
        let time = DateTime::<Utc>::from_timestamp_millis(s.registered_at.timestamp_millis())
            .map(|d| d.with_timezone(&Local).format("%H:%M:%S").to_string())
            .unwrap_or_default();
        let _ = writeln!(
            text,
            "<code>{}</code> {} {} {}",
            s.chat_id,
            html_escape(catalog.category_name(&s.zodiac_sign)),
            html_escape(catalog.language_label(&s.language)),
            time
        );
    }
    if subscribers.len() > MAX_TODAY_LINES {
        let _ = writeln!(text, "… and {} more", subscribers.len() - MAX_TODAY_LINES);
    }

    Ok(text)
}

pub async fn languages_report(directory: &dyn SubscriberDirectory, catalog: &Catalog) -> Result<String> {
    let rows = directory.count_by_language().await?;
    let mut text = "🌐 <b>Subscribers by language</b>\n\n".to_string();
    if rows.is_empty() {
        text.push_str("No subscribers yet.");
    }
    for row in rows {
        let _ = writeln!(text, "{}: {}", html_escape(catalog.language_label(&row.key)), row.count);
    }
    Ok(text)
}

pub async fn signs_report(directory: &dyn SubscriberDirectory, catalog: &Catalog) -> Result<String> {
    let rows = directory.count_by_category().await?;
    let mut text = "♈ <b>Subscribers by sign</b>\n\n".to_string();
    if rows.is_empty() {
        text.push_str("No subscribers yet.");
    }
    for row in rows {
        let _ = writeln!(text, "{}: {}", html_escape(catalog.category_name(&row.key)), row.count);
    }
    Ok(text)
}

/// Registrations for the seven UTC days ending with `today`, zero days included.
pub async fn graph_report(directory: &dyn SubscriberDirectory, today: NaiveDate) -> Result<String> {
    let first = today - Days::new(GRAPH_DAYS - 1);
    let since = first.and_time(NaiveTime::MIN).and_utc();
    let rows = directory.registrations_per_day(since).await?;

    let days: Vec<(String, i64)> = first
        .iter_days()
        .take(GRAPH_DAYS as usize)
        .map(|day| {
            let key = day.format("%Y-%m-%d").to_string();
            let count = rows.iter().find(|r| r.key == key).map(|r| r.count).unwrap_or(0);
            (key, count)
        })
        .collect();

    let max = days.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1);
    let mut text = "📈 <b>Registrations, last 7 days</b>\n\n".to_string();
    for (day, count) in days {
        let width = (count * GRAPH_WIDTH + max - 1) / max;
        let _ = writeln!(
            text,
            "<code>{}</code> {} {}",
            day,
            "▇".repeat(width as usize),
            count
        );
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Subscriber;
    use crate::testing::MemorySubscriberDirectory;
    use crate::utils::time::to_bson;
    use chrono::TimeZone;

    fn subscriber_at(chat_id: i64, sign: &str, lang: &str, at: DateTime<Utc>) -> Subscriber {
        let mut s = Subscriber::new(chat_id, sign, lang);
        s.registered_at = to_bson(&at);
        s
    }

    fn directory() -> MemorySubscriberDirectory {
        let dir = MemorySubscriberDirectory::default();
        let day = |d: u32, h: u32| Utc.with_ymd_and_hms(2024, 3, d, h, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2024, 2, 28, 9, 0, 0).unwrap();
        dir.insert(subscriber_at(1, "leo", "en", before));
        dir.insert(subscriber_at(2, "leo", "uk", day(5, 10)));
        dir.insert(subscriber_at(3, "aries", "uk", day(7, 8)));
        dir.insert(subscriber_at(4, "leo", "uk", day(7, 12)));
        dir
    }

    #[tokio::test]
    async fn test_stats_report_counts() {
        let dir = directory();
        let today = Utc.with_ymd_and_hms(2024, 3, 7, 0, 0, 0).unwrap();
        let text = stats_report(&dir, today).await.unwrap();
        assert!(text.contains("Total subscribers: 4"));
        assert!(text.contains("New today: 2"));
    }

    #[tokio::test]
    async fn test_today_report_lists_new_subscribers() {
        let dir = directory();
        let catalog = Catalog::zodiac();
        let today = Utc.with_ymd_and_hms(2024, 3, 7, 0, 0, 0).unwrap();
        let text = today_report(&dir, &catalog, today).await.unwrap();

        assert!(text.contains("(2)"));
        assert!(text.contains("<code>3</code> Aries"));
        assert!(text.contains("<code>4</code> Leo"));
        assert!(!text.contains("<code>1</code>"));
    }

    #[tokio::test]
    async fn test_today_report_empty() {
        let dir = MemorySubscriberDirectory::default();
        let catalog = Catalog::zodiac();
        let text = today_report(&dir, &catalog, Utc::now()).await.unwrap();
        assert!(text.contains("No registrations today."));
    }

    #[tokio::test]
    async fn test_group_reports_most_popular_first() {
        let dir = directory();
        let catalog = Catalog::zodiac();

        let languages = languages_report(&dir, &catalog).await.unwrap();
        let uk = languages.find("Українська: 3").unwrap();
        let en = languages.find("English: 1").unwrap();
        assert!(uk < en);

        let signs = signs_report(&dir, &catalog).await.unwrap();
        assert!(signs.find("Leo: 3").unwrap() < signs.find("Aries: 1").unwrap());
    }

    #[tokio::test]
    async fn test_graph_report_fills_missing_days() {
        let dir = directory();
        let today = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let text = graph_report(&dir, today).await.unwrap();

        assert!(!text.contains("2024-02-28"));
        assert!(text.contains("<code>2024-03-01</code>  0"));
        assert!(text.contains("<code>2024-03-05</code> ▇▇▇▇▇ 1"));
        assert!(text.contains("<code>2024-03-07</code> ▇▇▇▇▇▇▇▇▇▇ 2"));
        assert_eq!(text.lines().filter(|l| l.starts_with("<code>")).count(), 7);
    }
}
