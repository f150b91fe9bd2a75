//! Stargazer - Daily horoscope Telegram bot
//!
//! Generates one horoscope per zodiac sign and language each day and
//! delivers it to every matching subscriber.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `catalog` - Zodiac signs and supported languages
//! - `database` - MongoDB storage behind the storage traits
//! - `cache` - Moka-backed subscriber cache
//! - `content` - Generation, on-demand resolution and the daily fanout
//! - `delivery` - Outbound Telegram messages
//! - `scheduler` - Cron trigger for the fanout
//! - `broadcast` - Admin broadcasts
//! - `bot` - Dispatcher and runtime (with Throttle for API rate limiting)
//! - `plugins` - Command and callback handlers
//! - `i18n` - Subscriber-facing strings
//! - `utils` - Utility functions

mod bot;
mod broadcast;
mod cache;
mod catalog;
mod config;
mod content;
mod database;
mod delivery;
mod i18n;
mod plugins;
mod scheduler;
mod utils;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bot::AppState;
use catalog::Catalog;
use config::Config;
use content::{ContentGenerator, ContentResolver, FanoutJob, OpenAiGenerator};
use database::{ContentRepository, ContentStore, Database, SubscriberDirectory, SubscriberRepository};
use delivery::{DeliverySender, TelegramSender};
use scheduler::FanoutSchedule;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stargazer=info,teloxide=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Stargazer bot...");

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");
    info!("Bot mode: {:?}", config.bot_mode);

    // Fail fast on a bad schedule before connecting anywhere
    let schedule = FanoutSchedule::parse(&config.fanout_cron)?;

    info!("Connecting to MongoDB...");
    let db = Database::connect(&config.mongodb_uri, &config.mongodb_database).await?;
    info!("Database connected");

    let content_repo = ContentRepository::new(&db);
    let subscriber_repo = SubscriberRepository::new(&db);
    if let Err(e) = content_repo.ensure_indexes().await {
        warn!("Failed to create horoscope indexes: {}", e);
    }
    if let Err(e) = subscriber_repo.ensure_indexes().await {
        warn!("Failed to create subscriber indexes: {}", e);
    }
    let store: Arc<dyn ContentStore> = Arc::new(content_repo);
    let subscribers: Arc<dyn SubscriberDirectory> = Arc::new(subscriber_repo);

    let catalog = Arc::new(Catalog::zodiac());
    let generator: Arc<dyn ContentGenerator> =
        Arc::new(OpenAiGenerator::new(config.generator.clone())?);
    info!("Generator model: {}", config.generator.model);

    // Initialize bot with Throttle for automatic rate limiting
    // This respects Telegram's rate limits:
    // - 30 messages per second globally
    // - 1 message per second to the same chat
    // - 20 messages per minute to the same group
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());
    info!("Bot initialized with rate limiting (Throttle)");

    let me = bot.get_me().await?;
    info!("Bot username: @{}", me.username());

    if config.admin_ids.is_empty() {
        info!("No admin IDs configured (ADMIN_IDS is empty)");
    } else {
        info!("Bot admins: {:?}", config.admin_ids);
    }

    let sender: Arc<dyn DeliverySender> = Arc::new(TelegramSender::new(bot.clone()));

    let fanout = FanoutJob::new(
        catalog.clone(),
        store.clone(),
        subscribers.clone(),
        generator.clone(),
        sender.clone(),
    );
    info!("Horoscope fanout scheduled with '{}'", schedule.expression());
    let scheduler = scheduler::spawn(schedule, fanout, config.run_fanout_on_start);

    let resolver = ContentResolver::new(store, generator);
    let state = AppState::new(catalog, subscribers, resolver, sender, config.admin_ids.clone());

    let dispatcher = bot::build_dispatcher(bot.clone(), state);
    bot::run(&config, dispatcher, bot).await?;

    scheduler.abort();
    info!("Stargazer stopped");
    Ok(())
}
