//! Configuration module for Stargazer bot.
//!
//! Loads configuration from environment variables.

use std::env;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

/// Default fanout schedule: 08:00 every day (sec min hour dom month dow).
pub const DEFAULT_FANOUT_CRON: &str = "0 0 8 * * *";

/// Bot running mode
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    #[default]
    Polling,
    Webhook,
}

/// Text generation API settings.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub api_key: String,
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`).
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
}

impl GeneratorConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 800,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<String>,
    pub webhook_port: u16,
    pub webhook_secret: Option<String>,

    /// Administrator user IDs (comma-separated).
    /// These users can open the admin panel and broadcast.
    pub admin_ids: Vec<u64>,

    // MongoDB
    pub mongodb_uri: String,
    pub mongodb_database: String,

    // Generation
    pub generator: GeneratorConfig,

    // Scheduling
    pub fanout_cron: String,
    pub run_fanout_on_start: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// Returns error if a required variable is missing or a value is malformed.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let bot_mode = match env::var("BOT_MODE")
            .unwrap_or_else(|_| "polling".to_string())
            .to_lowercase()
            .as_str()
        {
            "webhook" => BotMode::Webhook,
            _ => BotMode::Polling,
        };

        let webhook_url = env::var("WEBHOOK_URL").ok();

        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            bail!("WEBHOOK_URL must be set when BOT_MODE is webhook");
        }

        let webhook_port = match env::var("WEBHOOK_PORT") {
            Ok(port) => port.parse().context("WEBHOOK_PORT must be a port number")?,
            Err(_) => 8443,
        };

        let admin_ids = parse_ids(&env::var("ADMIN_IDS").unwrap_or_default());

        let mut generator = GeneratorConfig::new(
            env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?,
        );
        if let Ok(model) = env::var("OPENAI_MODEL") {
            generator.model = model;
        }
        if let Ok(base_url) = env::var("OPENAI_BASE_URL") {
            generator.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Ok(max_tokens) = env::var("OPENAI_MAX_TOKENS") {
            generator.max_tokens = max_tokens
                .parse()
                .context("OPENAI_MAX_TOKENS must be a positive integer")?;
        }

        let run_fanout_on_start = env::var("RUN_FANOUT_ON_START")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            bot_token: env::var("BOT_TOKEN").context("BOT_TOKEN must be set")?,
            bot_mode,
            webhook_url,
            webhook_port,
            webhook_secret: env::var("WEBHOOK_SECRET").ok().filter(|s| !s.is_empty()),
            admin_ids,
            mongodb_uri: env::var("MONGODB_URI").context("MONGODB_URI must be set")?,
            mongodb_database: env::var("MONGODB_DATABASE")
                .unwrap_or_else(|_| "stargazer".to_string()),
            generator,
            fanout_cron: env::var("FANOUT_CRON")
                .unwrap_or_else(|_| DEFAULT_FANOUT_CRON.to_string()),
            run_fanout_on_start,
        })
    }
}

/// Parse a comma-separated list of user IDs, skipping invalid entries.
fn parse_ids(raw: &str) -> Vec<u64> {
    raw.split(',')
        .filter_map(|s| s.trim().parse::<u64>().ok())
        .collect()
}
