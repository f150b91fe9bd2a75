//! Outbound message delivery.
//!
//! One Telegram call per recipient. Callers decide what a failure means;
//! the fanout and broadcast loops log it and continue with the next chat.

use async_trait::async_trait;
use teloxide::RequestError;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use thiserror::Error;

use crate::bot::dispatcher::ThrottledBot;

/// How Telegram should interpret the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    Html,
    Plain,
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("telegram request failed: {0}")]
    Telegram(#[from] RequestError),
}

/// Sends a single message to a single chat.
#[async_trait]
pub trait DeliverySender: Send + Sync {
    async fn send(&self, chat_id: i64, text: &str, mode: TextMode) -> Result<(), DeliveryError>;
}

/// Delivery through the throttled bot.
#[derive(Clone)]
pub struct TelegramSender {
    bot: ThrottledBot,
}

impl TelegramSender {
    pub fn new(bot: ThrottledBot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl DeliverySender for TelegramSender {
    async fn send(&self, chat_id: i64, text: &str, mode: TextMode) -> Result<(), DeliveryError> {
        let request = self.bot.send_message(ChatId(chat_id), text);
        match mode {
            TextMode::Html => request.parse_mode(ParseMode::Html).await?,
            TextMode::Plain => request.await?,
        };
        Ok(())
    }
}
