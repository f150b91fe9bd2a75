//! Message dispatcher setup.
//!
//! Builds the dispatcher with all command, callback and text handlers.

use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::error;

use crate::broadcast::BroadcastSessions;
use crate::catalog::SharedCatalog;
use crate::content::ContentResolver;
use crate::database::{Subscriber, SubscriberDirectory};
use crate::delivery::DeliverySender;
use crate::i18n;
use crate::plugins;

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

pub type BotDispatcher =
    Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Zodiac signs and languages.
    pub catalog: SharedCatalog,

    /// Subscriber preferences.
    pub subscribers: Arc<dyn SubscriberDirectory>,

    /// Today's content, generated on demand.
    pub resolver: ContentResolver,

    /// Outbound messages for broadcasts.
    pub sender: Arc<dyn DeliverySender>,

    /// Pending admin broadcasts.
    pub broadcasts: BroadcastSessions,

    /// Administrator user IDs.
    pub admin_ids: Vec<u64>,
}

impl AppState {
    pub fn new(
        catalog: SharedCatalog,
        subscribers: Arc<dyn SubscriberDirectory>,
        resolver: ContentResolver,
        sender: Arc<dyn DeliverySender>,
        admin_ids: Vec<u64>,
    ) -> Self {
        Self {
            catalog,
            subscribers,
            resolver,
            sender,
            broadcasts: BroadcastSessions::new(),
            admin_ids,
        }
    }

    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    /// Look up the subscriber for a chat, logging and swallowing errors.
    pub async fn subscriber(&self, chat_id: ChatId) -> Option<Subscriber> {
        match self.subscribers.find_one(chat_id.0).await {
            Ok(subscriber) => subscriber,
            Err(e) => {
                error!("Failed to load subscriber {}: {}", chat_id, e);
                None
            }
        }
    }

    /// Locale for replies in `chat_id`: stored preference first, then the
    /// client's Telegram language.
    pub async fn locale(&self, chat_id: ChatId, user: Option<&teloxide::types::User>) -> String {
        let subscriber = self.subscriber(chat_id).await;
        i18n::resolve_locale(
            subscriber.as_ref().map(|s| s.language.as_str()),
            user.and_then(|u| u.language_code.as_deref()),
        )
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(bot: ThrottledBot, state: AppState) -> BotDispatcher {
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    use teloxide::dispatching::UpdateFilterExt;

    // Commands first, then a pending broadcast body, then the usage hint
    let message_handler = Update::filter_message()
        .branch(plugins::command_handler())
        .branch(plugins::broadcast_message_handler())
        .branch(plugins::text_handler());

    let callback_handler = plugins::callback_handler();

    dptree::entry()
        .branch(message_handler)
        .branch(callback_handler)
}
