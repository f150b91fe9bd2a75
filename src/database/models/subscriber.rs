//! Subscriber model: one document per registered chat.

use mongodb::bson::DateTime;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A registered chat with its sign and language preference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    /// MongoDB document ID
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Telegram chat ID (unique)
    pub chat_id: i64,

    /// Category key from the catalog
    pub zodiac_sign: String,

    /// Language code from the catalog
    pub language: String,

    /// Set on first registration, never touched by updates
    pub registered_at: DateTime,
}

impl Subscriber {
    pub fn new(chat_id: i64, zodiac_sign: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            id: None,
            chat_id,
            zodiac_sign: zodiac_sign.into(),
            language: language.into(),
            registered_at: DateTime::now(),
        }
    }
}

/// Outcome of an upsert: the stored subscriber and whether it was just created.
#[derive(Debug, Clone)]
pub struct Registration {
    pub subscriber: Subscriber,
    pub created: bool,
}

/// A `(group key, count)` row from an aggregate query.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupCount {
    #[serde(rename = "_id")]
    pub key: String,
    pub count: i64,
}
