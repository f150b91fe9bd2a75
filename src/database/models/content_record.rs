//! Generated horoscope text, one document per generation.

use mongodb::bson::DateTime;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A generated content record. Never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub zodiac_sign: String,

    pub language: String,

    pub text: String,

    /// True when the text came from the generator's fallback path.
    #[serde(default)]
    pub fallback: bool,

    pub created_at: DateTime,
}

impl ContentRecord {
    pub fn new(
        zodiac_sign: impl Into<String>,
        language: impl Into<String>,
        text: impl Into<String>,
        fallback: bool,
    ) -> Self {
        Self {
            id: None,
            zodiac_sign: zodiac_sign.into(),
            language: language.into(),
            text: text.into(),
            fallback,
            created_at: DateTime::now(),
        }
    }
}
