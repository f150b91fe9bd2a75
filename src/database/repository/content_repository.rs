//! Horoscope content repository.
//!
//! No caching: the resolver already collapses concurrent misses and the
//! fanout job always writes fresh records.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Collection, IndexModel};
use tracing::debug;

use crate::database::models::ContentRecord;
use crate::database::store::ContentStore;
use crate::database::Database;
use crate::utils::time::to_bson;

/// Repository for generated content records.
pub struct ContentRepository {
    collection: Collection<ContentRecord>,
}

impl ContentRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("horoscopes"),
        }
    }

    /// Create the lookup index used by `find_since`.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "zodiac_sign": 1, "language": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("sign_language_created".to_string())
                    .build(),
            )
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for ContentRepository {
    async fn find_since(
        &self,
        zodiac_sign: &str,
        language: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<ContentRecord>> {
        let filter = doc! {
            "zodiac_sign": zodiac_sign,
            "language": language,
            "created_at": { "$gte": to_bson(&since) },
        };

        // Several same-day records can exist; prefer the newest.
        let result = self
            .collection
            .find_one(filter)
            .sort(doc! { "created_at": -1 })
            .await?;

        debug!(
            "DB get content for {}/{} since {}: {:?}",
            zodiac_sign,
            language,
            since,
            result.is_some()
        );
        Ok(result)
    }

    async fn save(
        &self,
        zodiac_sign: &str,
        language: &str,
        text: &str,
        fallback: bool,
    ) -> Result<ContentRecord> {
        let mut record = ContentRecord::new(zodiac_sign, language, text, fallback);
        let result = self.collection.insert_one(&record).await?;
        record.id = result.inserted_id.as_object_id();

        debug!("Saved content for {} ({})", zodiac_sign, language);
        Ok(record)
    }
}
