//! Subscriber repository with a cache-first `find_one`.
//!
//! Fanout and admin queries always go to MongoDB; only single-chat lookups
//! (profile, on-demand horoscope) are cached.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{self, Document, doc};
use mongodb::options::{IndexOptions, UpdateOptions};
use mongodb::{Collection, IndexModel};
use tracing::debug;

use crate::cache::{CacheConfig, TypedCache};
use crate::database::models::{GroupCount, Registration, Subscriber};
use crate::database::store::SubscriberDirectory;
use crate::database::Database;
use crate::utils::time::to_bson;

/// Repository for subscriber preferences.
pub struct SubscriberRepository {
    collection: Collection<Subscriber>,
    cache: TypedCache<i64, Subscriber>,
}

impl SubscriberRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("subscribers"),
            cache: TypedCache::new("subscribers", CacheConfig::subscribers()),
        }
    }

    /// Enforce one document per chat.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let unique_chat = IndexModel::builder()
            .keys(doc! { "chat_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let preference = IndexModel::builder()
            .keys(doc! { "zodiac_sign": 1, "language": 1 })
            .build();

        self.collection
            .create_indexes(vec![unique_chat, preference])
            .await?;
        Ok(())
    }

    async fn find_many(&self, filter: Document) -> Result<Vec<Subscriber>> {
        let cursor = self.collection.find(filter).await?;
        let subscribers: Vec<Subscriber> = cursor.try_collect().await?;
        Ok(subscribers)
    }

    async fn group_count(&self, pipeline: Vec<Document>) -> Result<Vec<GroupCount>> {
        let cursor = self.collection.aggregate(pipeline).await?;
        let docs: Vec<Document> = cursor.try_collect().await?;

        docs.into_iter()
            .map(|d| bson::from_document::<GroupCount>(d).map_err(Into::into))
            .collect()
    }
}

#[async_trait]
impl SubscriberDirectory for SubscriberRepository {
    async fn find_by_category_and_language(
        &self,
        zodiac_sign: &str,
        language: &str,
    ) -> Result<Vec<Subscriber>> {
        self.find_many(doc! { "zodiac_sign": zodiac_sign, "language": language })
            .await
    }

    async fn upsert(
        &self,
        chat_id: i64,
        zodiac_sign: &str,
        language: &str,
    ) -> Result<Registration> {
        let filter = doc! { "chat_id": chat_id };
        let update = doc! {
            "$set": { "zodiac_sign": zodiac_sign, "language": language },
            "$setOnInsert": { "registered_at": to_bson(&Utc::now()) },
        };
        let options = UpdateOptions::builder().upsert(true).build();

        // No cached copy survives a failed write
        self.cache.invalidate(&chat_id);

        let result = self
            .collection
            .update_one(filter.clone(), update)
            .with_options(options)
            .await?;
        let created = result.upserted_id.is_some();

        let subscriber = self
            .collection
            .find_one(filter)
            .await?
            .ok_or_else(|| anyhow!("subscriber {} missing after upsert", chat_id))?;

        self.cache.insert(chat_id, subscriber.clone());
        debug!("Upserted subscriber {} (created: {})", chat_id, created);

        Ok(Registration {
            subscriber,
            created,
        })
    }

    async fn find_one(&self, chat_id: i64) -> Result<Option<Subscriber>> {
        if let Some(subscriber) = self.cache.get(&chat_id) {
            return Ok(Some(subscriber));
        }
        debug!("{} cache miss for {}", self.cache.name(), chat_id);

        let result = self.collection.find_one(doc! { "chat_id": chat_id }).await?;

        // An upsert that landed during our read has already cached the newer copy
        Ok(result.map(|s| self.cache.insert_if_absent(chat_id, s)))
    }

    async fn find_all(&self) -> Result<Vec<Subscriber>> {
        self.find_many(doc! {}).await
    }

    async fn find_by_language(&self, language: &str) -> Result<Vec<Subscriber>> {
        self.find_many(doc! { "language": language }).await
    }

    async fn find_by_category(&self, zodiac_sign: &str) -> Result<Vec<Subscriber>> {
        self.find_many(doc! { "zodiac_sign": zodiac_sign }).await
    }

    async fn count_all(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    async fn count_registered_since(&self, since: DateTime<Utc>) -> Result<u64> {
        let filter = doc! { "registered_at": { "$gte": to_bson(&since) } };
        Ok(self.collection.count_documents(filter).await?)
    }

    async fn find_registered_since(&self, since: DateTime<Utc>) -> Result<Vec<Subscriber>> {
        self.find_many(doc! { "registered_at": { "$gte": to_bson(&since) } })
            .await
    }

    async fn count_by_language(&self) -> Result<Vec<GroupCount>> {
        self.group_count(vec![
            doc! { "$group": { "_id": "$language", "count": { "$sum": 1 } } },
            doc! { "$sort": { "count": -1, "_id": 1 } },
        ])
        .await
    }

    async fn count_by_category(&self) -> Result<Vec<GroupCount>> {
        self.group_count(vec![
            doc! { "$group": { "_id": "$zodiac_sign", "count": { "$sum": 1 } } },
            doc! { "$sort": { "count": -1, "_id": 1 } },
        ])
        .await
    }

    async fn registrations_per_day(&self, since: DateTime<Utc>) -> Result<Vec<GroupCount>> {
        self.group_count(vec![
            doc! { "$match": { "registered_at": { "$gte": to_bson(&since) } } },
            doc! {
                "$group": {
                    "_id": { "$dateToString": { "format": "%Y-%m-%d", "date": "$registered_at" } },
                    "count": { "$sum": 1 },
                }
            },
            doc! { "$sort": { "_id": 1 } },
        ])
        .await
    }
}
