//! Storage traits used by the content pipeline and the bot handlers.
//!
//! The MongoDB repositories implement these; tests use in-memory fakes.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};

use super::models::{ContentRecord, GroupCount, Registration, Subscriber};
use crate::utils::time::day_start;

/// Persistence for generated content.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Newest record for the pair created at or after `since`.
    async fn find_since(
        &self,
        zodiac_sign: &str,
        language: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<ContentRecord>>;

    /// Insert a new record. Duplicates for the same day are allowed.
    async fn save(
        &self,
        zodiac_sign: &str,
        language: &str,
        text: &str,
        fallback: bool,
    ) -> Result<ContentRecord>;

    /// Record created since local midnight, if any.
    async fn find_today(&self, zodiac_sign: &str, language: &str) -> Result<Option<ContentRecord>> {
        self.find_since(zodiac_sign, language, day_start(&Local::now()))
            .await
    }
}

/// Persistence for subscriber preferences.
#[async_trait]
pub trait SubscriberDirectory: Send + Sync {
    async fn find_by_category_and_language(
        &self,
        zodiac_sign: &str,
        language: &str,
    ) -> Result<Vec<Subscriber>>;

    /// Create or update the subscriber for `chat_id`.
    /// `registered_at` is only written on creation.
    async fn upsert(&self, chat_id: i64, zodiac_sign: &str, language: &str)
    -> Result<Registration>;

    async fn find_one(&self, chat_id: i64) -> Result<Option<Subscriber>>;

    async fn find_all(&self) -> Result<Vec<Subscriber>>;

    async fn find_by_language(&self, language: &str) -> Result<Vec<Subscriber>>;

    async fn find_by_category(&self, zodiac_sign: &str) -> Result<Vec<Subscriber>>;

    async fn count_all(&self) -> Result<u64>;

    async fn count_registered_since(&self, since: DateTime<Utc>) -> Result<u64>;

    async fn find_registered_since(&self, since: DateTime<Utc>) -> Result<Vec<Subscriber>>;

    async fn count_by_language(&self) -> Result<Vec<GroupCount>>;

    async fn count_by_category(&self) -> Result<Vec<GroupCount>>;

    /// Registrations per UTC day (`%Y-%m-%d`) since `since`, ascending.
    async fn registrations_per_day(&self, since: DateTime<Utc>) -> Result<Vec<GroupCount>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemorySubscriberDirectory;

    #[tokio::test]
    async fn test_upsert_keeps_one_record_and_registration_time() {
        let directory = MemorySubscriberDirectory::default();

        let first = directory.upsert(42, "leo", "en").await.unwrap();
        assert!(first.created);

        let second = directory.upsert(42, "pisces", "uk").await.unwrap();
        assert!(!second.created);
        assert_eq!(second.subscriber.zodiac_sign, "pisces");
        assert_eq!(second.subscriber.language, "uk");
        assert_eq!(
            second.subscriber.registered_at,
            first.subscriber.registered_at
        );

        assert_eq!(directory.count_all().await.unwrap(), 1);
        assert!(directory
            .find_by_category_and_language("leo", "en")
            .await
            .unwrap()
            .is_empty());
    }
}
