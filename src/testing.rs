//! In-memory fakes of the storage, generation and delivery traits.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use teloxide::{ApiError, RequestError};

use crate::catalog::{Category, Language};
use crate::content::generator::{ContentGenerator, Generation, GenerationError};
use crate::database::{
    ContentRecord, ContentStore, GroupCount, Registration, Subscriber, SubscriberDirectory,
};
use crate::delivery::{DeliveryError, DeliverySender, TextMode};
use crate::utils::time::to_bson;

#[derive(Default)]
pub struct MemoryContentStore {
    records: Mutex<Vec<ContentRecord>>,
    unavailable: bool,
    rejects_saves: bool,
}

impl MemoryContentStore {
    /// A store whose every call fails.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    /// A store that reads fine but fails every `save`.
    pub fn rejecting_saves() -> Self {
        Self {
            rejects_saves: true,
            ..Default::default()
        }
    }

    pub fn insert(&self, record: ContentRecord) {
        self.records.lock().push(record);
    }

    pub fn records(&self) -> Vec<ContentRecord> {
        self.records.lock().clone()
    }

    pub fn count_for(&self, zodiac_sign: &str, language: &str) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| r.zodiac_sign == zodiac_sign && r.language == language)
            .count()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn find_since(
        &self,
        zodiac_sign: &str,
        language: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<ContentRecord>> {
        if self.unavailable {
            return Err(anyhow!("content store unavailable"));
        }
        let since = to_bson(&since);
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|r| r.zodiac_sign == zodiac_sign && r.language == language)
            .filter(|r| r.created_at >= since)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn save(
        &self,
        zodiac_sign: &str,
        language: &str,
        text: &str,
        fallback: bool,
    ) -> Result<ContentRecord> {
        if self.unavailable || self.rejects_saves {
            return Err(anyhow!("content store rejected write"));
        }
        let record = ContentRecord::new(zodiac_sign, language, text, fallback);
        self.records.lock().push(record.clone());
        Ok(record)
    }
}

#[derive(Default)]
pub struct MemorySubscriberDirectory {
    subscribers: Mutex<Vec<Subscriber>>,
    failing_pair: Option<(String, String)>,
}

impl MemorySubscriberDirectory {
    /// Pair lookups for `(zodiac_sign, language)` fail; everything else works.
    pub fn failing_for_pair(zodiac_sign: &str, language: &str) -> Self {
        Self {
            failing_pair: Some((zodiac_sign.to_string(), language.to_string())),
            ..Default::default()
        }
    }

    pub fn insert(&self, subscriber: Subscriber) {
        self.subscribers.lock().push(subscriber);
    }

    pub fn all(&self) -> Vec<Subscriber> {
        self.subscribers.lock().clone()
    }

    fn filtered(&self, keep: impl Fn(&Subscriber) -> bool) -> Vec<Subscriber> {
        self.subscribers.lock().iter().filter(|s| keep(s)).cloned().collect()
    }

    fn grouped(
        &self,
        keep: impl Fn(&Subscriber) -> bool,
        key: impl Fn(&Subscriber) -> String,
    ) -> Vec<GroupCount> {
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for s in self.subscribers.lock().iter().filter(|s| keep(s)) {
            *counts.entry(key(s)).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(key, count)| GroupCount { key, count })
            .collect()
    }

    fn by_count(mut rows: Vec<GroupCount>) -> Vec<GroupCount> {
        rows.sort_by(|a, b| b.count.cmp(&a.count).then(a.key.cmp(&b.key)));
        rows
    }
}

#[async_trait]
impl SubscriberDirectory for MemorySubscriberDirectory {
    async fn find_by_category_and_language(
        &self,
        zodiac_sign: &str,
        language: &str,
    ) -> Result<Vec<Subscriber>> {
        if let Some((sign, lang)) = &self.failing_pair
            && sign == zodiac_sign
            && lang == language
        {
            return Err(anyhow!("subscriber lookup failed for {}/{}", sign, lang));
        }
        Ok(self.filtered(|s| s.zodiac_sign == zodiac_sign && s.language == language))
    }

    async fn upsert(
        &self,
        chat_id: i64,
        zodiac_sign: &str,
        language: &str,
    ) -> Result<Registration> {
        let mut subscribers = self.subscribers.lock();
        if let Some(existing) = subscribers.iter_mut().find(|s| s.chat_id == chat_id) {
            existing.zodiac_sign = zodiac_sign.to_string();
            existing.language = language.to_string();
            return Ok(Registration {
                subscriber: existing.clone(),
                created: false,
            });
        }

        let subscriber = Subscriber::new(chat_id, zodiac_sign, language);
        subscribers.push(subscriber.clone());
        Ok(Registration {
            subscriber,
            created: true,
        })
    }

    async fn find_one(&self, chat_id: i64) -> Result<Option<Subscriber>> {
        Ok(self.filtered(|s| s.chat_id == chat_id).into_iter().next())
    }

    async fn find_all(&self) -> Result<Vec<Subscriber>> {
        Ok(self.all())
    }

    async fn find_by_language(&self, language: &str) -> Result<Vec<Subscriber>> {
        Ok(self.filtered(|s| s.language == language))
    }

    async fn find_by_category(&self, zodiac_sign: &str) -> Result<Vec<Subscriber>> {
        Ok(self.filtered(|s| s.zodiac_sign == zodiac_sign))
    }

    async fn count_all(&self) -> Result<u64> {
        Ok(self.subscribers.lock().len() as u64)
    }

    async fn count_registered_since(&self, since: DateTime<Utc>) -> Result<u64> {
        Ok(self.find_registered_since(since).await?.len() as u64)
    }

    async fn find_registered_since(&self, since: DateTime<Utc>) -> Result<Vec<Subscriber>> {
        let since = to_bson(&since);
        Ok(self.filtered(|s| s.registered_at >= since))
    }

    async fn count_by_language(&self) -> Result<Vec<GroupCount>> {
        Ok(Self::by_count(self.grouped(|_| true, |s| s.language.clone())))
    }

    async fn count_by_category(&self) -> Result<Vec<GroupCount>> {
        Ok(Self::by_count(self.grouped(|_| true, |s| s.zodiac_sign.clone())))
    }

    async fn registrations_per_day(&self, since: DateTime<Utc>) -> Result<Vec<GroupCount>> {
        let since = to_bson(&since);
        // BTreeMap ordering already sorts the day keys ascending.
        Ok(self.grouped(
            |s| s.registered_at >= since,
            |s| {
                DateTime::<Utc>::from_timestamp_millis(s.registered_at.timestamp_millis())
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default()
            },
        ))
    }
}

/// Generator returning `"{key} {code} horoscope"`, or always failing.
#[derive(Default)]
pub struct ScriptedGenerator {
    calls: AtomicUsize,
    delay: Option<Duration>,
    fail: bool,
    panic: bool,
}

impl ScriptedGenerator {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn panicking() -> Self {
        Self {
            panic: true,
            ..Default::default()
        }
    }

    pub fn text_for(category: &Category, language: &Language) -> String {
        format!("{} {} horoscope", category.key, language.code)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn generate(&self, category: &Category, language: &Language) -> Generation {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.panic {
            panic!("generator exploded for {}", category.key);
        }

        let result = if self.fail {
            Err(GenerationError::Empty)
        } else {
            Ok(Self::text_for(category, language))
        };
        Generation::from_result(category, result)
    }
}

/// Sender that records every attempt and fails for chosen chats.
#[derive(Default)]
pub struct RecordingSender {
    attempts: Mutex<Vec<i64>>,
    sent: Mutex<Vec<(i64, String)>>,
    failing: HashSet<i64>,
}

impl RecordingSender {
    pub fn failing_for(chat_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            failing: chat_ids.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn attempts(&self) -> Vec<i64> {
        self.attempts.lock().clone()
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl DeliverySender for RecordingSender {
    async fn send(&self, chat_id: i64, text: &str, _mode: TextMode) -> Result<(), DeliveryError> {
        self.attempts.lock().push(chat_id);
        if self.failing.contains(&chat_id) {
            return Err(RequestError::Api(ApiError::BotBlocked).into());
        }
        self.sent.lock().push((chat_id, text.to_string()));
        Ok(())
    }
}
