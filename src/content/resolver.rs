//! On-demand horoscope resolution.
//!
//! Read-through over the content store: today's record if one exists,
//! otherwise generate, persist and return. Concurrent misses for the same
//! (sign, language, day) share one in-flight generation instead of each
//! calling the API.

use std::sync::Arc;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{debug, error, warn};

use super::generator::ContentGenerator;
use crate::catalog::{Category, Language};
use crate::database::ContentStore;

type InFlight = Shared<BoxFuture<'static, String>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ContentKey {
    zodiac_sign: String,
    language: String,
    day: NaiveDate,
}

/// Resolves today's text for interactive requests.
#[derive(Clone)]
pub struct ContentResolver {
    store: Arc<dyn ContentStore>,
    generator: Arc<dyn ContentGenerator>,
    in_flight: Arc<DashMap<ContentKey, InFlight>>,
}

impl ContentResolver {
    pub fn new(store: Arc<dyn ContentStore>, generator: Arc<dyn ContentGenerator>) -> Self {
        Self {
            store,
            generator,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Today's text for the pair, generating it on a miss.
    ///
    /// # Errors
    /// Returns error only if the initial store lookup fails. Generation and
    /// save failures are logged and do not surface here.
    pub async fn resolve(&self, category: &Category, language: &Language) -> Result<String> {
        if let Some(record) = self.store.find_today(&category.key, &language.code).await? {
            debug!("Horoscope for {}/{} served from store", category.key, language.code);
            return Ok(record.text);
        }

        Ok(self.join_or_start(category, language).await)
    }

    fn join_or_start(&self, category: &Category, language: &Language) -> InFlight {
        let key = ContentKey {
            zodiac_sign: category.key.clone(),
            language: language.code.clone(),
            day: Local::now().date_naive(),
        };

        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(entry) => {
                debug!("Joining in-flight generation for {}/{}", key.zodiac_sign, key.language);
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                let task = generate_and_store(
                    Arc::clone(&self.store),
                    Arc::clone(&self.generator),
                    Arc::clone(&self.in_flight),
                    key,
                    category.clone(),
                    language.clone(),
                )
                .boxed()
                .shared();
                entry.insert(task.clone());
                task
            }
        }
    }
}

async fn generate_and_store(
    store: Arc<dyn ContentStore>,
    generator: Arc<dyn ContentGenerator>,
    in_flight: Arc<DashMap<ContentKey, InFlight>>,
    key: ContentKey,
    category: Category,
    language: Language,
) -> String {
    // A previous flight may have finished between our miss and our insert.
    let existing = match store.find_today(&category.key, &language.code).await {
        Ok(found) => found,
        Err(e) => {
            warn!("Content lookup failed for {}/{}: {}", category.key, language.code, e);
            None
        }
    };

    let text = match existing {
        Some(record) => record.text,
        None => {
            let generation = generator.generate(&category, &language).await;
            if generation.is_fallback() {
                warn!("Storing fallback text for {}/{}", category.key, language.code);
            }

            if let Err(e) = store
                .save(
                    &category.key,
                    &language.code,
                    generation.text(),
                    generation.is_fallback(),
                )
                .await
            {
                error!(
                    "Failed to save horoscope for {} ({}): {}",
                    category.key, language.code, e
                );
            }

            generation.into_text()
        }
    };

    in_flight.remove(&key);
    text
}
