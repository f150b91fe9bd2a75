//! Daily fanout job.
//!
//! For every sign and every language, in catalog order: generate fresh
//! text, store it, and send it to each matching subscriber. Strictly
//! sequential; every failure is logged and the loop moves on.

use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use tracing::{debug, error, info, warn};

use super::generator::ContentGenerator;
use super::message::horoscope_message;
use crate::catalog::{Category, Language, SharedCatalog};
use crate::database::{ContentStore, SubscriberDirectory};
use crate::delivery::{DeliverySender, TextMode};

/// Counters for one fanout run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FanoutReport {
    pub generated: usize,
    pub fallbacks: usize,
    pub save_failures: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// The scheduled generate-store-deliver batch.
#[derive(Clone)]
pub struct FanoutJob {
    catalog: SharedCatalog,
    store: Arc<dyn ContentStore>,
    directory: Arc<dyn SubscriberDirectory>,
    generator: Arc<dyn ContentGenerator>,
    sender: Arc<dyn DeliverySender>,
}

impl FanoutJob {
    pub fn new(
        catalog: SharedCatalog,
        store: Arc<dyn ContentStore>,
        directory: Arc<dyn SubscriberDirectory>,
        generator: Arc<dyn ContentGenerator>,
        sender: Arc<dyn DeliverySender>,
    ) -> Self {
        Self {
            catalog,
            store,
            directory,
            generator,
            sender,
        }
    }

    /// Run one full pass. Always generates, even for pairs with no subscribers.
    pub async fn run(&self) -> FanoutReport {
        info!("Starting daily horoscope fanout...");
        let started = Instant::now();
        let today = Local::now().date_naive();
        let mut report = FanoutReport::default();

        for category in self.catalog.categories() {
            for language in self.catalog.languages() {
                self.run_pair(category, language, today, &mut report).await;
            }
        }

        info!(
            "Horoscope fanout finished in {:?}: generated={} fallbacks={} save_failures={} delivered={} failed={}",
            started.elapsed(),
            report.generated,
            report.fallbacks,
            report.save_failures,
            report.delivered,
            report.failed
        );
        report
    }

    async fn run_pair(
        &self,
        category: &Category,
        language: &Language,
        today: NaiveDate,
        report: &mut FanoutReport,
    ) {
        let generation = self.generator.generate(category, language).await;
        report.generated += 1;
        if generation.is_fallback() {
            report.fallbacks += 1;
            warn!("Delivering fallback text for {}/{}", category.key, language.code);
        }

        if let Err(e) = self
            .store
            .save(
                &category.key,
                &language.code,
                generation.text(),
                generation.is_fallback(),
            )
            .await
        {
            report.save_failures += 1;
            error!(
                "Failed to save horoscope for {} ({}): {}",
                category.key, language.code, e
            );
        }

        let subscribers = match self
            .directory
            .find_by_category_and_language(&category.key, &language.code)
            .await
        {
            Ok(subscribers) => subscribers,
            Err(e) => {
                error!(
                    "Failed to load subscribers for {} ({}): {}",
                    category.key, language.code, e
                );
                return;
            }
        };

        let message = horoscope_message(&language.code, &category.name, today, generation.text());

        for subscriber in subscribers {
            match self
                .sender
                .send(subscriber.chat_id, &message, TextMode::Html)
                .await
            {
                Ok(()) => {
                    report.delivered += 1;
                    debug!("Horoscope sent to {}", subscriber.chat_id);
                }
                Err(e) => {
                    report.failed += 1;
                    error!("Failed to send horoscope to {}: {}", subscriber.chat_id, e);
                }
            }
        }
    }
}
