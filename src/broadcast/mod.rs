//! Administrator broadcast.
//!
//! A broadcast is a two-step interaction: the operator picks a target in
//! the admin menu, then their next text message becomes the body. Pending
//! targets live in [`BroadcastSessions`], keyed by operator ID, and are
//! consumed exactly once.

use std::sync::Arc;

use anyhow::Result;
use dashmap::DashMap;
use tracing::{error, info};

use crate::database::{Subscriber, SubscriberDirectory};
use crate::delivery::{DeliverySender, TextMode};

/// Who a broadcast goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastTarget {
    All,
    Language(String),
    Category(String),
}

/// Pending broadcast targets per operator.
#[derive(Clone, Default)]
pub struct BroadcastSessions {
    pending: Arc<DashMap<u64, BroadcastTarget>>,
}

impl BroadcastSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or replace) the operator's session.
    pub fn begin(&self, operator_id: u64, target: BroadcastTarget) {
        self.pending.insert(operator_id, target);
    }

    /// Consume the operator's session, if any.
    pub fn take(&self, operator_id: u64) -> Option<BroadcastTarget> {
        self.pending.remove(&operator_id).map(|(_, target)| target)
    }

    pub fn is_active(&self, operator_id: u64) -> bool {
        self.pending.contains_key(&operator_id)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

async fn recipients(
    directory: &dyn SubscriberDirectory,
    target: &BroadcastTarget,
) -> Result<Vec<Subscriber>> {
    match target {
        BroadcastTarget::All => directory.find_all().await,
        BroadcastTarget::Language(code) => directory.find_by_language(code).await,
        BroadcastTarget::Category(key) => directory.find_by_category(key).await,
    }
}

/// Send `text` as plain text to every subscriber matching `target`.
///
/// # Errors
/// Returns error only if the recipient list cannot be loaded.
pub async fn broadcast(
    directory: &dyn SubscriberDirectory,
    sender: &dyn DeliverySender,
    target: &BroadcastTarget,
    text: &str,
) -> Result<BroadcastReport> {
    let subscribers = recipients(directory, target).await?;
    let mut report = BroadcastReport::default();

    for subscriber in subscribers {
        match sender.send(subscriber.chat_id, text, TextMode::Plain).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                report.failed += 1;
                error!("Failed to send broadcast to {}: {}", subscriber.chat_id, e);
            }
        }
    }

    info!(
        "Broadcast to {:?} finished: delivered={} failed={}",
        target, report.delivered, report.failed
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemorySubscriberDirectory, RecordingSender};

    #[test]
    fn test_session_lifecycle() {
        let sessions = BroadcastSessions::new();
        assert!(!sessions.is_active(1));

        sessions.begin(1, BroadcastTarget::Language("uk".into()));
        assert!(sessions.is_active(1));
        assert!(!sessions.is_active(2));

        // Re-selecting replaces the target.
        sessions.begin(1, BroadcastTarget::All);
        assert_eq!(sessions.take(1), Some(BroadcastTarget::All));
        assert_eq!(sessions.take(1), None);
        assert!(!sessions.is_active(1));
    }

    #[tokio::test]
    async fn test_broadcast_filters_and_isolates_failures() {
        let directory = MemorySubscriberDirectory::default();
        directory.upsert(1, "leo", "uk").await.unwrap();
        directory.upsert(2, "leo", "en").await.unwrap();
        directory.upsert(3, "aries", "uk").await.unwrap();
        let sender = RecordingSender::failing_for([1]);

        let report = broadcast(
            &directory,
            &sender,
            &BroadcastTarget::Language("uk".into()),
            "hello",
        )
        .await
        .unwrap();

        assert_eq!(sender.attempts(), vec![1, 3]);
        assert_eq!(report, BroadcastReport { delivered: 1, failed: 1 });

        let report = broadcast(&directory, &sender, &BroadcastTarget::Category("leo".into()), "hi")
            .await
            .unwrap();
        assert_eq!(report.delivered, 1);

        let report = broadcast(&directory, &sender, &BroadcastTarget::All, "all")
            .await
            .unwrap();
        assert_eq!(report, BroadcastReport { delivered: 2, failed: 1 });
    }
}
