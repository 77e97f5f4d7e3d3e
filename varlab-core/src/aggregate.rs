//! Per-variant funnel aggregation.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::events::EventType;
use crate::metrics::{TimeWindow, VariantSummary};
use crate::storage::{EventStore, Result};
use crate::types::VariantId;

/// Builds [`VariantSummary`] values from the event store.
///
/// Pure read path: nothing is cached or written back, every call
/// recomputes from the stored events.
#[derive(Clone)]
pub struct Aggregator {
    store: Arc<dyn EventStore>,
}

impl Aggregator {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Distinct-pair counts and derived rates for one variant.
    ///
    /// A variant with no events yields zero counts and undefined rates, not
    /// an error.
    #[instrument(skip(self), level = "debug")]
    pub async fn summarize(
        &self,
        variant_id: &VariantId,
        window: &TimeWindow,
    ) -> Result<VariantSummary> {
        let impressions = self
            .store
            .count_distinct(variant_id, EventType::View, window)
            .await?;
        let clicks = self
            .store
            .count_distinct(variant_id, EventType::Click, window)
            .await?;
        let conversions = self
            .store
            .count_distinct(variant_id, EventType::Convert, window)
            .await?;

        debug!(impressions, clicks, conversions, "variant summarized");
        Ok(VariantSummary::new(
            variant_id.clone(),
            impressions,
            clicks,
            conversions,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::FunnelEvent;
    use crate::storage::TursoEventStore;
    use crate::types::{SubjectId, UserId};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 10, 8, 0, 0).unwrap()
    }

    async fn seeded_store() -> Arc<TursoEventStore> {
        let store = TursoEventStore::new_memory().await.unwrap();
        let mut events = Vec::new();
        // 8 views, 4 clicks, 1 conversion for variant "a"
        for user in 0..8 {
            events.push(FunnelEvent::new(
                UserId::parse(user).unwrap(),
                VariantId::new("a"),
                SubjectId(1),
                EventType::View,
                t0() + Duration::minutes(user),
            ));
        }
        for user in 0..4 {
            events.push(FunnelEvent::new(
                UserId::parse(user).unwrap(),
                VariantId::new("a"),
                SubjectId(1),
                EventType::Click,
                t0() + Duration::minutes(10 + user),
            ));
        }
        events.push(FunnelEvent::new(
            UserId::parse(0).unwrap(),
            VariantId::new("a"),
            SubjectId(1),
            EventType::Convert,
            t0() + Duration::minutes(30),
        ));
        store.record_batch(&events).await.unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn summarize_counts_each_funnel_step() {
        let aggregator = Aggregator::new(seeded_store().await);

        let summary = aggregator
            .summarize(&VariantId::new("a"), &TimeWindow::unbounded())
            .await
            .unwrap();

        assert_eq!(summary.impressions, 8);
        assert_eq!(summary.clicks, 4);
        assert_eq!(summary.conversions, 1);
        assert_eq!(summary.click_through_rate.value, 0.5);
        assert_eq!(summary.conversion_rate.value, 0.25);
    }

    #[tokio::test]
    async fn summarize_respects_window() {
        let aggregator = Aggregator::new(seeded_store().await);
        let window = TimeWindow::new(Some(t0()), Some(t0() + Duration::minutes(4))).unwrap();

        let summary = aggregator
            .summarize(&VariantId::new("a"), &window)
            .await
            .unwrap();

        assert_eq!(summary.impressions, 4);
        assert_eq!(summary.clicks, 0);
        assert!(!summary.conversion_rate.defined);
    }

    #[tokio::test]
    async fn unseen_variant_summarizes_to_zero() {
        let aggregator = Aggregator::new(seeded_store().await);

        let summary = aggregator
            .summarize(&VariantId::new("never_shown"), &TimeWindow::unbounded())
            .await
            .unwrap();

        assert_eq!(summary, VariantSummary::empty(VariantId::new("never_shown")));
    }
}
