//! Storage traits and implementations for funnel events.
//!
//! Events are the only persisted state. Writes are idempotent upserts on the
//! natural key `(user_id, subject_id, event_type)`; reads count distinct
//! `(user_id, subject_id)` pairs so a bulk import that bypassed the unique
//! constraint still cannot inflate a funnel.
//!
//! The Turso implementation stores events in libSQL.

mod error;
mod turso;

pub use error::{Error, Result};
pub use turso::TursoEventStore;

use async_trait::async_trait;

use crate::events::{EventType, FunnelEvent, RecordOutcome};
use crate::metrics::TimeWindow;
use crate::types::{SubjectId, UserId, VariantId};

/// Append/query interface for funnel events.
///
/// Implementations must resolve concurrent duplicate writes through the
/// backing store's own conflict handling, never check-then-write.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Store an event unless its natural key already exists.
    ///
    /// The first occurrence wins; a duplicate leaves the stored timestamp
    /// and variant untouched.
    async fn record(&self, event: &FunnelEvent) -> Result<RecordOutcome>;

    /// Store many events with the same first-touch rule as [`record`](Self::record).
    /// Returns how many were new.
    async fn record_batch(&self, events: &[FunnelEvent]) -> Result<u64>;

    /// Count distinct `(user, subject)` pairs for a variant and event type
    /// whose first-touch timestamp falls in `window`.
    async fn count_distinct(
        &self,
        variant_id: &VariantId,
        event_type: EventType,
        window: &TimeWindow,
    ) -> Result<u64>;

    /// Fetch the stored row for a natural key.
    async fn get_event(
        &self,
        user_id: UserId,
        subject_id: SubjectId,
        event_type: EventType,
    ) -> Result<Option<FunnelEvent>>;
}
