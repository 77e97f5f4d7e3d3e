//! Turso/libSQL implementation of event storage.
//!
//! This module provides persistent storage using Turso (libSQL).
//! It can connect to:
//! - Remote Turso database (cloud)
//! - Local embedded SQLite file
//! - In-memory database (tests)

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Builder, Connection, Database, Value};
use tracing::{debug, instrument};

use super::{Error, EventStore, Result};
use crate::events::{EventType, FunnelEvent, RecordOutcome};
use crate::metrics::TimeWindow;
use crate::types::{SubjectId, UserId, VariantId};

/// SQL schema for the funnel events table.
///
/// The primary key is the natural key; `INSERT ... ON CONFLICT DO NOTHING`
/// against it is what makes tracking idempotent.
const SCHEMA_FUNNEL_EVENTS: &str = r#"
CREATE TABLE IF NOT EXISTS funnel_events (
    user_id INTEGER NOT NULL,
    subject_id INTEGER NOT NULL,
    event_type TEXT NOT NULL,
    variant_id TEXT NOT NULL,
    occurred_at_ms INTEGER NOT NULL,
    PRIMARY KEY (user_id, subject_id, event_type)
)
"#;

/// SQL index for per-variant funnel counts.
const INDEX_FUNNEL_EVENTS: &str = r#"
CREATE INDEX IF NOT EXISTS idx_funnel_events_variant_type_time
ON funnel_events(variant_id, event_type, occurred_at_ms)
"#;

const INSERT_PREFIX: &str =
    "INSERT INTO funnel_events (user_id, subject_id, event_type, variant_id, occurred_at_ms) VALUES ";

/// Only newly inserted rows come back from `RETURNING`. The connection's
/// change counter is shared by every writer on it, so outcomes are read from
/// the statement's own rows.
const ON_CONFLICT_KEEP_FIRST: &str =
    " ON CONFLICT(user_id, subject_id, event_type) DO NOTHING RETURNING user_id";

/// Rows per multi-row insert, well under SQLite's bound-parameter limit.
const BATCH_CHUNK: usize = 500;

/// Turso-backed funnel event store.
///
/// Holds a single connection for its lifetime. An in-memory libSQL database
/// only lives as long as the connection that opened it, and one connection
/// keeps every write statement atomic without cross-connection locking.
#[derive(Clone)]
pub struct TursoEventStore {
    _db: Arc<Database>,
    conn: Connection,
}

impl TursoEventStore {
    /// Create a new store backed by a local embedded database file.
    pub async fn new_local(path: &Path) -> Result<Self> {
        let db = Builder::new_local(path).build().await?;
        Self::open(db).await
    }

    /// Create a new store connected to a remote Turso database.
    pub async fn new_remote(url: &str, token: &str) -> Result<Self> {
        let db = Builder::new_remote(url.to_string(), token.to_string())
            .build()
            .await?;
        Self::open(db).await
    }

    /// Create a new in-memory store (for testing).
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        Self::open(db).await
    }

    async fn open(db: Database) -> Result<Self> {
        let conn = db.connect()?;
        let store = Self {
            _db: Arc::new(db),
            conn,
        };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Ensure the database schema exists.
    async fn ensure_schema(&self) -> Result<()> {
        self.conn.execute(SCHEMA_FUNNEL_EVENTS, ()).await?;
        self.conn.execute(INDEX_FUNNEL_EVENTS, ()).await?;
        Ok(())
    }

    /// Bound values for one row, in column order.
    fn row_values(event: &FunnelEvent) -> [Value; 5] {
        [
            Value::Integer(event.user_id.as_i64()),
            Value::Integer(event.subject_id.0),
            Value::Text(event.event_type.as_str().to_string()),
            Value::Text(event.variant_id.as_str().to_string()),
            Value::Integer(event.occurred_at.timestamp_millis()),
        ]
    }

    /// Parse an event from a database row.
    fn parse_event(row: &libsql::Row) -> Result<FunnelEvent> {
        let user_id: i64 = row.get(0)?;
        let subject_id: i64 = row.get(1)?;
        let event_type_str: String = row.get(2)?;
        let variant_id: String = row.get(3)?;
        let occurred_at_ms: i64 = row.get(4)?;

        let user_id = UserId::parse(user_id)
            .map_err(|_| Error::InvalidData(format!("invalid user id: {}", user_id)))?;
        let event_type = EventType::parse(&event_type_str)
            .map_err(|_| Error::InvalidData(format!("invalid event type: {}", event_type_str)))?;
        let occurred_at = parse_millis(occurred_at_ms)?;

        Ok(FunnelEvent {
            user_id,
            variant_id: VariantId(variant_id),
            subject_id: SubjectId(subject_id),
            event_type,
            occurred_at,
        })
    }
}

#[async_trait]
impl EventStore for TursoEventStore {
    #[instrument(skip(self, event), fields(user_id = %event.user_id, subject_id = %event.subject_id, event_type = %event.event_type), level = "debug")]
    async fn record(&self, event: &FunnelEvent) -> Result<RecordOutcome> {
        let sql = format!("{INSERT_PREFIX}(?, ?, ?, ?, ?){ON_CONFLICT_KEEP_FIRST}");
        let mut rows = self
            .conn
            .query(&sql, libsql::params_from_iter(Self::row_values(event)))
            .await?;

        if rows.next().await?.is_some() {
            Ok(RecordOutcome::Recorded)
        } else {
            debug!("natural key already stored, keeping first touch");
            Ok(RecordOutcome::Duplicate)
        }
    }

    #[instrument(skip(self, events), fields(count = events.len()), level = "debug")]
    async fn record_batch(&self, events: &[FunnelEvent]) -> Result<u64> {
        let mut inserted = 0;
        for chunk in events.chunks(BATCH_CHUNK) {
            let placeholders = vec!["(?, ?, ?, ?, ?)"; chunk.len()].join(", ");
            let sql = format!("{INSERT_PREFIX}{placeholders}{ON_CONFLICT_KEEP_FIRST}");
            let values: Vec<Value> = chunk.iter().flat_map(Self::row_values).collect();
            let mut rows = self
                .conn
                .query(&sql, libsql::params_from_iter(values))
                .await?;
            while rows.next().await?.is_some() {
                inserted += 1;
            }
        }
        debug!(inserted, "batch recorded");
        Ok(inserted)
    }

    #[instrument(skip(self), level = "debug")]
    async fn count_distinct(
        &self,
        variant_id: &VariantId,
        event_type: EventType,
        window: &TimeWindow,
    ) -> Result<u64> {
        let (start_ms, end_ms) = window.bounds_millis();
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM (SELECT DISTINCT user_id, subject_id FROM funnel_events WHERE variant_id = ? AND event_type = ? AND occurred_at_ms >= ? AND occurred_at_ms < ?)",
                libsql::params![
                    variant_id.as_str().to_string(),
                    event_type.as_str(),
                    start_ms,
                    end_ms
                ],
            )
            .await?;

        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        u64::try_from(count).map_err(|_| Error::InvalidData(format!("negative count: {}", count)))
    }

    #[instrument(skip(self), level = "debug")]
    async fn get_event(
        &self,
        user_id: UserId,
        subject_id: SubjectId,
        event_type: EventType,
    ) -> Result<Option<FunnelEvent>> {
        let mut rows = self
            .conn
            .query(
                "SELECT user_id, subject_id, event_type, variant_id, occurred_at_ms FROM funnel_events WHERE user_id = ? AND subject_id = ? AND event_type = ?",
                libsql::params![user_id.as_i64(), subject_id.0, event_type.as_str()],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::parse_event(&row)?))
        } else {
            Ok(None)
        }
    }
}

/// Parse a stored epoch-millisecond timestamp.
fn parse_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| Error::InvalidData(format!("invalid timestamp: {}", ms)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    async fn create_test_store() -> TursoEventStore {
        TursoEventStore::new_memory().await.unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn event(user: i64, subject: i64, ty: EventType, variant: &str, at: DateTime<Utc>) -> FunnelEvent {
        FunnelEvent::new(
            UserId::parse(user).unwrap(),
            VariantId::new(variant),
            SubjectId(subject),
            ty,
            at,
        )
    }

    #[tokio::test]
    async fn store_returns_zero_when_empty() {
        let store = create_test_store().await;

        let count = store
            .count_distinct(&VariantId::new("a"), EventType::View, &TimeWindow::unbounded())
            .await
            .unwrap();

        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn duplicate_record_is_idempotent() {
        let store = create_test_store().await;
        let view = event(5, 100, EventType::View, "a", t0());

        assert_eq!(store.record(&view).await.unwrap(), RecordOutcome::Recorded);
        assert_eq!(store.record(&view).await.unwrap(), RecordOutcome::Duplicate);

        let count = store
            .count_distinct(&VariantId::new("a"), EventType::View, &TimeWindow::unbounded())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn duplicate_keeps_first_touch_timestamp() {
        let store = create_test_store().await;
        let first = event(5, 100, EventType::Click, "a", t0());
        let later = event(5, 100, EventType::Click, "a", t0() + Duration::hours(3));

        store.record(&first).await.unwrap();
        store.record(&later).await.unwrap();

        let stored = store
            .get_event(UserId::parse(5).unwrap(), SubjectId(100), EventType::Click)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.occurred_at, t0());
        assert_eq!(stored, first);
    }

    #[tokio::test]
    async fn same_pair_different_event_types_are_separate_rows() {
        let store = create_test_store().await;

        for ty in EventType::ALL {
            assert_eq!(
                store.record(&event(1, 9, ty, "a", t0())).await.unwrap(),
                RecordOutcome::Recorded
            );
        }

        for ty in EventType::ALL {
            let count = store
                .count_distinct(&VariantId::new("a"), ty, &TimeWindow::unbounded())
                .await
                .unwrap();
            assert_eq!(count, 1, "{ty}");
        }
    }

    #[tokio::test]
    async fn counts_are_scoped_to_variant() {
        let store = create_test_store().await;
        store.record(&event(1, 1, EventType::View, "a", t0())).await.unwrap();
        store.record(&event(2, 1, EventType::View, "a", t0())).await.unwrap();
        store.record(&event(3, 1, EventType::View, "b", t0())).await.unwrap();

        let window = TimeWindow::unbounded();
        assert_eq!(
            store
                .count_distinct(&VariantId::new("a"), EventType::View, &window)
                .await
                .unwrap(),
            2
        );
        assert_eq!(
            store
                .count_distinct(&VariantId::new("b"), EventType::View, &window)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn window_is_inclusive_start_exclusive_end() {
        let store = create_test_store().await;
        let start = t0();
        let end = t0() + Duration::hours(1);
        store.record(&event(1, 1, EventType::View, "a", start - Duration::milliseconds(1))).await.unwrap();
        store.record(&event(2, 1, EventType::View, "a", start)).await.unwrap();
        store.record(&event(3, 1, EventType::View, "a", end - Duration::milliseconds(1))).await.unwrap();
        store.record(&event(4, 1, EventType::View, "a", end)).await.unwrap();

        let window = TimeWindow::new(Some(start), Some(end)).unwrap();
        let count = store
            .count_distinct(&VariantId::new("a"), EventType::View, &window)
            .await
            .unwrap();

        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn batch_reports_only_new_rows() {
        let store = create_test_store().await;
        store.record(&event(1, 1, EventType::View, "a", t0())).await.unwrap();

        let batch: Vec<_> = (0..1_200)
            .map(|user| event(user, 1, EventType::View, "a", t0()))
            .chain(std::iter::once(event(7, 1, EventType::View, "a", t0())))
            .collect();
        let inserted = store.record_batch(&batch).await.unwrap();

        assert_eq!(inserted, 1_199);
        let count = store
            .count_distinct(&VariantId::new("a"), EventType::View, &TimeWindow::unbounded())
            .await
            .unwrap();
        assert_eq!(count, 1_200);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicates_collapse_to_one_row() {
        let store = Arc::new(create_test_store().await);
        let view = event(42, 7, EventType::View, "a", t0());

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let store = Arc::clone(&store);
                let view = view.clone();
                tokio::spawn(async move { store.record(&view).await.unwrap() })
            })
            .collect();

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap());
        }

        let recorded = outcomes
            .iter()
            .filter(|o| **o == RecordOutcome::Recorded)
            .count();
        assert_eq!(recorded, 1);
        assert_eq!(outcomes.len() - recorded, 49);

        let count = store
            .count_distinct(&VariantId::new("a"), EventType::View, &TimeWindow::unbounded())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn get_event_returns_none_for_unknown_key() {
        let store = create_test_store().await;

        let result = store
            .get_event(UserId::parse(1).unwrap(), SubjectId(1), EventType::View)
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn local_file_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.db");

        {
            let store = TursoEventStore::new_local(&path).await.unwrap();
            store.record(&event(11, 2, EventType::View, "a", t0())).await.unwrap();
        }

        let reopened = TursoEventStore::new_local(&path).await.unwrap();
        assert_eq!(
            reopened.record(&event(11, 2, EventType::View, "a", t0())).await.unwrap(),
            RecordOutcome::Duplicate
        );
        let count = reopened
            .count_distinct(&VariantId::new("a"), EventType::View, &TimeWindow::unbounded())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
