//! Transport-agnostic experiment API.
//!
//! [`ExperimentService`] is what the HTTP server and the CLI call into. It
//! validates caller input, derives the variant for writes, and recomputes
//! results from the event store on every query.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::aggregate::Aggregator;
use crate::assign::Assigner;
use crate::catalog::{Variant, VariantCatalog};
use crate::config::EngineConfig;
use crate::error::{ExperimentError, Result};
use crate::events::{EventType, FunnelEvent, RecordOutcome};
use crate::metrics::{TimeWindow, VariantSummary};
use crate::significance::{ConfidenceLevel, Metric, PlanningParams, SignificanceResult, compare};
use crate::storage::{self, EventStore};
use crate::types::{SubjectId, UserId, VariantId};

/// Result of a `TrackEvent` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackOutcome {
    /// True whenever the event is stored, including when it already was
    pub success: bool,
    /// Variant the user was bucketed into
    pub variant_id: VariantId,
    pub outcome: RecordOutcome,
}

/// Parameters of a `GetResults` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsQuery {
    pub variant_a: VariantId,
    pub variant_b: VariantId,
    #[serde(default)]
    pub window: TimeWindow,
    /// Confidence in percent; the service default when unset
    #[serde(default)]
    pub confidence: Option<u32>,
    #[serde(default)]
    pub metric: Metric,
    #[serde(default)]
    pub minimum_detectable_effect: Option<f64>,
    #[serde(default)]
    pub power: Option<f64>,
    #[serde(default)]
    pub baseline_rate: Option<f64>,
}

impl ResultsQuery {
    /// Compare two variants over all time with service defaults.
    pub fn new(variant_a: impl Into<VariantId>, variant_b: impl Into<VariantId>) -> Self {
        Self {
            variant_a: variant_a.into(),
            variant_b: variant_b.into(),
            window: TimeWindow::unbounded(),
            confidence: None,
            metric: Metric::default(),
            minimum_detectable_effect: None,
            power: None,
            baseline_rate: None,
        }
    }

    #[must_use]
    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    #[must_use]
    pub fn with_confidence(mut self, percent: u32) -> Self {
        self.confidence = Some(percent);
        self
    }

    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }
}

/// Both summaries plus the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentResults {
    pub window: TimeWindow,
    pub variant_a: VariantSummary,
    pub variant_b: VariantSummary,
    pub significance: SignificanceResult,
}

/// The experiment engine's public operations.
///
/// `Send + Sync` and free of interior mutability; share one instance behind
/// an `Arc` across request handlers.
pub struct ExperimentService {
    assigner: Assigner,
    store: Arc<dyn EventStore>,
    aggregator: Aggregator,
    planning: PlanningParams,
    default_confidence: ConfidenceLevel,
}

impl ExperimentService {
    /// Create a service with default planning constants.
    pub fn new(catalog: VariantCatalog, store: Arc<dyn EventStore>) -> Self {
        Self {
            assigner: Assigner::new(Arc::new(catalog)),
            aggregator: Aggregator::new(Arc::clone(&store)),
            store,
            planning: PlanningParams::default(),
            default_confidence: ConfidenceLevel::default(),
        }
    }

    /// Create a service from a loaded engine config.
    ///
    /// Fails if the catalog is empty, malformed or does not match a pinned
    /// fingerprint, or if the planning defaults are out of range.
    pub fn from_config(config: &EngineConfig, store: Arc<dyn EventStore>) -> Result<Self> {
        let catalog = config.catalog.build()?;
        let planning = config.planning.to_params();
        planning.validate()?;
        let default_confidence = config.planning.confidence()?;

        info!(
            version = catalog.version(),
            variants = catalog.len(),
            fingerprint = %catalog.fingerprint(),
            "experiment catalog loaded"
        );

        Ok(Self {
            planning,
            default_confidence,
            ..Self::new(catalog, store)
        })
    }

    pub fn catalog(&self) -> &VariantCatalog {
        self.assigner.catalog()
    }

    /// Default planning constants applied when a query has no override.
    pub fn planning(&self) -> &PlanningParams {
        &self.planning
    }

    pub fn default_confidence(&self) -> ConfidenceLevel {
        self.default_confidence
    }

    /// `GetVariant`: the variant a user is bucketed into.
    pub fn get_variant(&self, user_id: i64) -> Result<Variant> {
        let variant = self.assigner.assign(user_id)?;
        debug!(user_id, variant_id = %variant.id, "variant assigned");
        Ok(variant.clone())
    }

    /// `ListVariants`: every variant in catalog order.
    pub fn list_variants(&self) -> &[Variant] {
        self.catalog().variants()
    }

    /// `TrackEvent` stamped with the current time.
    pub async fn track_event(
        &self,
        user_id: i64,
        subject_id: i64,
        event_type: &str,
    ) -> Result<TrackOutcome> {
        self.track_event_at(user_id, subject_id, event_type, Utc::now())
            .await
    }

    /// `TrackEvent` with an explicit timestamp.
    ///
    /// Input is validated before anything is written. A repeat of an already
    /// stored `(user, subject, event type)` succeeds and keeps the first
    /// timestamp.
    #[instrument(skip(self, occurred_at), level = "debug")]
    pub async fn track_event_at(
        &self,
        user_id: i64,
        subject_id: i64,
        event_type: &str,
        occurred_at: DateTime<Utc>,
    ) -> Result<TrackOutcome> {
        let event_type = EventType::parse(event_type)?;
        let user = UserId::parse(user_id)?;
        let variant_id = self.assigner.assign_user(user).id.clone();

        let event = FunnelEvent::new(
            user,
            variant_id.clone(),
            SubjectId(subject_id),
            event_type,
            occurred_at,
        );
        let outcome = self
            .store
            .record(&event)
            .await
            .map_err(|e| storage_unavailable("track event", e))?;

        match outcome {
            RecordOutcome::Recorded => info!(
                user_id,
                subject_id,
                %variant_id,
                %event_type,
                "event recorded"
            ),
            RecordOutcome::Duplicate => debug!(
                user_id,
                subject_id,
                %variant_id,
                %event_type,
                "duplicate event ignored"
            ),
        }

        Ok(TrackOutcome {
            success: true,
            variant_id,
            outcome,
        })
    }

    /// `GetResults`: summaries for two variants and their comparison.
    #[instrument(skip(self), fields(a = %query.variant_a, b = %query.variant_b), level = "debug")]
    pub async fn get_results(&self, query: &ResultsQuery) -> Result<ExperimentResults> {
        let level = match query.confidence {
            Some(percent) => ConfidenceLevel::from_percent(percent)?,
            None => self.default_confidence,
        };
        self.catalog().require(&query.variant_a)?;
        self.catalog().require(&query.variant_b)?;
        let planning = self.resolve_planning(
            query.minimum_detectable_effect,
            query.power,
            query.baseline_rate,
        )?;

        let variant_a = self
            .aggregator
            .summarize(&query.variant_a, &query.window)
            .await
            .map_err(|e| storage_unavailable("summarize variant", e))?;
        let variant_b = self
            .aggregator
            .summarize(&query.variant_b, &query.window)
            .await
            .map_err(|e| storage_unavailable("summarize variant", e))?;

        let significance = compare(&variant_a, &variant_b, level, query.metric, &planning)?;
        info!(
            a = %query.variant_a,
            b = %query.variant_b,
            metric = query.metric.as_str(),
            winner = ?significance.winner,
            p_value = significance.p_value,
            sample_size_reached = significance.sample_size_reached,
            "experiment compared"
        );

        Ok(ExperimentResults {
            window: query.window,
            variant_a,
            variant_b,
            significance,
        })
    }

    /// Merge per-call overrides over the configured planning constants.
    pub fn resolve_planning(
        &self,
        minimum_detectable_effect: Option<f64>,
        power: Option<f64>,
        baseline_rate: Option<f64>,
    ) -> Result<PlanningParams> {
        let planning = PlanningParams {
            minimum_detectable_effect: minimum_detectable_effect
                .unwrap_or(self.planning.minimum_detectable_effect),
            power: power.unwrap_or(self.planning.power),
            baseline_rate: baseline_rate.or(self.planning.baseline_rate),
        };
        planning.validate()?;
        Ok(planning)
    }
}

fn storage_unavailable(operation: &'static str, err: storage::Error) -> ExperimentError {
    warn!(operation, error = %err, "event store unavailable");
    ExperimentError::StorageUnavailable(err)
}
