//! Variant assignment and significance engine for variant-lab.
//!
//! This crate decides which variant of a message a user sees, records the
//! funnel events for that exposure and tells whether the difference between
//! two variants is statistically meaningful.
//!
//! # Architecture
//!
//! - **Catalog** ([`VariantCatalog`]) is the versioned, deploy-time list of variants
//! - **Assigner** ([`Assigner`]) buckets users with `user_id mod N`, no stored state
//! - **Storage** ([`EventStore`]) upserts funnel events on their natural key
//! - **Aggregator** ([`Aggregator`]) turns distinct-pair counts into [`VariantSummary`] values
//! - **Significance** ([`compare`]) runs the two-proportion z-test
//! - **Service** ([`ExperimentService`]) is the transport-agnostic API surface
//!
//! Summaries and comparisons are never persisted; they are recomputed from the
//! event table on every query.

mod aggregate;
mod assign;
mod catalog;
pub mod config;
mod error;
mod events;
mod metrics;
mod service;
pub mod significance;
pub mod storage;
mod types;

// Catalog and assignment
pub use assign::Assigner;
pub use catalog::{Variant, VariantCatalog, VariantFormat};

// Aggregation
pub use aggregate::Aggregator;

// Configuration
pub use config::{CatalogConfig, EngineConfig, PlanningConfig};

// Error types
pub use error::{ExperimentError, Result};

// Event types
pub use events::{EventType, FunnelEvent, RecordOutcome};

// Metric types
pub use metrics::{Rate, TimeWindow, VariantSummary};

// Significance testing
pub use significance::{
    ConfidenceInterval, ConfidenceLevel, Metric, PlanningParams, SignificanceResult, Winner,
    compare, minimum_sample_size, normal_cdf,
};

// Service (API layer)
pub use service::{ExperimentResults, ExperimentService, ResultsQuery, TrackOutcome};

// ID types
pub use types::{SubjectId, UserId, VariantId};

// Storage traits (re-export from storage module)
pub use storage::{EventStore, TursoEventStore};
