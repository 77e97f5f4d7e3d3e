//! Funnel event types.
//!
//! Events are the only state the engine persists. Each one is keyed by
//! `(user, subject, event type)`; the variant is derived from the user at
//! write time and stored alongside for aggregation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ExperimentError, Result};
use crate::types::{SubjectId, UserId, VariantId};

/// Step of the funnel an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// The variant was shown (impression)
    View,
    /// The user engaged with the variant
    Click,
    /// The user completed the target action, e.g. applied
    Convert,
}

impl EventType {
    /// Every funnel step, in funnel order.
    pub const ALL: [EventType; 3] = [EventType::View, EventType::Click, EventType::Convert];

    /// Convert to database string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Click => "click",
            Self::Convert => "convert",
        }
    }

    /// Parse a caller-supplied event type.
    ///
    /// `apply` is the wire name for a conversion and `impression` is
    /// accepted for views. Anything else is `InvalidInput`.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "view" | "impression" => Ok(Self::View),
            "click" => Ok(Self::Click),
            "apply" | "convert" | "conversion" => Ok(Self::Convert),
            other => Err(ExperimentError::invalid(format!(
                "unknown event type: {other:?} (expected view, click or apply)"
            ))),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One funnel event, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelEvent {
    pub user_id: UserId,
    pub variant_id: VariantId,
    pub subject_id: SubjectId,
    pub event_type: EventType,
    /// First time this `(user, subject, event type)` was seen
    pub occurred_at: DateTime<Utc>,
}

impl FunnelEvent {
    pub fn new(
        user_id: UserId,
        variant_id: VariantId,
        subject_id: SubjectId,
        event_type: EventType,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            variant_id,
            subject_id,
            event_type,
            occurred_at,
        }
    }
}

/// What an idempotent write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    /// First occurrence, a new row was stored
    Recorded,
    /// The natural key already existed; the stored first-touch row was kept
    Duplicate,
}
