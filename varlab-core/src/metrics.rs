//! Funnel metrics derived from stored events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ExperimentError, Result};
use crate::types::VariantId;

/// An optional time window over event timestamps.
///
/// Uses a half-open interval `[start, end)` - start is inclusive, end is exclusive.
/// A missing bound leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// Build a window, rejecting `start >= end`.
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Result<Self> {
        if let (Some(s), Some(e)) = (start, end)
            && s >= e
        {
            return Err(ExperimentError::invalid(format!(
                "time window start {} must be before end {}",
                s.to_rfc3339(),
                e.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// Window covering every event.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Returns true if the given instant falls within this window.
    ///
    /// Uses half-open interval semantics: `[start, end)`
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start.is_none_or(|s| instant >= s) && self.end.is_none_or(|e| instant < e)
    }

    /// Bounds as epoch milliseconds for storage queries, open sides widened to the i64 range.
    #[must_use]
    pub fn bounds_millis(&self) -> (i64, i64) {
        (
            self.start.map_or(i64::MIN, |s| s.timestamp_millis()),
            self.end.map_or(i64::MAX, |e| e.timestamp_millis()),
        )
    }
}

/// A ratio that may have an empty denominator.
///
/// When undefined the value is reported as `0.0` and `defined` is false, so
/// dashboards can render "no data" instead of a misleading 0%. The value is
/// capped at 1 when a window holds later funnel steps whose earlier step fell
/// outside it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub value: f64,
    pub defined: bool,
}

impl Rate {
    #[must_use]
    pub fn of(numerator: u64, denominator: u64) -> Self {
        if denominator == 0 {
            Self {
                value: 0.0,
                defined: false,
            }
        } else {
            Self {
                value: numerator.min(denominator) as f64 / denominator as f64,
                defined: true,
            }
        }
    }
}

/// Distinct-pair funnel counts for one variant over one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSummary {
    pub variant_id: VariantId,
    /// Distinct (user, subject) pairs that saw the variant
    pub impressions: u64,
    /// Distinct (user, subject) pairs that clicked
    pub clicks: u64,
    /// Distinct (user, subject) pairs that converted
    pub conversions: u64,
    /// `clicks / impressions`
    pub click_through_rate: Rate,
    /// `conversions / clicks`
    pub conversion_rate: Rate,
}

impl VariantSummary {
    pub fn new(variant_id: VariantId, impressions: u64, clicks: u64, conversions: u64) -> Self {
        Self {
            variant_id,
            impressions,
            clicks,
            conversions,
            click_through_rate: Rate::of(clicks, impressions),
            conversion_rate: Rate::of(conversions, clicks),
        }
    }

    /// A summary with no events at all.
    pub fn empty(variant_id: VariantId) -> Self {
        Self::new(variant_id, 0, 0, 0)
    }
}
