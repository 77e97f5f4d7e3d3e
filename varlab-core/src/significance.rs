//! Fixed-horizon, two-sided, two-proportion significance testing.
//!
//! [`compare`] takes two [`VariantSummary`] values and returns a
//! [`SignificanceResult`]. Zero counts never raise: an empty arm produces
//! [`Winner::InsufficientData`] with `p_value = 1`.
//!
//! The normal CDF uses the Abramowitz & Stegun 26.2.17 rational
//! approximation (absolute error below 7.5e-8). That is dashboard-grade;
//! reports needing |z| > 8 precision should swap in a library erfc.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ExperimentError, Result};
use crate::metrics::VariantSummary;

/// Default minimum detectable absolute effect used for planning (5 points).
pub const DEFAULT_MINIMUM_DETECTABLE_EFFECT: f64 = 0.05;

/// Default statistical power used for planning.
pub const DEFAULT_POWER: f64 = 0.80;

/// Planning falls back to the maximum-variance rate when the baseline is 0 or 1.
const DEGENERATE_BASELINE_FALLBACK: f64 = 0.5;

/// Supported two-tailed confidence levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ConfidenceLevel {
    /// 90% (alpha = 0.10)
    Ninety,
    /// 95% (alpha = 0.05)
    #[default]
    NinetyFive,
    /// 99% (alpha = 0.01)
    NinetyNine,
}

impl ConfidenceLevel {
    /// Parse a percentage. Only 90, 95 and 99 are supported.
    pub fn from_percent(percent: u32) -> Result<Self> {
        match percent {
            90 => Ok(Self::Ninety),
            95 => Ok(Self::NinetyFive),
            99 => Ok(Self::NinetyNine),
            other => Err(ExperimentError::invalid(format!(
                "unsupported confidence level: {other} (expected 90, 95 or 99)"
            ))),
        }
    }

    #[must_use]
    pub fn percent(&self) -> u32 {
        match self {
            Self::Ninety => 90,
            Self::NinetyFive => 95,
            Self::NinetyNine => 99,
        }
    }

    /// Significance threshold: `1 - level/100`.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        match self {
            Self::Ninety => 0.10,
            Self::NinetyFive => 0.05,
            Self::NinetyNine => 0.01,
        }
    }

    /// Two-tailed critical z-value.
    #[must_use]
    pub fn critical_value(&self) -> f64 {
        match self {
            Self::Ninety => 1.645,
            Self::NinetyFive => 1.960,
            Self::NinetyNine => 2.576,
        }
    }
}

impl TryFrom<u32> for ConfidenceLevel {
    type Error = ExperimentError;

    fn try_from(percent: u32) -> Result<Self> {
        Self::from_percent(percent)
    }
}

impl From<ConfidenceLevel> for u32 {
    fn from(level: ConfidenceLevel) -> Self {
        level.percent()
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Which funnel rate is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// clicks / impressions
    #[default]
    ClickThrough,
    /// conversions / clicks
    Conversion,
}

impl Metric {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClickThrough => "click_through",
            Self::Conversion => "conversion",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "click_through" | "ctr" | "click" => Ok(Self::ClickThrough),
            "conversion" | "apply" => Ok(Self::Conversion),
            other => Err(ExperimentError::invalid(format!(
                "unknown metric: {other:?} (expected click_through or conversion)"
            ))),
        }
    }

    /// `(trials, successes)` for this metric.
    ///
    /// Successes are capped at trials: a window can hold a click whose view
    /// fell before `start`, and a rate above 1 has no binomial variance.
    #[must_use]
    pub fn counts(&self, summary: &VariantSummary) -> (u64, u64) {
        let (trials, successes) = match self {
            Self::ClickThrough => (summary.impressions, summary.clicks),
            Self::Conversion => (summary.clicks, summary.conversions),
        };
        (trials, successes.min(trials))
    }
}

/// Sample-size planning inputs. Every field is overridable per call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanningParams {
    /// Smallest absolute rate difference worth detecting, as a fraction
    pub minimum_detectable_effect: f64,
    /// Probability of detecting an effect of that size
    pub power: f64,
    /// Assumed baseline rate; when unset the larger observed rate is used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_rate: Option<f64>,
}

impl Default for PlanningParams {
    fn default() -> Self {
        Self {
            minimum_detectable_effect: DEFAULT_MINIMUM_DETECTABLE_EFFECT,
            power: DEFAULT_POWER,
            baseline_rate: None,
        }
    }
}

impl PlanningParams {
    pub fn validate(&self) -> Result<()> {
        let effect = self.minimum_detectable_effect;
        if !(effect > 0.0 && effect < 1.0) {
            return Err(ExperimentError::invalid(format!(
                "minimum detectable effect must be in (0, 1), got {effect}"
            )));
        }
        if !(self.power > 0.0 && self.power < 1.0) {
            return Err(ExperimentError::invalid(format!(
                "power must be in (0, 1), got {}",
                self.power
            )));
        }
        if let Some(baseline) = self.baseline_rate
            && !(0.0..=1.0).contains(&baseline)
        {
            return Err(ExperimentError::invalid(format!(
                "baseline rate must be in [0, 1], got {baseline}"
            )));
        }
        Ok(())
    }
}

/// Outcome of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    /// First variant has the significantly higher rate
    A,
    /// Second variant has the significantly higher rate
    B,
    /// No detectable difference with enough data to trust that
    Tie,
    /// Not significant yet and the planned sample size is not reached
    InsufficientData,
}

impl Winner {
    /// The same verdict with A and B swapped.
    #[must_use]
    pub fn mirrored(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
            other => other,
        }
    }
}

/// Interval for the rate difference `rate_a - rate_b`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub const ZERO: Self = Self {
        lower: 0.0,
        upper: 0.0,
    };

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Verdict for one A/B comparison. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificanceResult {
    pub metric: Metric,
    pub confidence_level: ConfidenceLevel,
    pub rate_a: f64,
    pub rate_b: f64,
    /// Signed `(rate_a - rate_b) / pooled_se`; 0 when undefined
    pub z_score: f64,
    pub p_value: f64,
    pub confidence_interval: ConfidenceInterval,
    /// `|rate_a - rate_b|` as a fraction
    pub effect_size: f64,
    pub winner: Winner,
    /// Planned per-variant sample size
    pub minimum_sample_size: u64,
    /// Smaller of the two arms' trial counts
    pub current_sample_size: u64,
    pub sample_size_reached: bool,
}

impl SignificanceResult {
    #[must_use]
    pub fn is_significant(&self) -> bool {
        self.p_value < self.confidence_level.alpha()
    }

    /// Significant results go to the higher rate; otherwise a reached
    /// sample size means a tie.
    fn verdict(&self) -> Winner {
        if self.is_significant() {
            if self.rate_a > self.rate_b {
                Winner::A
            } else if self.rate_b > self.rate_a {
                Winner::B
            } else {
                Winner::Tie
            }
        } else if self.sample_size_reached {
            Winner::Tie
        } else {
            Winner::InsufficientData
        }
    }
}

/// Two-proportion z-test between two variant summaries.
///
/// Only invalid planning parameters produce an error; any combination of
/// counts yields a well-defined result.
pub fn compare(
    a: &VariantSummary,
    b: &VariantSummary,
    level: ConfidenceLevel,
    metric: Metric,
    planning: &PlanningParams,
) -> Result<SignificanceResult> {
    planning.validate()?;

    let (n1, x1) = metric.counts(a);
    let (n2, x2) = metric.counts(b);
    let current_sample_size = n1.min(n2);

    if n1 == 0 || n2 == 0 {
        let rate_a = proportion(x1, n1);
        let rate_b = proportion(x2, n2);
        let baseline = planning.baseline_rate.unwrap_or(rate_a.max(rate_b));
        return Ok(SignificanceResult {
            metric,
            confidence_level: level,
            rate_a,
            rate_b,
            z_score: 0.0,
            p_value: 1.0,
            confidence_interval: ConfidenceInterval::ZERO,
            effect_size: (rate_a - rate_b).abs(),
            winner: Winner::InsufficientData,
            minimum_sample_size: minimum_sample_size(
                baseline,
                planning.minimum_detectable_effect,
                level,
                planning.power,
            ),
            current_sample_size,
            sample_size_reached: false,
        });
    }

    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let p1 = x1 as f64 / n1f;
    let p2 = x2 as f64 / n2f;

    let pooled = (x1 + x2) as f64 / (n1f + n2f);
    let se = (pooled * (1.0 - pooled) * (1.0 / n1f + 1.0 / n2f)).sqrt();
    let (z_score, p_value) = if se > 0.0 {
        let z = (p1 - p2) / se;
        (z, two_tailed_p_value(z))
    } else {
        // pooled rate of exactly 0 or 1: no variance, nothing to detect
        (0.0, 1.0)
    };

    let diff = p1 - p2;
    let se_diff = (p1 * (1.0 - p1) / n1f + p2 * (1.0 - p2) / n2f).sqrt();
    let margin = level.critical_value() * se_diff;
    let confidence_interval = ConfidenceInterval {
        lower: diff - margin,
        upper: diff + margin,
    };

    let baseline = planning.baseline_rate.unwrap_or(p1.max(p2));
    let minimum_sample_size = minimum_sample_size(
        baseline,
        planning.minimum_detectable_effect,
        level,
        planning.power,
    );
    let sample_size_reached = current_sample_size >= minimum_sample_size;

    let mut result = SignificanceResult {
        metric,
        confidence_level: level,
        rate_a: p1,
        rate_b: p2,
        z_score,
        p_value,
        confidence_interval,
        effect_size: diff.abs(),
        winner: Winner::InsufficientData,
        minimum_sample_size,
        current_sample_size,
        sample_size_reached,
    };
    result.winner = result.verdict();
    Ok(result)
}

/// Per-variant sample size needed to detect `effect` at `level` with `power`.
///
/// `n = ceil((z_alpha + z_beta)^2 * 2 * p(1 - p) / effect^2)`. A baseline of
/// exactly 0 or 1 has no variance to plan with, so the maximum-variance rate
/// 0.5 is used instead. Callers are expected to pass a validated effect and
/// power (see [`PlanningParams::validate`]).
#[must_use]
pub fn minimum_sample_size(baseline: f64, effect: f64, level: ConfidenceLevel, power: f64) -> u64 {
    if effect.is_nan() || effect <= 0.0 {
        return u64::MAX;
    }
    let p_bar = if baseline > 0.0 && baseline < 1.0 {
        baseline
    } else {
        DEGENERATE_BASELINE_FALLBACK
    };
    let z_alpha = level.critical_value();
    let z_beta = normal_quantile(power);
    let n = (z_alpha + z_beta).powi(2) * 2.0 * p_bar * (1.0 - p_bar) / (effect * effect);
    n.ceil().max(1.0) as u64
}

/// Standard normal CDF, Abramowitz & Stegun 26.2.17.
#[must_use]
pub fn normal_cdf(z: f64) -> f64 {
    if z < 0.0 {
        return 1.0 - normal_cdf(-z);
    }
    let t = 1.0 / (1.0 + 0.231_641_9 * z);
    let d = 0.398_942_3 * (-0.5 * z * z).exp();
    let tail = d
        * t
        * (0.319_381_5
            + t * (-0.356_563_8 + t * (1.781_478 + t * (-1.821_256 + t * 1.330_274))));
    1.0 - tail
}

/// `2 * (1 - Φ(|z|))`, clamped to `[0, 1]`.
fn two_tailed_p_value(z: f64) -> f64 {
    (2.0 * (1.0 - normal_cdf(z.abs()))).clamp(0.0, 1.0)
}

/// Inverse standard normal CDF, Abramowitz & Stegun 26.2.23 (|error| < 4.5e-4).
fn normal_quantile(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    if p < 0.5 {
        -upper_tail_quantile(p)
    } else {
        upper_tail_quantile(1.0 - p)
    }
}

/// z such that the upper-tail probability beyond z is `q`, for `q` in (0, 0.5].
fn upper_tail_quantile(q: f64) -> f64 {
    let t = (-2.0 * q.ln()).sqrt();
    let numerator = 2.515_517 + t * (0.802_853 + t * 0.010_328);
    let denominator = 1.0 + t * (1.432_788 + t * (0.189_269 + t * 0.001_308));
    t - numerator / denominator
}

fn proportion(successes: u64, trials: u64) -> f64 {
    if trials == 0 {
        0.0
    } else {
        successes as f64 / trials as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VariantId;

    fn summary(id: &str, impressions: u64, clicks: u64) -> VariantSummary {
        VariantSummary::new(VariantId::new(id), impressions, clicks, 0)
    }

    fn ctr(a: &VariantSummary, b: &VariantSummary, level: ConfidenceLevel) -> SignificanceResult {
        compare(a, b, level, Metric::ClickThrough, &PlanningParams::default()).unwrap()
    }

    #[test]
    fn normal_cdf_matches_reference_points() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((normal_cdf(1.96) - 0.975_002_1).abs() < 1e-6);
        assert!((normal_cdf(-1.0) - 0.158_655_3).abs() < 1e-6);
        assert!((normal_cdf(3.0) - 0.998_650_1).abs() < 1e-6);
        assert!((normal_cdf(1.3) + normal_cdf(-1.3) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn normal_cdf_saturates_for_extreme_scores() {
        assert_eq!(normal_cdf(40.0), 1.0);
        assert_eq!(two_tailed_p_value(40.0), 0.0);
        assert_eq!(two_tailed_p_value(-40.0), 0.0);
    }

    #[test]
    fn normal_quantile_inverts_cdf() {
        assert!((normal_quantile(0.975) - 1.960).abs() < 1e-3);
        assert!((normal_quantile(0.80) - 0.8416).abs() < 1e-3);
        assert!((normal_quantile(0.5)).abs() < 1e-3);
        assert!((normal_quantile(0.1) + 1.2816).abs() < 1e-3);
    }

    #[test]
    fn confidence_levels_map_to_critical_values() {
        assert_eq!(ConfidenceLevel::from_percent(90).unwrap().critical_value(), 1.645);
        assert_eq!(ConfidenceLevel::from_percent(95).unwrap().critical_value(), 1.960);
        assert_eq!(ConfidenceLevel::from_percent(99).unwrap().critical_value(), 2.576);
        assert!((ConfidenceLevel::NinetyNine.alpha() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn unsupported_confidence_level_is_invalid_input() {
        for percent in [0, 80, 96, 100] {
            let err = ConfidenceLevel::from_percent(percent).unwrap_err();
            assert!(matches!(err, ExperimentError::InvalidInput(_)));
        }
        assert!(serde_json::from_str::<ConfidenceLevel>("80").is_err());
        assert_eq!(
            serde_json::from_str::<ConfidenceLevel>("99").unwrap(),
            ConfidenceLevel::NinetyNine
        );
    }

    #[test]
    fn known_value_favors_b() {
        let a = summary("a", 1000, 100);
        let b = summary("b", 1000, 140);

        let result = ctr(&a, &b, ConfidenceLevel::NinetyFive);

        assert_eq!(result.winner, Winner::B);
        assert!(result.p_value < 0.05, "p = {}", result.p_value);
        assert!((result.p_value - 0.0023).abs() < 0.01, "p = {}", result.p_value);
        assert!((result.z_score + 2.752).abs() < 0.01, "z = {}", result.z_score);
        assert!((result.effect_size - 0.04).abs() < 1e-12);
        assert!(result.confidence_interval.upper < 0.0);
        assert!(result.confidence_interval.contains(-0.04));
        assert!(result.sample_size_reached);
        assert_eq!(result.current_sample_size, 1000);
    }

    #[test]
    fn comparison_is_symmetric() {
        let a = summary("a", 1200, 130);
        let b = summary("b", 900, 125);

        let ab = ctr(&a, &b, ConfidenceLevel::NinetyFive);
        let ba = ctr(&b, &a, ConfidenceLevel::NinetyFive);

        assert_eq!(ab.p_value, ba.p_value);
        assert_eq!(ab.effect_size, ba.effect_size);
        assert_eq!(ab.z_score, -ba.z_score);
        assert!((ab.confidence_interval.lower + ba.confidence_interval.upper).abs() < 1e-12);
        assert!((ab.confidence_interval.upper + ba.confidence_interval.lower).abs() < 1e-12);
        assert_eq!(ab.winner, ba.winner.mirrored());
        assert_eq!(ab.minimum_sample_size, ba.minimum_sample_size);
    }

    #[test]
    fn zero_impressions_is_insufficient_data() {
        let empty = summary("a", 0, 0);
        let full = summary("b", 5000, 900);

        for (x, y) in [(&empty, &full), (&full, &empty), (&empty, &empty)] {
            let result = ctr(x, y, ConfidenceLevel::NinetyFive);
            assert_eq!(result.winner, Winner::InsufficientData);
            assert_eq!(result.p_value, 1.0);
            assert_eq!(result.confidence_interval, ConfidenceInterval::ZERO);
            assert!(!result.sample_size_reached);
            assert_eq!(result.current_sample_size, 0);
            assert!(result.minimum_sample_size > 0);
        }
    }

    #[test]
    fn conversion_metric_uses_clicks_as_trials() {
        let a = VariantSummary::new(VariantId::new("a"), 1000, 0, 0);
        let b = VariantSummary::new(VariantId::new("b"), 1000, 200, 50);

        let result = compare(
            &a,
            &b,
            ConfidenceLevel::NinetyFive,
            Metric::Conversion,
            &PlanningParams::default(),
        )
        .unwrap();

        assert_eq!(result.winner, Winner::InsufficientData);
        assert_eq!(result.rate_b, 0.25);
        assert_eq!(result.metric, Metric::Conversion);
    }

    #[test]
    fn more_clicks_than_views_stays_finite() {
        let a = VariantSummary::new(VariantId::new("a"), 10, 15, 0);
        let b = summary("b", 100, 10);

        let result = ctr(&a, &b, ConfidenceLevel::NinetyFive);

        assert_eq!(result.rate_a, 1.0);
        assert!(result.confidence_interval.lower.is_finite());
        assert!(result.confidence_interval.upper.is_finite());
        assert!(result.confidence_interval.lower <= result.confidence_interval.upper);
        assert!(result.z_score.is_finite());
        assert!((0.0..=1.0).contains(&result.p_value));

        let json = serde_json::to_string(&result).unwrap();
        let back: SignificanceResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn conversions_beyond_clicks_are_capped() {
        let a = VariantSummary::new(VariantId::new("a"), 100, 4, 9);

        assert_eq!(Metric::Conversion.counts(&a), (4, 4));
        assert_eq!(Metric::ClickThrough.counts(&a), (100, 4));
    }

    #[test]
    fn zero_variance_pool_has_p_value_one() {
        let small_a = summary("a", 100, 0);
        let small_b = summary("b", 100, 0);
        let small = ctr(&small_a, &small_b, ConfidenceLevel::NinetyFive);
        assert_eq!(small.p_value, 1.0);
        assert_eq!(small.z_score, 0.0);
        assert_eq!(small.winner, Winner::InsufficientData);

        let large_a = summary("a", 5000, 5000);
        let large_b = summary("b", 5000, 5000);
        let large = ctr(&large_a, &large_b, ConfidenceLevel::NinetyFive);
        assert_eq!(large.p_value, 1.0);
        assert_eq!(large.winner, Winner::Tie);
    }

    #[test]
    fn equal_rates_are_never_a_win() {
        let a = summary("a", 10_000, 1_000);
        let b = summary("b", 10_000, 1_000);

        let result = ctr(&a, &b, ConfidenceLevel::Ninety);

        assert_eq!(result.effect_size, 0.0);
        assert!(!result.is_significant());
        assert_eq!(result.winner, Winner::Tie);
    }

    #[test]
    fn small_insignificant_sample_is_insufficient_data() {
        let a = summary("a", 50, 5);
        let b = summary("b", 50, 6);

        let result = ctr(&a, &b, ConfidenceLevel::NinetyFive);

        assert!(!result.is_significant());
        assert!(!result.sample_size_reached);
        assert_eq!(result.winner, Winner::InsufficientData);
    }

    #[test]
    fn large_insignificant_sample_is_a_tie() {
        let a = summary("a", 20_000, 2_000);
        let b = summary("b", 20_000, 2_010);

        let result = ctr(&a, &b, ConfidenceLevel::NinetyFive);

        assert!(!result.is_significant());
        assert!(result.sample_size_reached);
        assert_eq!(result.winner, Winner::Tie);
    }

    #[test]
    fn sample_size_for_reference_inputs() {
        let n = minimum_sample_size(0.14, 0.05, ConfidenceLevel::NinetyFive, 0.80);
        assert!((750..=760).contains(&n), "n = {n}");
    }

    #[test]
    fn sample_size_shrinks_as_effect_grows() {
        let level = ConfidenceLevel::NinetyFive;
        let small = minimum_sample_size(0.10, 0.02, level, 0.80);
        let medium = minimum_sample_size(0.10, 0.05, level, 0.80);
        let large = minimum_sample_size(0.10, 0.10, level, 0.80);

        assert!(small > medium, "{small} vs {medium}");
        assert!(medium > large, "{medium} vs {large}");
    }

    #[test]
    fn sample_size_shrinks_as_confidence_drops() {
        let n99 = minimum_sample_size(0.10, 0.05, ConfidenceLevel::NinetyNine, 0.80);
        let n95 = minimum_sample_size(0.10, 0.05, ConfidenceLevel::NinetyFive, 0.80);
        let n90 = minimum_sample_size(0.10, 0.05, ConfidenceLevel::Ninety, 0.80);

        assert!(n99 > n95);
        assert!(n95 > n90);
    }

    #[test]
    fn sample_size_grows_with_power() {
        let level = ConfidenceLevel::NinetyFive;
        assert!(
            minimum_sample_size(0.10, 0.05, level, 0.90)
                > minimum_sample_size(0.10, 0.05, level, 0.80)
        );
    }

    #[test]
    fn degenerate_baseline_plans_with_max_variance() {
        let level = ConfidenceLevel::NinetyFive;
        let zero = minimum_sample_size(0.0, 0.05, level, 0.80);
        let half = minimum_sample_size(0.5, 0.05, level, 0.80);
        assert_eq!(zero, half);
    }

    #[test]
    fn caller_baseline_overrides_observed_rate() {
        let a = summary("a", 1000, 100);
        let b = summary("b", 1000, 140);
        let planning = PlanningParams {
            baseline_rate: Some(0.5),
            ..Default::default()
        };

        let result = compare(&a, &b, ConfidenceLevel::NinetyFive, Metric::ClickThrough, &planning)
            .unwrap();

        assert_eq!(
            result.minimum_sample_size,
            minimum_sample_size(0.5, 0.05, ConfidenceLevel::NinetyFive, 0.80)
        );
        assert!(!result.sample_size_reached);
        // still significant, so the verdict does not depend on the plan
        assert_eq!(result.winner, Winner::B);
    }

    #[test]
    fn invalid_planning_params_are_rejected() {
        let a = summary("a", 10, 1);
        let b = summary("b", 10, 2);

        for planning in [
            PlanningParams {
                minimum_detectable_effect: 0.0,
                ..Default::default()
            },
            PlanningParams {
                power: 1.0,
                ..Default::default()
            },
            PlanningParams {
                baseline_rate: Some(1.5),
                ..Default::default()
            },
        ] {
            let err = compare(&a, &b, ConfidenceLevel::NinetyFive, Metric::ClickThrough, &planning)
                .unwrap_err();
            assert!(matches!(err, ExperimentError::InvalidInput(_)));
        }
    }

    #[test]
    fn wider_confidence_gives_wider_interval() {
        let a = summary("a", 1000, 100);
        let b = summary("b", 1000, 140);

        let ci90 = ctr(&a, &b, ConfidenceLevel::Ninety).confidence_interval;
        let ci99 = ctr(&a, &b, ConfidenceLevel::NinetyNine).confidence_interval;

        assert!(ci99.upper - ci99.lower > ci90.upper - ci90.lower);
    }

    #[test]
    fn winner_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Winner::InsufficientData).unwrap(),
            "\"insufficient_data\""
        );
        assert_eq!(serde_json::to_string(&Winner::A).unwrap(), "\"a\"");
    }
}
