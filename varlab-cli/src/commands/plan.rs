//! Sample-size planning without touching storage

use anyhow::Result;
use clap::Args;
use varlab_core::{ConfidenceLevel, PlanningParams, minimum_sample_size};

use super::percent;
use crate::config::ConfigLoader;

/// Arguments for the plan command
#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Expected baseline rate, e.g. 0.10
    #[arg(long)]
    pub baseline: f64,

    /// Smallest absolute lift worth detecting (config default when unset)
    #[arg(long)]
    pub effect: Option<f64>,

    /// Confidence level in percent: 90, 95 or 99
    #[arg(short, long)]
    pub confidence: Option<u32>,

    /// Statistical power (config default when unset)
    #[arg(long)]
    pub power: Option<f64>,
}

/// Per-variant sample size for the given arguments over config defaults
pub fn sample_size(args: &PlanArgs, defaults: &varlab_core::PlanningConfig) -> Result<u64> {
    let params = PlanningParams {
        minimum_detectable_effect: args.effect.unwrap_or(defaults.minimum_detectable_effect),
        power: args.power.unwrap_or(defaults.power),
        baseline_rate: Some(args.baseline),
    };
    params.validate()?;
    let level = ConfidenceLevel::from_percent(args.confidence.unwrap_or(defaults.default_confidence))?;

    Ok(minimum_sample_size(
        args.baseline,
        params.minimum_detectable_effect,
        level,
        params.power,
    ))
}

/// Run the plan command
pub fn run(args: PlanArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let n = sample_size(&args, &config.planning)?;

    println!(
        "baseline {}, detect +/-{}: {} users per variant",
        percent(args.baseline),
        percent(args.effect.unwrap_or(config.planning.minimum_detectable_effect)),
        n
    );
    Ok(())
}
