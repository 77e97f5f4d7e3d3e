//! Compare two variants

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use varlab_core::{ExperimentResults, Metric, ResultsQuery, TimeWindow, VariantSummary, Winner};

use super::percent;
use crate::config::ConfigLoader;
use crate::retry::{RetryPolicy, with_retry};

/// Arguments for the results command
#[derive(Debug, Args)]
pub struct ResultsArgs {
    /// First variant ID
    pub a: String,

    /// Second variant ID
    pub b: String,

    /// Only count events at or after this time (RFC 3339)
    #[arg(long)]
    pub start: Option<DateTime<Utc>>,

    /// Only count events before this time (RFC 3339)
    #[arg(long)]
    pub end: Option<DateTime<Utc>>,

    /// Confidence level in percent: 90, 95 or 99
    #[arg(short, long)]
    pub confidence: Option<u32>,

    /// Metric to compare: click_through or conversion
    #[arg(short, long, default_value = "click_through")]
    pub metric: String,

    /// Minimum detectable effect for sample-size planning
    #[arg(long)]
    pub effect: Option<f64>,

    /// Statistical power for sample-size planning
    #[arg(long)]
    pub power: Option<f64>,

    /// Assumed baseline rate for sample-size planning
    #[arg(long)]
    pub baseline: Option<f64>,

    /// Print JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

impl ResultsArgs {
    fn to_query(&self) -> varlab_core::Result<ResultsQuery> {
        let mut query = ResultsQuery::new(self.a.as_str(), self.b.as_str())
            .with_window(TimeWindow::new(self.start, self.end)?)
            .with_metric(Metric::parse(&self.metric)?);
        query.confidence = self.confidence;
        query.minimum_detectable_effect = self.effect;
        query.power = self.power;
        query.baseline_rate = self.baseline;
        Ok(query)
    }
}

/// Run the results command
pub async fn run(args: ResultsArgs) -> Result<()> {
    let query = args.to_query()?;
    let config = ConfigLoader::load()?;
    let service = super::open_service(&config).await?;

    let results = with_retry(RetryPolicy::default_policy(), || service.get_results(&query)).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_results(&results);
    }
    Ok(())
}

fn print_results(results: &ExperimentResults) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Variant").fg(Color::Cyan),
        Cell::new("Views").fg(Color::Cyan),
        Cell::new("Clicks").fg(Color::Cyan),
        Cell::new("Applies").fg(Color::Cyan),
        Cell::new("CTR").fg(Color::Cyan),
        Cell::new("Conversion").fg(Color::Cyan),
    ]);
    for summary in [&results.variant_a, &results.variant_b] {
        table.add_row(summary_row(summary));
    }
    println!("{table}");

    let sig = &results.significance;
    let verdict = match sig.winner {
        Winner::A => format!("{} wins", results.variant_a.variant_id),
        Winner::B => format!("{} wins", results.variant_b.variant_id),
        Winner::Tie => "no significant difference".to_string(),
        Winner::InsufficientData => "insufficient data".to_string(),
    };
    println!(
        "{} at {}: z = {:.3}, p = {:.4}, effect = {}",
        sig.metric.as_str(),
        sig.confidence_level,
        sig.z_score,
        sig.p_value,
        percent(sig.effect_size)
    );
    println!(
        "difference CI: [{}, {}]{}",
        percent(sig.confidence_interval.lower),
        percent(sig.confidence_interval.upper),
        if sig.confidence_interval.contains(0.0) {
            ""
        } else {
            " (excludes zero)"
        }
    );
    println!(
        "sample size: {} of {} per variant{}",
        sig.current_sample_size,
        sig.minimum_sample_size,
        if sig.sample_size_reached { " (reached)" } else { "" }
    );
    println!("verdict: {verdict}");
}

fn summary_row(summary: &VariantSummary) -> Vec<Cell> {
    let rate = |r: varlab_core::Rate| {
        if r.defined {
            percent(r.value)
        } else {
            "-".to_string()
        }
    };
    vec![
        Cell::new(summary.variant_id.as_str()),
        Cell::new(summary.impressions),
        Cell::new(summary.clicks),
        Cell::new(summary.conversions),
        Cell::new(rate(summary.click_through_rate)),
        Cell::new(rate(summary.conversion_rate)),
    ]
}
