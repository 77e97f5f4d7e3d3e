//! Record a funnel event from the command line

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use varlab_core::RecordOutcome;

use crate::config::ConfigLoader;
use crate::retry::{RetryPolicy, with_retry};

/// Arguments for the track command
#[derive(Debug, Args)]
pub struct TrackArgs {
    /// User ID
    #[arg(allow_negative_numbers = true)]
    pub user_id: i64,

    /// Subject the exposure concerns (job, thread, ...)
    #[arg(allow_negative_numbers = true)]
    pub subject_id: i64,

    /// Event type: view, click or apply
    pub event_type: String,

    /// Event time as RFC 3339 (defaults to now)
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

/// Run the track command
pub async fn run(args: TrackArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let service = super::open_service(&config).await?;
    let occurred_at = args.at.unwrap_or_else(Utc::now);

    let outcome = with_retry(RetryPolicy::default_policy(), || {
        service.track_event_at(args.user_id, args.subject_id, &args.event_type, occurred_at)
    })
    .await?;

    match outcome.outcome {
        RecordOutcome::Recorded => println!(
            "recorded {} for user {} on subject {} (variant {})",
            args.event_type, args.user_id, args.subject_id, outcome.variant_id
        ),
        RecordOutcome::Duplicate => println!(
            "already recorded {} for user {} on subject {} (variant {})",
            args.event_type, args.user_id, args.subject_id, outcome.variant_id
        ),
    }
    Ok(())
}
