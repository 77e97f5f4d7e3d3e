//! Show which variant a user is bucketed into

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use varlab_core::Assigner;

use crate::config::ConfigLoader;

/// Arguments for the assign command
#[derive(Debug, Args)]
pub struct AssignArgs {
    /// User ID to bucket
    #[arg(allow_negative_numbers = true)]
    pub user_id: i64,
}

/// Run the assign command. Assignment is pure, so no store is opened.
pub fn run(args: AssignArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let assigner = Assigner::new(Arc::new(config.catalog.build()?));

    let variant = assigner.assign(args.user_id)?;
    println!(
        "user {} -> {} ({}, {})",
        args.user_id,
        variant.id,
        variant.name,
        variant.format.as_str()
    );
    Ok(())
}
