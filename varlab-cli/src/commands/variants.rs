//! List the deployed variant catalog

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use crate::config::ConfigLoader;

/// Arguments for the variants command
#[derive(Debug, Args)]
pub struct VariantsArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Run the variants command. Reads config only, never storage.
pub fn run(args: VariantsArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let catalog = config.catalog.build()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Bucket").fg(Color::Cyan),
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Format").fg(Color::Cyan),
        Cell::new("Description").fg(Color::Cyan),
    ]);
    for (bucket, variant) in catalog.variants().iter().enumerate() {
        table.add_row(vec![
            Cell::new(bucket),
            Cell::new(variant.id.as_str()),
            Cell::new(&variant.name),
            Cell::new(variant.format.as_str()),
            Cell::new(&variant.description),
        ]);
    }

    println!("Catalog version {} ({})", catalog.version(), catalog.fingerprint());
    println!("{table}");
    Ok(())
}
