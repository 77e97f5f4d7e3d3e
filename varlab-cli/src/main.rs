use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod retry;

#[derive(Parser)]
#[command(name = "varlab", about = "Message variant experiments with significance testing")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which variant a user sees
    Assign(commands::assign::AssignArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
    /// Sample size needed to detect an effect
    Plan(commands::plan::PlanArgs),
    /// Compare two variants
    Results(commands::results::ResultsArgs),
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Record a view, click or apply event
    Track(commands::track::TrackArgs),
    /// List the variant catalog
    Variants(commands::variants::VariantsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Assign(args) => commands::assign::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Plan(args) => commands::plan::run(args),
        Commands::Results(args) => commands::results::run(args).await,
        Commands::Serve(args) => commands::serve::run(args).await,
        Commands::Track(args) => commands::track::run(args).await,
        Commands::Variants(args) => commands::variants::run(args),
    }
}
