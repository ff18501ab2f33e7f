use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "placement", about = "Author and take adaptive placement tests")]
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
    /// Validate an assessment config and print its branch tree
    Validate(commands::validate::ValidateArgs),
    /// Show which branch a phase result would select
    Match(commands::match_cmd::MatchArgs),
    /// Take a placement test in the terminal
    Take(commands::take::TakeArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Validate(args) => commands::validate::run(args),
        Commands::Match(args) => commands::match_cmd::run(args),
        Commands::Take(args) => commands::take::run(args).await,
        Commands::Config(args) => commands::config::run(args),
    }
}
