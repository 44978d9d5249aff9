mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report { limit } => commands::report::run(limit),
        Commands::Status => commands::status::run(),
        Commands::Clear { old_only } => commands::clear::run(old_only),
        Commands::Benchmark {
            sessions,
            operations,
        } => commands::benchmark::run(sessions, operations),
        Commands::Version => commands::version::run(),
    }
}
