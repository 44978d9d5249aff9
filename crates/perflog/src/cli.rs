use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "perflog")]
#[command(version)]
#[command(about = "Inspect and manage recorded performance sessions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print stored sessions as a text report
    Report {
        /// Max sessions to include, most recent first
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },

    /// Show storage usage and summary statistics as JSON
    Status,

    /// Delete stored sessions
    Clear {
        /// Only evict sessions over the configured caps
        #[arg(long)]
        old_only: bool,
    },

    /// Run a synthetic concurrent workload against an in-memory logger
    Benchmark {
        /// Concurrent sessions
        #[arg(long, default_value_t = 32)]
        sessions: usize,

        /// Measured operations per session
        #[arg(long, default_value_t = 100)]
        operations: usize,
    },

    /// Print version information
    Version,
}
