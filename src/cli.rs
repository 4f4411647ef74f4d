//! CLI definitions for LeadFlow.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// LeadFlow CLI.
#[derive(Parser)]
#[command(name = "leadflow")]
#[command(about = "Throttled, resumable outreach automation")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.leadflow/config.toml)
    #[arg(short, long, global = true, env = "LEADFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Process a target list for one scope
    Run {
        /// Scope (group) identifier
        #[arg(long)]
        scope: String,

        /// JSON file with an array of targets
        #[arg(long)]
        targets: PathBuf,

        /// Start from index 0 instead of the last processed index
        #[arg(long)]
        restart: bool,

        /// Log messages instead of sending them
        #[arg(long, conflicts_with = "exec")]
        dry_run: bool,

        /// Shell command that performs one interaction
        #[arg(long)]
        exec: Option<String>,

        /// JSON file with runtime options (camelCase)
        #[arg(long)]
        options: Option<PathBuf>,

        /// Text file holding the current page signal, scanned for failure markers
        #[arg(long)]
        signal_file: Option<PathBuf>,
    },

    /// Interaction history commands
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Persisted rate-limit settings
    Limits {
        #[command(subcommand)]
        action: LimitsAction,
    },

    /// Move legacy storage keys into the current schema
    Migrate,
}

#[derive(Subcommand)]
pub(crate) enum HistoryAction {
    /// Show totals and per-scope summaries
    Stats {
        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show recent interactions of a scope
    Show {
        /// Scope identifier
        #[arg(long)]
        scope: String,

        /// Maximum number of records
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Clear one scope's history and cursor
    Reset {
        /// Scope identifier
        #[arg(long)]
        scope: String,
    },

    /// Clear all history
    ResetAll {
        /// Skip confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub(crate) enum LimitsAction {
    /// Show the effective limits
    Show,

    /// Persist new limits
    Set {
        #[arg(long)]
        max_per_hour: Option<u32>,

        #[arg(long)]
        max_per_day: Option<u32>,

        /// Delay between interactions in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },
}
