//! LeadFlow - throttled, resumable outreach automation
//!
//! Main entry point for the LeadFlow CLI.

mod adapters;
mod cli;
mod cmd_history;
mod cmd_run;

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use leadflow_config::{Config, ConfigLoader, ConfigValidator};
use leadflow_history::HistoryStore;
use leadflow_store::{
    FileKeyValueStore, KeyValueStore, MigrationOutcome, load_rate_limit_config,
    migrate_rate_limit_config,
};

use crate::adapters::leadflow_dir;
use crate::cli::{Cli, Commands};

/// Shared state for subcommands.
pub(crate) struct App {
    pub config: Config,
    pub store: Arc<dyn KeyValueStore>,
    pub history: Arc<HistoryStore>,
}

impl App {
    async fn open(config_path: &Path) -> anyhow::Result<Self> {
        let mut config = ConfigLoader::load_or_default(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

        for warning in ConfigValidator::validate(&config).into_result()? {
            warn!("Config {}: {}", warning.path, warning.message);
        }

        let store: Arc<dyn KeyValueStore> = Arc::new(
            FileKeyValueStore::new(&config.history.storage_path)
                .await
                .with_context(|| {
                    format!(
                        "Failed to open store at {}",
                        config.history.storage_path.display()
                    )
                })?,
        );
        let history = Arc::new(HistoryStore::with_cap(
            store.clone(),
            config.history.cap_per_scope,
        ));

        migrate(store.as_ref(), &history).await?;

        // Limits saved by `limits set` take precedence over the file.
        if let Some(limits) = load_rate_limit_config(store.as_ref()).await? {
            config.rate_limit = limits;
        }

        Ok(Self {
            config,
            store,
            history,
        })
    }
}

/// Run every storage migration once.
async fn migrate(store: &dyn KeyValueStore, history: &HistoryStore) -> anyhow::Result<()> {
    let history = history.migrate().await?;
    let limits = migrate_rate_limit_config(store).await?;

    for (name, outcome) in [("history", history), ("rate limits", limits)] {
        if outcome == MigrationOutcome::Migrated {
            info!("Migrated legacy {} to the current schema", name);
        }
    }
    Ok(())
}

/// Console plus daily-rolling file output under `log_dir`.
///
/// `RUST_LOG` wins over `default_level` when set.
fn init_tracing(log_dir: &Path, default_level: &str) -> anyhow::Result<()> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("leadflow")
        .filename_suffix("log")
        .max_log_files(14)
        .build(log_dir)?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Flushes buffered lines when the process exits.
    static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
    let _ = FILE_GUARD.set(guard);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    init_tracing(&leadflow_dir().join("logs"), level)?;

    let config_path: PathBuf = cli
        .config
        .unwrap_or_else(|| leadflow_dir().join("config.toml"));

    let app = App::open(&config_path).await?;

    match cli.command {
        Commands::Run {
            scope,
            targets,
            restart,
            dry_run,
            exec,
            options,
            signal_file,
        } => {
            cmd_run::run(
                &app,
                cmd_run::RunArgs {
                    scope,
                    targets,
                    restart,
                    dry_run,
                    exec,
                    options,
                    signal_file,
                },
            )
            .await
        }
        Commands::History { action } => cmd_history::handle_history_command(&app, action).await,
        Commands::Limits { action } => cmd_history::handle_limits_command(&app, action).await,
        // Migrations already ran while opening the store.
        Commands::Migrate => {
            info!("Storage is up to date");
            Ok(())
        }
    }
}
