//! `run` subcommand.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use tokio::sync::broadcast;
use tracing::{info, warn};

use leadflow_config::RuntimeOptions;
use leadflow_monitor::ErrorRecoveryMonitor;
use leadflow_outreach::{InteractionPerformer, Orchestrator, RunState, StartOptions};

use crate::App;
use crate::adapters::{CommandPerformer, DryRunPerformer, FileSignalSource, load_targets};

pub(crate) struct RunArgs {
    pub scope: String,
    pub targets: PathBuf,
    pub restart: bool,
    pub dry_run: bool,
    pub exec: Option<String>,
    pub options: Option<PathBuf>,
    pub signal_file: Option<PathBuf>,
}

/// Drive one run to completion, stop or Ctrl-C.
pub(crate) async fn run(app: &App, args: RunArgs) -> anyhow::Result<()> {
    let performer: Arc<dyn InteractionPerformer> = match (args.dry_run, args.exec) {
        (true, _) => Arc::new(DryRunPerformer),
        (false, Some(command)) => Arc::new(CommandPerformer::new(command)),
        (false, None) => bail!("No performer configured: pass --exec <command> or --dry-run"),
    };

    let targets = load_targets(&args.targets).await?;
    info!(
        "Loaded {} targets from {}",
        targets.len(),
        args.targets.display()
    );

    let orchestrator = Orchestrator::new(&app.config, app.history.clone(), performer);

    if let Some(path) = args.options {
        let content = tokio::fs::read_to_string(&path).await?;
        let options: RuntimeOptions = serde_json::from_str(&content)?;
        orchestrator.configure(&options).await?;
    }

    let monitor = Arc::new(ErrorRecoveryMonitor::new(&app.config.recovery)?);
    orchestrator.set_monitor(monitor.clone());

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let monitor_task = args.signal_file.map(|path| {
        let interval = Duration::from_secs(app.config.recovery.scan_interval_secs);
        tokio::spawn(monitor.clone().run(
            Arc::new(FileSignalSource::new(path)),
            Arc::new(orchestrator.clone()),
            interval,
            shutdown_tx.subscribe(),
        ))
    });

    let options = StartOptions {
        continue_from_last: !args.restart && orchestrator.continue_from_last(),
    };
    let handle = orchestrator.start(&args.scope, targets, options).await?;

    let mut progress = orchestrator.subscribe();
    let progress_task = tokio::spawn(async move {
        loop {
            let p = progress.borrow_and_update().clone();
            info!(
                "Progress: {}/{} ({} ok, {} failed) [{}]",
                p.current_index, p.total, p.succeeded, p.failed, p.state
            );
            if !p.is_running || progress.changed().await.is_err() {
                break;
            }
        }
    });

    let ctrl_c = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping after the current interaction");
                if let Err(e) = orchestrator.stop() {
                    warn!("Stop failed: {}", e);
                }
            }
        })
    };

    let outcome = handle.wait().await?;
    ctrl_c.abort();
    let _ = shutdown_tx.send(());
    if let Some(task) = monitor_task {
        let _ = task.await;
    }
    let _ = progress_task.await;

    match (&outcome.state, &outcome.stop_reason) {
        (RunState::Completed, _) => println!(
            "Completed scope '{}': {} succeeded, {} failed (index {} -> {})",
            outcome.scope_id,
            outcome.succeeded,
            outcome.failed,
            outcome.start_index,
            outcome.end_index
        ),
        (_, Some(reason)) => println!(
            "Stopped scope '{}': {}. {} succeeded, {} failed (index {} -> {})",
            outcome.scope_id,
            reason,
            outcome.succeeded,
            outcome.failed,
            outcome.start_index,
            outcome.end_index
        ),
        (state, None) => println!("Run ended in state {}", state),
    }

    Ok(())
}
