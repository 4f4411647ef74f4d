//! Performers, signal sources and file helpers for the CLI.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use leadflow_monitor::{MonitorError, PageSignal, PageSignalSource};
use leadflow_outreach::{InteractionPerformer, InteractionTarget, PerformError};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Get the .leadflow directory path.
pub(crate) fn leadflow_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".leadflow"))
        .unwrap_or_else(|| PathBuf::from(".leadflow"))
}

/// Load targets from a JSON array file.
pub(crate) async fn load_targets(path: &Path) -> anyhow::Result<Vec<InteractionTarget>> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        anyhow::anyhow!("Failed to read targets file {}: {}", path.display(), e)
    })?;
    let targets: Vec<InteractionTarget> = serde_json::from_str(&content)?;
    Ok(targets)
}

/// Logs each message and reports success without touching any surface.
pub(crate) struct DryRunPerformer;

#[async_trait]
impl InteractionPerformer for DryRunPerformer {
    async fn perform(
        &self,
        target: &InteractionTarget,
        message: &str,
    ) -> Result<bool, PerformError> {
        info!("[dry-run] {} ({}): {}", target.display_name, target.id, message);
        Ok(true)
    }
}

/// Runs a shell command per interaction.
///
/// The target and message are passed in `LEADFLOW_TARGET_ID`,
/// `LEADFLOW_TARGET_NAME`, `LEADFLOW_MESSAGE` and `LEADFLOW_PROFILE_REF`
/// (JSON). Exit status 0 means the interaction succeeded.
pub(crate) struct CommandPerformer {
    command: String,
}

impl CommandPerformer {
    pub(crate) fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl InteractionPerformer for CommandPerformer {
    async fn perform(
        &self,
        target: &InteractionTarget,
        message: &str,
    ) -> Result<bool, PerformError> {
        let (shell, flag) = if cfg!(target_os = "windows") {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };

        let output = Command::new(shell)
            .arg(flag)
            .arg(&self.command)
            .env("LEADFLOW_TARGET_ID", &target.id)
            .env("LEADFLOW_TARGET_NAME", &target.display_name)
            .env("LEADFLOW_MESSAGE", message)
            .env("LEADFLOW_PROFILE_REF", target.profile_ref.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| PerformError::Custom(format!("failed to spawn performer: {}", e)))?;

        if output.status.success() {
            debug!("Performer succeeded for {}", target.id);
            Ok(true)
        } else {
            let code = output.status.code().unwrap_or(-1);
            warn!(
                "Performer exited with code {} for {}: {}",
                code,
                target.id,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            Ok(false)
        }
    }
}

/// Reads the page signal from a text file kept current by the scraper.
pub(crate) struct FileSignalSource {
    path: PathBuf,
}

impl FileSignalSource {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PageSignalSource for FileSignalSource {
    async fn capture(&self) -> Result<PageSignal, MonitorError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(PageSignal::text(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PageSignal::default()),
            Err(e) => Err(MonitorError::Custom(format!(
                "failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}
