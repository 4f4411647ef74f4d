//! User-facing notifications.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::MonitorError;

/// Notification severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationSeverity {
    /// Informational.
    Info,
    /// Warning.
    Warning,
    /// Critical: the operation was halted.
    Critical,
}

impl std::fmt::Display for NotificationSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationSeverity::Info => write!(f, "INFO"),
            NotificationSeverity::Warning => write!(f, "WARNING"),
            NotificationSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A notification for the UI layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: NotificationSeverity,
    pub timestamp: DateTime<Utc>,
    /// Source component.
    pub source: Option<String>,
}

impl Notification {
    /// Create a new notification.
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        severity: NotificationSeverity,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity,
            timestamp: Utc::now(),
            source: None,
        }
    }

    /// Set source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Format for text output.
    pub fn format_text(&self) -> String {
        let mut text = format!(
            "[{}] {} - {}\n{}",
            self.severity,
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.title,
            self.message
        );

        if let Some(ref source) = self.source {
            text.push_str(&format!("\nSource: {}", source));
        }

        text
    }
}

/// Notification sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Notifier name.
    fn name(&self) -> &str;

    /// Deliver a notification.
    async fn notify(&self, notification: &Notification) -> Result<(), MonitorError>;
}

/// Notifier that writes to tracing.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, notification: &Notification) -> Result<(), MonitorError> {
        match notification.severity {
            NotificationSeverity::Info => {
                info!("[NOTIFY] {}: {}", notification.title, notification.message)
            }
            NotificationSeverity::Warning => {
                warn!("[NOTIFY] {}: {}", notification.title, notification.message)
            }
            NotificationSeverity::Critical => {
                error!("[NOTIFY] {}: {}", notification.title, notification.message)
            }
        }
        Ok(())
    }
}
