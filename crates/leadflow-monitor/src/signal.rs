//! Page signals and failure marker detection.

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::MonitorError;

/// Snapshot of the automated surface, supplied by the scraping layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSignal {
    /// Current location, if known.
    #[serde(default)]
    pub url: Option<String>,
    /// Visible text or any other opaque status string.
    #[serde(default)]
    pub text: String,
}

impl PageSignal {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            url: None,
            text: text.into(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Source of page signals for periodic scans.
#[async_trait]
pub trait PageSignalSource: Send + Sync {
    /// Capture the current page signal.
    async fn capture(&self) -> Result<PageSignal, MonitorError>;
}

/// Compiled, case-insensitive failure markers.
#[derive(Debug, Clone)]
pub struct FailureMarkers {
    patterns: Vec<Regex>,
}

impl FailureMarkers {
    /// Compile marker patterns.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, MonitorError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p.as_ref())
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| MonitorError::InvalidPattern {
                        pattern: p.as_ref().to_string(),
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// First marker matching the signal's text or URL.
    pub fn detect(&self, signal: &PageSignal) -> Option<&str> {
        self.patterns
            .iter()
            .find(|re| {
                re.is_match(&signal.text)
                    || signal.url.as_deref().is_some_and(|url| re.is_match(url))
            })
            .map(|re| re.as_str())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
