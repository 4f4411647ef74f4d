//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub messages: MessagesConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub recovery: RecoveryConfig,
}

/// Interaction throttling limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum successful interactions in any trailing hour.
    #[serde(default = "default_max_per_hour")]
    pub max_per_hour: u32,

    /// Maximum successful interactions in any trailing 24 hours.
    #[serde(default = "default_max_per_day")]
    pub max_per_day: u32,

    /// Pause between two consecutive interactions, in milliseconds.
    #[serde(default = "default_interaction_delay_ms")]
    pub interaction_delay_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_per_hour: default_max_per_hour(),
            max_per_day: default_max_per_day(),
            interaction_delay_ms: default_interaction_delay_ms(),
        }
    }
}

fn default_max_per_hour() -> u32 {
    15
}

fn default_max_per_day() -> u32 {
    100
}

fn default_interaction_delay_ms() -> u64 {
    2000
}

/// Run behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Resume each scope from its persisted `last_index`.
    #[serde(default = "default_true")]
    pub continue_from_last: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            continue_from_last: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// How the next message template is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// Uniformly random among configured templates.
    #[default]
    Random,
    /// Round-robin in configured order.
    Sequential,
}

/// Message template configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagesConfig {
    #[serde(default)]
    pub templates: Vec<String>,

    #[serde(default)]
    pub policy: SelectionPolicy,
}

/// History persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum records retained per scope; oldest are evicted first.
    #[serde(default = "default_cap_per_scope")]
    pub cap_per_scope: usize,

    /// Directory for the file-backed key-value store.
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            cap_per_scope: default_cap_per_scope(),
            storage_path: default_storage_path(),
        }
    }
}

fn default_cap_per_scope() -> usize {
    500
}

fn default_storage_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".leadflow").join("store"))
        .unwrap_or_else(|| PathBuf::from("/tmp/leadflow/store"))
}

/// Error detection and recovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Interval between page scans.
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,

    /// Case-insensitive regular expressions that mark a blocked or logged-out page.
    #[serde(default = "default_failure_markers")]
    pub failure_markers: Vec<String>,

    /// Consecutive interaction failures that escalate to the recovery monitor.
    #[serde(default = "default_consecutive_failure_threshold")]
    pub consecutive_failure_threshold: u32,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: default_scan_interval(),
            failure_markers: default_failure_markers(),
            consecutive_failure_threshold: default_consecutive_failure_threshold(),
        }
    }
}

fn default_scan_interval() -> u64 {
    10
}

fn default_failure_markers() -> Vec<String> {
    vec![
        r"you.?re temporarily blocked".to_string(),
        r"you can.?t use this feature right now".to_string(),
        r"suspicious activity".to_string(),
        r"log in to continue".to_string(),
        r"please log in".to_string(),
        r"/checkpoint/".to_string(),
    ]
}

fn default_consecutive_failure_threshold() -> u32 {
    3
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
