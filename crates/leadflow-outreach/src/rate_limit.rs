//! Rolling-window rate limiting.

use std::collections::VecDeque;

use leadflow_config::RateLimitConfig;
use serde::Serialize;

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Current window counts against their limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitUsage {
    pub hourly: u32,
    pub daily: u32,
    pub max_per_hour: u32,
    pub max_per_day: u32,
}

/// Tracks interaction timestamps (epoch ms) over a trailing hour and day.
///
/// State lives in memory only and starts empty on every process start.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    timestamps: VecDeque<i64>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            timestamps: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Replace the limits. Recorded timestamps are kept.
    pub fn set_config(&mut self, config: RateLimitConfig) {
        self.config = config;
    }

    /// Whether another interaction is allowed at `now_ms`.
    pub fn can_interact(&mut self, now_ms: i64) -> bool {
        let usage = self.usage(now_ms);
        usage.hourly < usage.max_per_hour && usage.daily < usage.max_per_day
    }

    /// Record an interaction at `now_ms`.
    pub fn record_interaction(&mut self, now_ms: i64) {
        self.timestamps.push_back(now_ms);
        self.prune(now_ms);
    }

    /// Window counts at `now_ms`.
    pub fn usage(&mut self, now_ms: i64) -> RateLimitUsage {
        self.prune(now_ms);
        let hourly = self
            .timestamps
            .iter()
            .filter(|&&ts| ts > now_ms - HOUR_MS)
            .count();

        RateLimitUsage {
            hourly: hourly as u32,
            daily: self.timestamps.len() as u32,
            max_per_hour: self.config.max_per_hour,
            max_per_day: self.config.max_per_day,
        }
    }

    /// Earliest time at which [`can_interact`](Self::can_interact) turns true.
    ///
    /// Returns `None` if interaction is allowed now.
    pub fn next_available_at(&mut self, now_ms: i64) -> Option<i64> {
        if self.can_interact(now_ms) {
            return None;
        }

        let mut earliest = now_ms;
        if self.config.max_per_day > 0 {
            let daily = self.timestamps.len();
            let max_daily = self.config.max_per_day as usize;
            if daily >= max_daily {
                // The oldest `daily - max + 1` entries must leave the window.
                let ts = self.timestamps[daily - max_daily];
                earliest = earliest.max(ts + DAY_MS);
            }
        }

        if self.config.max_per_hour > 0 {
            let hourly: Vec<i64> = self
                .timestamps
                .iter()
                .copied()
                .filter(|&ts| ts > now_ms - HOUR_MS)
                .collect();
            let max_hourly = self.config.max_per_hour as usize;
            if hourly.len() >= max_hourly {
                let ts = hourly[hourly.len() - max_hourly];
                earliest = earliest.max(ts + HOUR_MS);
            }
        }

        Some(earliest)
    }

    /// Forget all recorded interactions.
    pub fn reset(&mut self) {
        self.timestamps.clear();
    }

    fn prune(&mut self, now_ms: i64) {
        while let Some(&oldest) = self.timestamps.front() {
            if oldest > now_ms - DAY_MS {
                break;
            }
            self.timestamps.pop_front();
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
