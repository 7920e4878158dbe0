//! Config - Application Configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_RADIUS_SCALE, RETRY_INITIAL_DELAY_MS,
    RETRY_JITTER, RETRY_MAX_ATTEMPTS, RETRY_MAX_DELAY_MS, RETRY_MULTIPLIER,
};

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Collection endpoint
    pub api: ApiConfig,
    /// Overlay appearance
    pub display: DisplayConfig,
    /// Caller-side retry policy
    pub retry: RetryConfig,
}

/// Collection endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL; collections live under `{base_url}/api/{resource}/`
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Overlay appearance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Multiplier applied to `sqrt(radius)` for hangar circles
    pub radius_scale: f64,
    /// Marker icon URL for droppoints (widget default when unset)
    pub droppoint_icon: Option<String>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            radius_scale: DEFAULT_RADIUS_SCALE,
            droppoint_icon: None,
        }
    }
}

/// Retry policy applied by callers wrapping a sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
    /// Jitter factor (0.0 - 1.0) to randomize delays
    pub jitter: f64,
    /// Maximum number of retries after the first attempt (0 = never retry)
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: RETRY_INITIAL_DELAY_MS,
            max_delay_ms: RETRY_MAX_DELAY_MS,
            multiplier: RETRY_MULTIPLIER,
            jitter: RETRY_JITTER,
            max_attempts: RETRY_MAX_ATTEMPTS,
        }
    }
}
