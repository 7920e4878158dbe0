//! Map Constants
//!
//! Centralized defaults for overlay styling and endpoint access.

/// Default collection endpoint root
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Request timeout for collection fetches
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Multiplier applied to `sqrt(radius)` when drawing hangar circles
pub const DEFAULT_RADIUS_SCALE: f64 = 28.0;

/// Hangar circle stroke
pub const HANGAR_STROKE_COLOR: &str = "#4F35DA";
pub const HANGAR_STROKE_OPACITY: f32 = 0.8;
pub const HANGAR_STROKE_WEIGHT: u32 = 2;

/// Hangar circle fill
pub const HANGAR_FILL_COLOR: &str = "#88AFEA";
pub const HANGAR_FILL_OPACITY: f32 = 0.5;

/// Retry configuration
pub const RETRY_INITIAL_DELAY_MS: u64 = 1000;
pub const RETRY_MAX_DELAY_MS: u64 = 30000;
pub const RETRY_MULTIPLIER: f64 = 2.0;
pub const RETRY_JITTER: f64 = 0.1;
pub const RETRY_MAX_ATTEMPTS: u32 = 3;

/// Environment variable overriding `api.base_url`
pub const BASE_URL_ENV: &str = "FAED_MAP_BASE_URL";

/// Config file name inside the platform config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";
