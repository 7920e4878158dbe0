//! ConfigStore - Local Configuration Storage

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::constants::{BASE_URL_ENV, CONFIG_FILE_NAME};
use crate::domain::config::AppConfig;
use crate::error::Result;
use crate::helpers::get_or_create_config_dir;

/// Load `config.toml` from the platform config directory
///
/// A missing file is seeded with the defaults so there is something to edit.
/// `FAED_MAP_BASE_URL` overrides `api.base_url` either way.
pub fn load_app_config() -> Result<AppConfig> {
    let path = get_or_create_config_dir()?.join(CONFIG_FILE_NAME);
    let mut config = load_or_seed(&path)?;
    apply_env_overrides(&mut config, std::env::var(BASE_URL_ENV).ok());
    Ok(config)
}

/// Load a TOML config file, falling back to defaults when absent
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        debug!("No config at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }

    let config: AppConfig = toml::from_str(&content)?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Save a config as pretty TOML
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

/// Like [`load_config_from`], but writes the defaults out when the file is absent
fn load_or_seed(path: &Path) -> Result<AppConfig> {
    let config = load_config_from(path)?;
    if !path.exists() {
        match save_config_to(path, &config) {
            Ok(()) => info!("Wrote default config to {}", path.display()),
            Err(e) => warn!("Could not write default config to {}: {e}", path.display()),
        }
    }
    Ok(config)
}

fn apply_env_overrides(config: &mut AppConfig, base_url: Option<String>) {
    if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
        debug!("Overriding base URL from environment: {url}");
        config.api.base_url = url;
    }
}
