mod schema;

pub use schema::Config;

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::scoring::validate_tariff;

/// Get the config directory path (~/.config/phom-score/)
pub fn get_config_dir() -> Result<PathBuf> {
    config_dir_under(dirs::home_dir())
}

fn config_dir_under(home: Option<PathBuf>) -> Result<PathBuf> {
    let home = home.context(
        "Could not determine home directory. Pass --config and --store, or set store in the config file",
    )?;
    Ok(home.join(".config").join("phom-score"))
}

/// Get the default config file path (~/.config/phom-score/config.yaml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.yaml"))
}

/// Expand a leading `~/` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses the default path
///   (~/.config/phom-score/config.yaml), and a missing default file yields
///   the built-in defaults.
///
/// # Errors
///
/// Returns an error if:
/// - No path is given and the home directory cannot be determined
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let explicit = path.is_some();
    let config_path = match path {
        Some(path) => path,
        None => get_config_path()?,
    };

    if !config_path.exists() {
        if explicit {
            anyhow::bail!("Config file not found at {}", config_path.display());
        }
        return Ok(Config::default());
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content).with_context(|| {
        format!("Failed to parse config: invalid YAML in {}", config_path.display())
    })?;

    Ok(config)
}

/// Validate the whole config at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(ref players) = config.players {
        if players.len() != 4 {
            errors.push(format!(
                "players: exactly 4 names required (got {})",
                players.len()
            ));
        }
        for (i, name) in players.iter().enumerate() {
            if name.trim().is_empty() {
                errors.push(format!("players[{}]: name cannot be empty", i));
            }
        }
    }

    if let Some(ref store) = config.store {
        if store.trim().is_empty() {
            errors.push("store: path cannot be empty".to_string());
        }
    }

    if let Some(ref tariff) = config.scoring {
        if let Err(tariff_errors) = validate_tariff(tariff) {
            errors.extend(tariff_errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Where sessions are stored: the configured path or the default location
pub fn store_path(config: &Config) -> Result<PathBuf> {
    match config.store.as_deref() {
        Some(store) => Ok(expand_home(store)),
        None => crate::session::get_store_path(),
    }
}
