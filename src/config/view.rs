//! Application configuration loading from config.toml
//!
//! Every field has a default, so an empty file (or a file with only some
//! sections) is a valid configuration.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Markup applied to source prices when the catalog is enriched.
pub const DEFAULT_MARKUP: f64 = 1.5;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Tuning for the reactive view
    #[serde(default)]
    pub view: ViewConfig,
    /// Catalog seed data for an empty database
    #[serde(default)]
    pub seed: SeedConfig,
}

/// Tuning for the catalog view session
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ViewConfig {
    /// Multiplier applied to every source price
    pub markup: f64,
    /// Values buffered per multicast channel before slow subscribers lag
    pub channel_capacity: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            markup: DEFAULT_MARKUP,
            channel_capacity: crate::reactive::DEFAULT_CAPACITY,
        }
    }
}

/// Where catalog seed data is read from
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SeedConfig {
    /// Path to the catalog seed file
    pub path: PathBuf,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("catalog.toml"),
        }
    }
}

/// Loads application configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - The markup is not a positive finite number
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    let config: AppConfig = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })?;
    validate(&config)?;
    Ok(config)
}

/// Loads configuration from `CATALOG_CONFIG`, or ./config.toml when unset.
pub fn load_default_config() -> Result<AppConfig> {
    let path = std::env::var("CATALOG_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    load_config(path)
}

fn validate(config: &AppConfig) -> Result<()> {
    let markup = config.view.markup;
    if !markup.is_finite() || markup <= 0.0 {
        return Err(Error::Config {
            message: format!("Markup must be a positive number, got {markup}"),
        });
    }
    Ok(())
}
