//! YAML configuration.
//!
//! Search order when no path is given: `$AGRO_CONFIG`, `./config/agro.yaml`,
//! `./config.yaml`, `~/.config/agro-advisory/config.yaml`. With no file at all
//! the built-in defaults apply.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::risk::{ScoringConfig, DEFAULT_HORIZON_DAYS};
use crate::suitability::CropProfile;

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderCfg,
    pub app: AppCfg,
    pub scoring: ScoringConfig,
    /// Replaces the built-in crop catalog when present.
    pub crops: Option<Vec<CropProfile>>,
    /// Replaces the built-in message bank when present.
    pub messages_path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ProviderCfg {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u8,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppCfg {
    #[serde(default = "default_lang")]
    pub locale: String,
    #[serde(default = "default_lang")]
    pub default_locale: String,
    #[serde(default = "default_horizon")]
    pub horizon_days: i32,
    #[serde(default = "default_locations")]
    pub locations: Vec<Location>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for ProviderCfg {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            forecast_days: default_forecast_days(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            locale: default_lang(),
            default_locale: default_lang(),
            horizon_days: default_horizon(),
            locations: default_locations(),
        }
    }
}

fn default_base_url() -> String { "https://api.open-meteo.com/v1/forecast".into() }
fn default_forecast_days() -> u8 { 7 }
fn default_timeout() -> u64 { 15 }
fn default_lang() -> String { "en".into() }
fn default_horizon() -> i32 { DEFAULT_HORIZON_DAYS }

// Used when the device location is unknown.
fn default_locations() -> Vec<Location> {
    vec![Location { name: "Farm".into(), latitude: 24.1, longitude: 88.25 }]
}

pub fn parse_config(text: &str) -> Result<Config> {
    let cfg: Config = serde_yaml::from_str(text).context("parsing YAML config")?;
    if cfg.provider.forecast_days == 0 {
        bail!("provider.forecast_days must be at least 1");
    }
    Ok(cfg)
}

pub fn load_config(explicit: Option<PathBuf>) -> Result<Config> {
    if let Some(path) = explicit {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        return parse_config(&s).with_context(|| format!("in {}", path.display()));
    }

    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(p) = std::env::var("AGRO_CONFIG") { candidates.push(PathBuf::from(p)); }
    candidates.push(PathBuf::from("./config/agro.yaml"));
    candidates.push(PathBuf::from("./config.yaml"));
    if let Some(mut d) = dirs::config_dir() {
        d.push("agro-advisory/config.yaml");
        candidates.push(d);
    }

    for path in candidates {
        if path.exists() {
            let s = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config from {}", path.display()))?;
            info!(path = %path.display(), "loaded config");
            return parse_config(&s).with_context(|| format!("in {}", path.display()));
        }
    }
    info!("no config file found, using defaults");
    Ok(Config::default())
}
