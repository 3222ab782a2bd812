use crate::domain::error::DishqError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Anthropic API key for the extraction oracle. `ANTHROPIC_API_KEY`
    /// overrides the file value.
    pub anthropic_api_key: Option<String>,
    /// Google Places API key. `GOOGLE_PLACES_API_KEY` overrides the file
    /// value. Absent key skips Places lookup entirely.
    pub google_places_api_key: Option<String>,
    #[serde(default = "default_cache_ttl_days")]
    pub cache_ttl_days: u32,
    #[serde(default = "default_scrape_timeout_ms")]
    pub scrape_timeout_ms: u64,
    /// Delay after navigation for client-rendered content to settle.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Delay after the lazy-load scroll.
    #[serde(default = "default_scroll_delay_ms")]
    pub scroll_delay_ms: u64,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub logging: Logging,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Logging {
    #[serde(default = "default_enable")]
    pub enable: bool,
    pub path: Option<String>,
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            enable: true,
            path: None,
            level: "WARN".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            google_places_api_key: None,
            cache_ttl_days: default_cache_ttl_days(),
            scrape_timeout_ms: default_scrape_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            scroll_delay_ms: default_scroll_delay_ms(),
            theme: default_theme(),
            logging: Logging::default(),
        }
    }
}

// Defaults
fn default_cache_ttl_days() -> u32 {
    7
}
fn default_scrape_timeout_ms() -> u64 {
    30_000
}
fn default_settle_delay_ms() -> u64 {
    3_000
}
fn default_scroll_delay_ms() -> u64 {
    1_500
}
fn default_theme() -> String {
    "temp".to_string()
}
fn default_enable() -> bool {
    true
}
fn default_log_level() -> String {
    "WARN".to_string()
}

pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("dishq").join("config.toml"))
}

/// Get cache database path (uses config directory by default)
pub fn get_database_path(_config: &Config) -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dishq")
        .join("cache.db")
}

pub fn load_config() -> Result<Config, DishqError> {
    let config_path = get_config_path();

    let mut config = Config::default();
    if let Some(path) = config_path {
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            match toml::from_str::<Config>(&content) {
                Ok(parsed) => config = parsed,
                Err(e) => {
                    eprintln!(
                        "Warning: Failed to parse config file: {}. Using defaults.",
                        e
                    );
                }
            }
        }
    }

    // Environment credentials win over the file.
    if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
        if !key.is_empty() {
            config.anthropic_api_key = Some(key);
        }
    }
    if let Ok(key) = std::env::var("GOOGLE_PLACES_API_KEY") {
        if !key.is_empty() {
            config.google_places_api_key = Some(key);
        }
    }

    Ok(config)
}

pub fn generate_config_sample() -> Result<(), DishqError> {
    let config_path = get_config_path();

    if let Some(path) = config_path {
        if path.exists() {
            eprintln!("Config file already exists at: {}", path.display());
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let sample = Config::default();
        let toml_content = toml::to_string_pretty(&sample)
            .map_err(|e| DishqError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(&path, toml_content)
            .map_err(|e| DishqError::Config(format!("Failed to write config file: {}", e)))?;
        println!("Generated config file at: {}", path.display());
    } else {
        return Err(DishqError::Config(
            "Cannot determine config directory".to_string(),
        ));
    }

    Ok(())
}
