//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every field has a default so the server can start from an empty or
//! partial file; the payout multipliers and tick period are the knobs
//! operators actually touch.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    /// Round clock tick period in milliseconds.
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
    /// Payout multiplier for the green/blue colors.
    #[serde(default = "default_color_multiplier")]
    pub color_multiplier: f64,
    /// Payout multiplier for the tie (same) color.
    #[serde(default = "default_same_multiplier")]
    pub same_multiplier: f64,
    /// Capacity of the broadcast channel fanning round events to clients.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

fn default_port() -> u16 {
    5000
}

fn default_tick_millis() -> u64 {
    1000
}

fn default_color_multiplier() -> f64 {
    2.0
}

fn default_same_multiplier() -> f64 {
    5.0
}

fn default_channel_capacity() -> usize {
    256
}

fn default_database_url() -> String {
    "sqlite://treasury.db?mode=rwc".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
            color_multiplier: default_color_multiplier(),
            same_multiplier: default_same_multiplier(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    /// A missing file yields the defaults rather than an error.
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.port, 5000);
        assert_eq!(cfg.game.tick_millis, 1000);
        assert_eq!(cfg.game.color_multiplier, 2.0);
        assert_eq!(cfg.game.same_multiplier, 5.0);
        assert!(cfg.ledger.database_url.starts_with("sqlite:"));
    }

    #[test]
    fn test_parse_partial_toml() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [game]
            tick_millis = 250
            same_multiplier = 4.0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.game.tick_millis, 250);
        assert_eq!(cfg.game.same_multiplier, 4.0);
        // Untouched sections keep their defaults
        assert_eq!(cfg.game.color_multiplier, 2.0);
        assert_eq!(cfg.server.port, 5000);
    }

    #[test]
    fn test_parse_full_toml() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [server]
            port = 8080

            [game]
            tick_millis = 500
            color_multiplier = 1.9
            same_multiplier = 6.0
            channel_capacity = 64

            [ledger]
            database_url = "sqlite::memory:"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.game.channel_capacity, 64);
        assert_eq!(cfg.ledger.database_url, "sqlite::memory:");
    }

    #[test]
    fn test_load_missing_file_is_defaults() {
        let cfg = AppConfig::load("/tmp/rollhouse_no_such_config_8231.toml").unwrap();
        assert_eq!(cfg.server.port, 5000);
    }
}
