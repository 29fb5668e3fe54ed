//! Application configuration.
//!
//! Loaded from a TOML file with per-field defaults, then overlaid with the
//! `MT5_API_TOKEN` environment variable so the token never has to live in
//! the config file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use mt5_core::FillPolicy;
use mt5_gateway::BridgeConfig;
use mt5_position::{CloseConfig, DispatchConfig, MagicPolicy};
use mt5_server::CloseProfiles;

use crate::error::{AppError, AppResult};

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bearer token required on non-public routes; unset disables auth.
    #[serde(default)]
    pub api_token: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_token: None,
        }
    }
}

/// Batch dispatch configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum concurrent close attempts per batch. Absent = one worker
    /// per item; 1 = strictly sequential.
    #[serde(default)]
    pub max_concurrency: Option<usize>,
}

impl From<BatchConfig> for DispatchConfig {
    fn from(cfg: BatchConfig) -> Self {
        Self {
            max_concurrency: cfg.max_concurrency,
        }
    }
}

/// Overrides for one close profile. Unset fields keep the profile's
/// built-in default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloseProfileConfig {
    #[serde(default)]
    pub deviation: Option<u32>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub fill_policy: Option<FillPolicy>,
    /// Fixed magic tag for close orders; unset inherits the profile's
    /// policy (the position's own tag for single/all, 0 for batch).
    #[serde(default)]
    pub magic: Option<i64>,
}

impl CloseProfileConfig {
    fn apply(&self, mut base: CloseConfig) -> CloseConfig {
        if let Some(deviation) = self.deviation {
            base.deviation = deviation;
        }
        if let Some(comment) = &self.comment {
            base.comment = comment.clone();
        }
        if let Some(fill_policy) = self.fill_policy {
            base.fill_policy = fill_policy;
        }
        if let Some(magic) = self.magic {
            base.magic = MagicPolicy::Fixed(magic);
        }
        base
    }
}

/// The three per-endpoint close profiles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloseProfilesConfig {
    #[serde(default)]
    pub single: CloseProfileConfig,
    #[serde(default)]
    pub all: CloseProfileConfig,
    #[serde(default)]
    pub batch: CloseProfileConfig,
}

impl CloseProfilesConfig {
    pub fn profiles(&self) -> CloseProfiles {
        CloseProfiles {
            single: self.single.apply(CloseConfig::close_all()),
            all: self.all.apply(CloseConfig::close_all()),
            batch: self.batch.apply(CloseConfig::batch()),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub close: CloseProfilesConfig,
}

impl AppConfig {
    /// Load from the given path, falling back to defaults when the file
    /// does not exist. The `MT5_API_TOKEN` environment variable, when set,
    /// overrides the configured token.
    pub fn load(path: &str) -> AppResult<Self> {
        let config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!(path = %path, "Config file not found, using defaults");
            Self::default()
        };
        Ok(config.with_env_overrides())
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(token) = std::env::var("MT5_API_TOKEN") {
            if !token.is_empty() {
                self.server.api_token = Some(token);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert!(config.server.api_token.is_none());
        assert!(config.batch.max_concurrency.is_none());

        let profiles = config.close.profiles();
        assert_eq!(profiles.all.deviation, 10);
        assert_eq!(profiles.all.comment, "Closed by API");
        assert_eq!(profiles.batch.deviation, 20);
        assert_eq!(profiles.batch.magic, MagicPolicy::Fixed(0));
    }

    #[test]
    fn test_overrides_are_applied() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            port = 8080
            api_token = "secret"

            [batch]
            max_concurrency = 1

            [close.batch]
            deviation = 5
            fill_policy = "ioc"

            [close.all]
            magic = 99
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.api_token.as_deref(), Some("secret"));
        assert_eq!(config.batch.max_concurrency, Some(1));

        let profiles = config.close.profiles();
        assert_eq!(profiles.batch.deviation, 5);
        assert_eq!(profiles.batch.fill_policy, FillPolicy::Ioc);
        // Unset fields keep the built-in defaults.
        assert_eq!(profiles.batch.comment, "Batch Close");
        assert_eq!(profiles.all.magic, MagicPolicy::Fixed(99));
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[bridge]"));
    }
}
