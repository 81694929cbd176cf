use serde::Deserialize;
use std::{env, fs, io::ErrorKind, path::Path};

use crate::game::GameSettings;

/// Signing secret used when none is configured. Refused in production.
pub const DEFAULT_JWT_SECRET: &str = "guildquest-dev-secret";
pub const DEFAULT_APP_URL: &str = "http://localhost:5151";
pub const DEFAULT_PORT: u16 = 5151;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub environment: Environment,
    pub jwt_secret: String,
    /// Public base URL of the client app; invite links point here.
    pub app_url: String,
    pub listen_port: Option<u16>,
    pub dev_cors_origin: Option<String>,
    pub bcrypt_cost: u32,
    /// Allowed decoration names; empty accepts any name.
    pub decoration_catalog: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            app_url: DEFAULT_APP_URL.to_string(),
            listen_port: None,
            dev_cors_origin: None,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            decoration_catalog: Vec::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl AppConfig {
    /// Reads the YAML file (defaults when it does not exist), then applies
    /// `JWT_SECRET` / `APP_URL` from the environment and validates.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut cfg = match fs::read_to_string(&path) {
            Ok(text) => Self::from_yaml(&text)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %path.as_ref().display(), "config file not found; using defaults");
                Self::default()
            }
            Err(e) => return Err(e.into()),
        };
        cfg.apply_overrides(|key| env::var(key).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as null rather than an empty map.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn apply_overrides<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        if let Some(secret) = lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            self.jwt_secret = secret;
        }
        if let Some(url) = lookup("APP_URL").filter(|s| !s.is_empty()) {
            self.app_url = url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid("jwt_secret must not be empty".into()));
        }
        if self.environment == Environment::Production && self.jwt_secret == DEFAULT_JWT_SECRET {
            return Err(ConfigError::Invalid(
                "jwt_secret must be set in production".into(),
            ));
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::Invalid(format!(
                "bcrypt_cost must be between 4 and 31, got {}",
                self.bcrypt_cost
            )));
        }
        Ok(())
    }

    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            bcrypt_cost: self.bcrypt_cost,
            decoration_catalog: self.decoration_catalog.clone(),
        }
    }
}
