//! # rg-config
//!
//! Runtime settings for Rusty-Gallery. Values are layered: built-in defaults,
//! then an optional `rusty-gallery.toml` in the working directory, then
//! environment variables (a `.env` file is loaded first if present).

use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

/// Base name of the optional settings file.
pub const SETTINGS_FILE: &str = "rusty-gallery";

const SUPPORTED_ALGORITHMS: [&str; 3] = ["HS256", "HS384", "HS512"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    /// Base URL used in links sent to users (email confirmation)
    pub public_url: String,

    pub jwt_secret: SecretString,
    pub jwt_algorithm: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,

    /// From address on confirmation mail
    pub mail_from: String,

    pub cloud_name: String,
    pub cloud_api_key: String,
    pub cloud_api_secret: SecretString,
    /// CDN folder every asset is stored under
    pub cloud_folder: String,
}

impl Settings {
    /// Loads `.env`, the optional settings file, and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("loaded environment from {}", path.display());
        }
        Self::from_sources(Some(SETTINGS_FILE), Environment::default())
    }

    fn from_sources(file: Option<&str>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("database_url", "sqlite:rusty_gallery.db")?
            .set_default("bind_addr", "127.0.0.1:8080")?
            .set_default("public_url", "http://127.0.0.1:8080")?
            .set_default("jwt_algorithm", "HS256")?
            .set_default("access_token_minutes", 15)?
            .set_default("refresh_token_days", 7)?
            .set_default("mail_from", "noreply@rusty-gallery.local")?
            .set_default("cloud_name", "")?
            .set_default("cloud_api_key", "")?
            .set_default("cloud_api_secret", "")?
            .set_default("cloud_folder", "RustyGallery")?;
        if let Some(name) = file {
            builder = builder.add_source(File::with_name(name).required(false));
        }
        let settings: Settings = builder
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.expose_secret().trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: "must not be empty".to_string(),
            });
        }
        let algorithm = self.jwt_algorithm.to_ascii_uppercase();
        if !SUPPORTED_ALGORITHMS.contains(&algorithm.as_str()) {
            return Err(ConfigError::Invalid {
                key: "JWT_ALGORITHM",
                reason: format!("expected one of {SUPPORTED_ALGORITHMS:?}, got {}", self.jwt_algorithm),
            });
        }
        if self.access_token_minutes <= 0 || self.refresh_token_days <= 0 {
            return Err(ConfigError::Invalid {
                key: "ACCESS_TOKEN_MINUTES/REFRESH_TOKEN_DAYS",
                reason: "token lifetimes must be positive".to_string(),
            });
        }
        if self.cloud_name.is_empty() {
            log::warn!("CLOUD_NAME is not set; uploads will fail");
        }
        Ok(())
    }
}
