//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
///
/// The two remote credentials degrade differently when absent: a missing
/// `GEMINI_API_KEY` soft-fails generation (the pipeline still persists a
/// placeholder), while a missing `BLOB_READ_WRITE_TOKEN` hard-fails any
/// file-backed ingestion before extraction starts.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub jwt_secret: String,
    pub gemini_api_key: Option<String>,
    pub blob_read_write_token: Option<String>,
    pub blob_store_url: String,
    pub generation_model: String,
    pub generation_api_base: String,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:5000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| ConfigError::MissingVar("JWT_SECRET".to_string()))?;

        // --- Load Remote-Service Credentials (as optional) ---
        let gemini_api_key = std::env::var("GEMINI_API_KEY").ok();
        let blob_read_write_token = std::env::var("BLOB_READ_WRITE_TOKEN").ok();

        // --- Load Adapter-specific Settings ---
        let blob_store_url = std::env::var("BLOB_STORE_URL")
            .unwrap_or_else(|_| "https://blob.vercel-storage.com".to_string());
        let generation_model = std::env::var("GENERATION_MODEL")
            .unwrap_or_else(|_| "gemini-1.5-flash-8b".to_string());
        let generation_api_base = std::env::var("GENERATION_API_BASE").unwrap_or_else(|_| {
            "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
        });
        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            jwt_secret,
            gemini_api_key,
            blob_read_write_token,
            blob_store_url,
            generation_model,
            generation_api_base,
            cors_origin,
        })
    }
}
