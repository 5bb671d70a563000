//! Configuration management for tickwatch

mod client;
mod liveness;
mod server;
pub mod serde_utils;

pub use client::ClientConfig;
pub use liveness::LivenessConfig;
pub use server::{SeedItem, ServerConfig};

use crate::error::ConfigError;

use std::path::{Path, PathBuf};

/// Get the default configuration directory
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tickwatch")
}

/// Default path of the server configuration file
pub fn default_server_config_path() -> PathBuf {
    default_config_dir().join("server.toml")
}

/// Default path of the client configuration file
pub fn default_client_config_path() -> PathBuf {
    default_config_dir().join("client.toml")
}

/// Checks a loaded configuration for values that parse but cannot work
pub trait Validate {
    /// Reject unusable values with `ConfigError::Invalid`
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Load and validate configuration from a file
pub fn load_config<T>(path: &Path) -> Result<T, ConfigError>
where
    T: serde::de::DeserializeOwned + Validate,
{
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read config: {}", e)))?;

    let config: T = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from `path` if given, otherwise from `default_path`
/// when it exists, otherwise fall back to defaults.
///
/// An explicitly given path must exist; a missing default file is not an error.
pub fn load_or_default<T>(path: Option<&Path>, default_path: &Path) -> Result<T, ConfigError>
where
    T: serde::de::DeserializeOwned + Validate + Default,
{
    match path {
        Some(path) => load_config(path),
        None if default_path.exists() => load_config(default_path),
        None => Ok(T::default()),
    }
}
