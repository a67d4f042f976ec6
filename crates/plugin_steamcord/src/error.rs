//! Plugin-level errors

use steamcord_api::ApiError;
use steamcord_rewards::{ConfigError, PermissionError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Steamcord API error: {0}")]
    Api(#[from] ApiError),

    #[error("Permission error: {0}")]
    Permission(#[from] PermissionError),

    #[error("Group store error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for PluginError {
    fn from(e: std::io::Error) -> Self {
        PluginError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for PluginError {
    fn from(e: serde_json::Error) -> Self {
        PluginError::Storage(e.to_string())
    }
}

pub type PluginResult<T> = Result<T, PluginError>;
