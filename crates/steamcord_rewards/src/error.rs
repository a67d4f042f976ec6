//! Error types for reward configuration and permission backends

use thiserror::Error;

/// Reward configuration errors.
///
/// Any of these is fatal when the rule set is loaded: a malformed rule set
/// is never partially applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Reward for group \"{group}\" has no requirements")]
    EmptyRequirements { group: String },

    #[error("Reward group name cannot be empty")]
    EmptyGroupName,

    #[error("Unknown requirement: {0}")]
    UnknownRequirement(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors reported by a [`PermissionService`](crate::PermissionService).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Permission backend error: {0}")]
    Backend(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
pub type PermissionResult<T> = Result<T, PermissionError>;
