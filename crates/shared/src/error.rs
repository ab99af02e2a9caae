//! Error types for podrole

use thiserror::Error;

/// Error raised when a role pattern cannot be compiled
#[derive(Debug, Error)]
pub enum PatternError {
    #[error(transparent)]
    Regex(#[from] regex::Error),

    #[error(transparent)]
    Glob(#[from] glob::PatternError),
}

/// Error raised when an address has no role and no default role is configured
#[derive(Debug, Error)]
#[error("Unable to find role for address '{address}'")]
pub struct RoleNotFoundError {
    pub address: String,
}

/// Error raised when a tenant pattern is rejected
#[derive(Debug, Error)]
#[error("Invalid role pattern '{pattern}' on tenant '{tenant}': {source}")]
pub struct InvalidPatternError {
    pub tenant: String,
    pub pattern: String,
    #[source]
    pub source: PatternError,
}

/// General store error type
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    NotFound(#[from] RoleNotFoundError),

    #[error(transparent)]
    InvalidPattern(#[from] InvalidPatternError),

    #[error("Invalid allowed-roles annotation: {0}")]
    InvalidAnnotation(#[source] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
