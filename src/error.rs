//! Error types for arkdata operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArkdataError>;

#[derive(Error, Debug)]
pub enum ArkdataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Missing required categories: {}", missing.join(", "))]
    MissingCategories { missing: Vec<String> },

    #[error("Invalid version string: {version}")]
    InvalidVersion { version: String },

    #[error("No comparison in progress")]
    NoComparison,

    #[error("Persistence error: {message}")]
    Persistence { message: String },

    #[error("Fetch error: {message}")]
    Fetch { message: String },

    #[error("Operation already in progress: {operation}")]
    Busy { operation: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),
}

impl ArkdataError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence {
            message: msg.into(),
        }
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch {
            message: msg.into(),
        }
    }

    pub fn busy(operation: impl Into<String>) -> Self {
        Self::Busy {
            operation: operation.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    /// Whether this error belongs to the validation class
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::MissingCategories { .. }
                | Self::InvalidVersion { .. }
                | Self::NoComparison
        )
    }
}
