use thiserror::Error;

use crate::domain::Platform;

/// Main error type for the engagement tracker
#[derive(Error, Debug)]
pub enum EngagementError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid locator: {0}")]
    Locator(#[from] url::ParseError),

    // Metric source errors
    #[error("Could not extract {platform} metrics: {reason}")]
    Extraction { platform: Platform, reason: String },

    #[error("Platform not supported by this source: {0}")]
    UnsupportedPlatform(Platform),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for EngagementError
pub type Result<T> = std::result::Result<T, EngagementError>;

impl EngagementError {
    /// Build an extraction error for a platform
    pub fn extraction(platform: Platform, reason: impl Into<String>) -> Self {
        EngagementError::Extraction {
            platform,
            reason: reason.into(),
        }
    }
}

impl From<Vec<String>> for EngagementError {
    fn from(problems: Vec<String>) -> Self {
        EngagementError::InvalidConfig(problems.join("; "))
    }
}
