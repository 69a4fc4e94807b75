//! CLI error types.

use atlassian_oauth::{AuthError, ConfigurationError, ProfileError};
use atlassian_oauth_config::ConfigError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Profile(#[from] ProfileError),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),
}
