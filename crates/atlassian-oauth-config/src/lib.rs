//! Configuration management for atlassian-oauth.
//!
//! Parses `atlassian-oauth.toml` files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String values in the `[atlassian]` section support
//! `${VAR}` and `${VAR:-default}` expansion, so secrets can stay out of
//! the file:
//!
//! ```toml
//! [atlassian]
//! application_url = "https://jira.example.com"
//! consumer_key = "my-app"
//! private_key = "keys/jira.pem"
//! access_token = "${JIRA_ACCESS_TOKEN}"
//! access_secret = "${JIRA_ACCESS_SECRET:-}"
//! ```

mod expand;

use std::path::{Path, PathBuf};

use serde::Deserialize;

use expand::{expand_env, expand_opt};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "atlassian-oauth.toml";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override application base URL.
    pub application_url: Option<String>,
    /// Override callback URL.
    pub callback_url: Option<String>,
    /// Override consumer key.
    pub consumer_key: Option<String>,
    /// Override private key path.
    pub private_key: Option<PathBuf>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Atlassian application link settings.
    pub atlassian: Option<AtlassianConfig>,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Atlassian application link configuration.
#[derive(Debug, Deserialize)]
pub struct AtlassianConfig {
    /// Base URL of the Atlassian application.
    #[serde(default)]
    pub application_url: String,
    /// OAuth callback URL; `oob` for copy-paste verifier codes.
    #[serde(default = "default_callback_url")]
    pub callback_url: String,
    /// OAuth consumer key.
    #[serde(default = "default_consumer_key")]
    pub consumer_key: String,
    /// Path to the PEM private key (relative to the config file).
    #[serde(default = "default_private_key")]
    pub private_key: PathBuf,
    /// Signature method name (RSA-SHA1 when unset).
    pub signature_method: Option<String>,
    /// Request token endpoint override.
    pub request_token_url: Option<String>,
    /// Access token endpoint override.
    pub access_token_url: Option<String>,
    /// User authorization page override.
    pub user_authorization_url: Option<String>,
    /// OAuth access token from a completed authorization.
    pub access_token: Option<String>,
    /// OAuth access token secret.
    pub access_secret: Option<String>,
}

impl Default for AtlassianConfig {
    fn default() -> Self {
        Self {
            application_url: String::new(),
            callback_url: default_callback_url(),
            consumer_key: default_consumer_key(),
            private_key: default_private_key(),
            signature_method: None,
            request_token_url: None,
            access_token_url: None,
            user_authorization_url: None,
            access_token: None,
            access_secret: None,
        }
    }
}

impl AtlassianConfig {
    /// Validate that all required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any field is empty or has invalid format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.application_url, "atlassian.application_url")?;
        require_http_url(&self.application_url, "atlassian.application_url")?;
        require_non_empty(&self.callback_url, "atlassian.callback_url")?;
        if self.callback_url != "oob" {
            require_http_url(&self.callback_url, "atlassian.callback_url")?;
        }
        require_non_empty(&self.consumer_key, "atlassian.consumer_key")?;

        for (url, field) in [
            (&self.request_token_url, "atlassian.request_token_url"),
            (&self.access_token_url, "atlassian.access_token_url"),
            (&self.user_authorization_url, "atlassian.user_authorization_url"),
        ] {
            if let Some(url) = url {
                require_http_url(url, field)?;
            }
        }

        Ok(())
    }

    /// Stored access credentials as `(token, secret)`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if `access_token` is missing or empty.
    /// A missing secret is returned as an empty string; RSA-SHA1 never uses it.
    pub fn access_credentials(&self) -> Result<(&str, &str), ConfigError> {
        let token = self.access_token.as_deref().unwrap_or_default();
        require_non_empty(token, "atlassian.access_token")?;
        Ok((token, self.access_secret.as_deref().unwrap_or_default()))
    }

    /// Read the PEM private key file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::PrivateKey` if the file cannot be read.
    pub fn read_private_key(&self) -> Result<String, ConfigError> {
        std::fs::read_to_string(&self.private_key).map_err(|source| ConfigError::PrivateKey {
            path: self.private_key.clone(),
            source,
        })
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.application_url = expand_env(&self.application_url, "atlassian.application_url")?;
        self.callback_url = expand_env(&self.callback_url, "atlassian.callback_url")?;
        self.consumer_key = expand_env(&self.consumer_key, "atlassian.consumer_key")?;
        expand_opt(&mut self.signature_method, "atlassian.signature_method")?;
        expand_opt(&mut self.request_token_url, "atlassian.request_token_url")?;
        expand_opt(&mut self.access_token_url, "atlassian.access_token_url")?;
        expand_opt(
            &mut self.user_authorization_url,
            "atlassian.user_authorization_url",
        )?;
        expand_opt(&mut self.access_token, "atlassian.access_token")?;
        expand_opt(&mut self.access_secret, "atlassian.access_secret")?;
        Ok(())
    }
}

fn default_callback_url() -> String {
    "oob".to_owned()
}

fn default_consumer_key() -> String {
    "atlassian-oauth".to_owned()
}

fn default_private_key() -> PathBuf {
    PathBuf::from("private_key.pem")
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`atlassian.access_token`").
        field: String,
        /// Error message (e.g., "${`JIRA_TOKEN`} not set").
        message: String,
    },
    /// Private key file could not be read.
    #[error("Failed to read private key {}: {source}", path.display())]
    PrivateKey {
        /// Key file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `atlassian-oauth.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    ///
    /// Creates the `[atlassian]` section when a setting targets it.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        let touches_section = settings.application_url.is_some()
            || settings.callback_url.is_some()
            || settings.consumer_key.is_some()
            || settings.private_key.is_some();
        if !touches_section {
            return;
        }

        let atlassian = self.atlassian.get_or_insert_with(AtlassianConfig::default);
        if let Some(url) = &settings.application_url {
            atlassian.application_url.clone_from(url);
        }
        if let Some(url) = &settings.callback_url {
            atlassian.callback_url.clone_from(url);
        }
        if let Some(key) = &settings.consumer_key {
            atlassian.consumer_key.clone_from(key);
        }
        if let Some(path) = &settings.private_key {
            atlassian.private_key.clone_from(path);
        }
    }

    /// Get validated Atlassian configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the section is missing or invalid.
    pub fn require_atlassian(&self) -> Result<&AtlassianConfig, ConfigError> {
        let atlassian = self.atlassian.as_ref().ok_or_else(|| {
            ConfigError::Validation(
                "[atlassian] section required in config (or pass --application-url)".into(),
            )
        })?;
        atlassian.validate()?;
        Ok(atlassian)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        if let Some(atlassian) = &mut config.atlassian {
            atlassian.expand_env_vars()?;
            atlassian.private_key = config_dir.join(&atlassian.private_key);
        }
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }
}
