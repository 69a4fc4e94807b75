//! Arguments and strategy setup shared by all commands.

use std::path::PathBuf;

use atlassian_oauth::{AtlassianStrategy, Credentials, StrategyOptions, UserProfile, VerifyError};
use atlassian_oauth_config::{AtlassianConfig, CliSettings, Config};
use clap::Args;

use crate::error::CliError;

/// Verify callback that accepts every resolved profile.
type AcceptProfile = fn(&Credentials, UserProfile) -> Result<Option<UserProfile>, VerifyError>;

/// Strategy used by the CLI; the "user" is the profile itself.
pub(crate) type CliStrategy = AtlassianStrategy<AcceptProfile>;

/// Connection arguments accepted by every command.
#[derive(Args)]
pub(crate) struct CommonArgs {
    /// Path to configuration file (default: auto-discover atlassian-oauth.toml).
    #[arg(short, long)]
    pub(crate) config: Option<PathBuf>,

    /// Atlassian application base URL (default: from config).
    #[arg(short = 'u', long, env = "ATLASSIAN_APPLICATION_URL")]
    pub(crate) application_url: Option<String>,

    /// OAuth callback URL, or "oob" for a copy-paste verifier (default: from config or "oob").
    #[arg(long)]
    pub(crate) callback_url: Option<String>,

    /// OAuth consumer key (default: from config or "atlassian-oauth").
    #[arg(long)]
    pub(crate) consumer_key: Option<String>,

    /// Path to RSA private key file (default: from config or "private_key.pem").
    #[arg(short = 'k', long = "private-key")]
    pub(crate) private_key: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl CommonArgs {
    /// Load config with command-line overrides applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be loaded or is incomplete.
    pub(crate) fn load_config(&self) -> Result<Config, CliError> {
        let config = Config::load(self.config.as_deref(), Some(&self.cli_settings()))?;
        config.require_atlassian()?;
        Ok(config)
    }

    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            application_url: self.application_url.clone(),
            callback_url: self.callback_url.clone(),
            consumer_key: self.consumer_key.clone(),
            private_key: self.private_key.clone(),
        }
    }
}

/// Build strategy options from the `[atlassian]` section and key material.
pub(crate) fn strategy_options(config: &AtlassianConfig, consumer_secret: String) -> StrategyOptions {
    let mut options = StrategyOptions::new(&config.application_url, &config.callback_url)
        .consumer_key(&config.consumer_key)
        .consumer_secret(consumer_secret);
    options.signature_method.clone_from(&config.signature_method);
    options.request_token_url.clone_from(&config.request_token_url);
    options.access_token_url.clone_from(&config.access_token_url);
    options
        .user_authorization_url
        .clone_from(&config.user_authorization_url);
    options
}

/// Build the strategy, reading the private key from disk.
///
/// # Errors
///
/// Returns an error if the key cannot be read or the options are invalid.
pub(crate) fn build_strategy(config: &AtlassianConfig) -> Result<CliStrategy, CliError> {
    let consumer_secret = config.read_private_key()?;
    let options = strategy_options(config, consumer_secret);
    let strategy = AtlassianStrategy::new(options, accept_profile as AcceptProfile)?;
    Ok(strategy)
}

fn accept_profile(
    _: &Credentials,
    profile: UserProfile,
) -> Result<Option<UserProfile>, VerifyError> {
    Ok(Some(profile))
}
