//! `atlassian-oauth whoami` command implementation.

use std::io::{self, Write};

use atlassian_oauth::Credentials;
use clap::Args;

use super::common::{CommonArgs, build_strategy};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the whoami command.
#[derive(Args)]
pub(crate) struct WhoamiArgs {
    #[command(flatten)]
    pub(crate) common: CommonArgs,

    /// Print only the username.
    #[arg(long)]
    short: bool,
}

impl WhoamiArgs {
    /// Execute the whoami command.
    ///
    /// # Errors
    ///
    /// Returns an error if credentials are missing or the profile cannot be fetched.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = self.common.load_config()?;
        let atlassian = config.require_atlassian()?;
        let (token, secret) = atlassian.access_credentials()?;
        if secret.is_empty() {
            output.warning("Warning: access_secret is empty");
        }

        let strategy = build_strategy(atlassian)?;
        let profile = strategy.fetch_profile(&Credentials::new(token, secret))?;

        let mut stdout = io::stdout().lock();
        if self.short {
            writeln!(stdout, "{}", profile.username)?;
        } else {
            writeln!(stdout, "{}", serde_json::to_string_pretty(&profile)?)?;
        }

        Ok(())
    }
}
