//! `atlassian-oauth authorize` command implementation.

use std::io::{self, Write};

use atlassian_oauth::{AuthOutcome, CallbackParams};
use clap::Args;

use super::common::{CommonArgs, build_strategy};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the authorize command.
#[derive(Args)]
pub(crate) struct AuthorizeArgs {
    #[command(flatten)]
    pub(crate) common: CommonArgs,
}

impl AuthorizeArgs {
    /// Execute the authorize command.
    ///
    /// # Errors
    ///
    /// Returns an error if any step of the handshake fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = self.common.load_config()?;
        let atlassian = config.require_atlassian()?;

        output.info(&format!(
            "Reading private key from {}...",
            atlassian.private_key.display()
        ));
        let strategy = build_strategy(atlassian)?;

        // Step 1: Get request token
        output.info("\nStep 1: Requesting temporary credentials...");
        let authorization = strategy.begin()?;
        output.success("Temporary token received");

        // Step 2: User authorization
        output.separator();
        output.highlight("Step 2: Authorization Required");
        output.separator();
        output.info("\nPlease open this URL in your browser:");
        output.highlight(&format!("\n{}\n", authorization.redirect_url));

        write!(io::stderr(), "Enter the verification code: ")?;
        io::stderr().flush()?;
        let mut verifier = String::new();
        io::stdin().read_line(&mut verifier)?;
        let verifier = verifier.trim();
        if verifier.is_empty() {
            return Err(CliError::Validation(
                "verification code cannot be empty".to_owned(),
            ));
        }

        // Step 3: Exchange for access token and resolve the profile
        output.info("\nStep 3: Exchanging for access token...");
        let callback = CallbackParams {
            oauth_verifier: Some(verifier.to_owned()),
            ..CallbackParams::default()
        };
        let profile = match strategy.complete(&authorization.pending, &callback)? {
            AuthOutcome::Success(profile) => profile,
            AuthOutcome::Rejected | AuthOutcome::Denied => {
                return Err(CliError::Validation("access was denied".to_owned()));
            }
        };

        output.separator();
        output.success("OAuth Authorization Successful!");
        output.separator();
        output.info(&format!(
            "\nAuthenticated as {} ({})",
            profile.display_name, profile.username
        ));
        output.info("\nAdd these credentials to your atlassian-oauth.toml:");
        output.info("\n[atlassian]");
        output.setting("application_url", &atlassian.application_url);
        output.setting("consumer_key", &atlassian.consumer_key);
        output.setting("access_token", &profile.token);
        output.setting("access_secret", &profile.token_secret);

        Ok(())
    }
}
