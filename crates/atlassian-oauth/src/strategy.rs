//! Login strategy driving the OAuth 1.0a handshake.
//!
//! [`OAuthStrategy`] is provider-agnostic: it composes an [`OAuthEngine`], a
//! [`ProfileResolver`] and a verify callback. [`AtlassianStrategy`] wires
//! it to Atlassian endpoints.
//!
//! A login is two calls separated by a browser redirect:
//!
//! ```no_run
//! use atlassian_oauth::{AtlassianStrategy, AuthOutcome, CallbackParams, StrategyOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = StrategyOptions::new("https://jira.example.com", "https://app.example.com/callback")
//!     .consumer_key("my-app")
//!     .consumer_secret(std::fs::read_to_string("private_key.pem")?);
//! let strategy = AtlassianStrategy::new(options, |_credentials, profile| Ok(Some(profile)))?;
//!
//! // Redirect the user and keep `pending` in the session.
//! let authorization = strategy.begin()?;
//! println!("{}", authorization.redirect_url);
//!
//! // Later, on the callback request:
//! let callback = CallbackParams::from_query("oauth_token=abc&oauth_verifier=123");
//! if let AuthOutcome::Success(profile) = strategy.complete(&authorization.pending, &callback)? {
//!     println!("logged in as {}", profile.username);
//! }
//! # Ok(())
//! # }
//! ```

use tracing::{info, warn};

use crate::error::{AuthError, ConfigurationError, ProfileError, VerifyError};
use crate::oauth::{Credentials, OAuthConsumer, OAuthEngine, RequestToken, parse_form};
use crate::options::{OAuthOptions, StrategyOptions};
use crate::profile::{ProfileFetcher, ProfileResolver, UserProfile};

/// Name the Atlassian strategy registers under.
pub const STRATEGY_NAME: &str = "atlassian-oauth";

/// Result of starting a login.
#[derive(Debug, Clone)]
pub struct Authorization {
    /// Where to send the user's browser.
    pub redirect_url: String,
    /// Request token to keep until the callback arrives.
    pub pending: RequestToken,
}

/// Query parameters of the provider's callback request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub oauth_token: Option<String>,
    pub oauth_verifier: Option<String>,
    /// Set when the user refused access.
    pub denied: bool,
}

impl CallbackParams {
    /// Parse the callback query string (without the leading `?`).
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut params = parse_form(query.trim_start_matches('?'));
        Self {
            oauth_token: params.remove("oauth_token"),
            oauth_verifier: params.remove("oauth_verifier"),
            denied: params.contains_key("denied"),
        }
    }
}

/// How a completed login ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome<U> {
    /// Verify callback accepted the user.
    Success(U),
    /// Verify callback returned no user.
    Rejected,
    /// User refused access on the provider's authorization page.
    Denied,
}

/// Generic OAuth 1.0a login strategy.
pub struct OAuthStrategy<E, R, V> {
    name: &'static str,
    engine: E,
    resolver: R,
    verify: V,
}

/// Strategy authenticating against an Atlassian application.
pub type AtlassianStrategy<V, E = OAuthConsumer> = OAuthStrategy<E, ProfileFetcher, V>;

impl<V> OAuthStrategy<OAuthConsumer, ProfileFetcher, V> {
    /// Build an Atlassian strategy signing requests over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if `application_url` or `callback_url`
    /// is missing, the signature method is unknown, or an RSA-SHA1 consumer
    /// secret is not a valid PEM key.
    pub fn new<U>(options: StrategyOptions, verify: V) -> Result<Self, ConfigurationError>
    where
        V: Fn(&Credentials, UserProfile) -> Result<Option<U>, VerifyError>,
    {
        Self::with_engine(options, OAuthConsumer::new, verify)
    }
}

impl<E: OAuthEngine, V> OAuthStrategy<E, ProfileFetcher, V> {
    /// Build an Atlassian strategy around a custom engine.
    ///
    /// `engine` receives the resolved options, endpoints included.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the options are invalid or `engine`
    /// fails.
    pub fn with_engine<F, U>(
        options: StrategyOptions,
        engine: F,
        verify: V,
    ) -> Result<Self, ConfigurationError>
    where
        F: FnOnce(&OAuthOptions) -> Result<E, ConfigurationError>,
        V: Fn(&Credentials, UserProfile) -> Result<Option<U>, VerifyError>,
    {
        let resolved = options.resolve()?;
        let engine = engine(&resolved)?;
        let resolver = ProfileFetcher::new(resolved.application_url);

        Ok(Self::from_parts(STRATEGY_NAME, engine, resolver, verify))
    }

    /// Base URL of the Atlassian application.
    #[must_use]
    pub fn application_url(&self) -> &str {
        self.resolver.application_url()
    }
}

impl<E: OAuthEngine, R: ProfileResolver, V> OAuthStrategy<E, R, V> {
    /// Assemble a strategy from its parts.
    #[must_use]
    pub fn from_parts<U>(name: &'static str, engine: E, resolver: R, verify: V) -> Self
    where
        V: Fn(&Credentials, R::Profile) -> Result<Option<U>, VerifyError>,
    {
        Self {
            name,
            engine,
            resolver,
            verify,
        }
    }

    /// Registry name of this strategy.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Engine used for the handshake and signed requests.
    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Obtain a request token and the URL to redirect the user to.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::RequestToken`] if the provider refuses.
    pub fn begin(&self) -> Result<Authorization, AuthError> {
        let pending = self
            .engine
            .request_token()
            .map_err(AuthError::RequestToken)?;
        let redirect_url = self.engine.authorization_url(&pending);
        info!("{}: redirecting user to {}", self.name, redirect_url);

        Ok(Authorization {
            redirect_url,
            pending,
        })
    }

    /// Finish a login from the provider's callback.
    ///
    /// Exchanges the request token, resolves the profile and hands both to
    /// the verify callback.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] on a malformed callback or when any step fails.
    /// No profile is produced alongside an error.
    pub fn complete<U>(
        &self,
        pending: &RequestToken,
        callback: &CallbackParams,
    ) -> Result<AuthOutcome<U>, AuthError>
    where
        V: Fn(&Credentials, R::Profile) -> Result<Option<U>, VerifyError>,
    {
        if callback.denied {
            info!("{}: user denied access", self.name);
            return Ok(AuthOutcome::Denied);
        }
        if callback
            .oauth_token
            .as_deref()
            .is_some_and(|token| token != pending.oauth_token)
        {
            warn!("{}: callback token does not match pending token", self.name);
            return Err(AuthError::TokenMismatch);
        }
        let verifier = callback
            .oauth_verifier
            .as_deref()
            .ok_or(AuthError::MissingVerifier)?;

        let credentials = self
            .engine
            .access_token(pending, verifier)
            .map_err(AuthError::AccessToken)?;
        let profile = self.fetch_profile(&credentials)?;

        match (self.verify)(&credentials, profile).map_err(AuthError::Verify)? {
            Some(user) => {
                info!("{}: authentication succeeded", self.name);
                Ok(AuthOutcome::Success(user))
            }
            None => {
                info!("{}: verify callback rejected user", self.name);
                Ok(AuthOutcome::Rejected)
            }
        }
    }

    /// Resolve the profile for already-issued access credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError`] if resolution fails.
    pub fn fetch_profile(&self, credentials: &Credentials) -> Result<R::Profile, ProfileError> {
        self.resolver.resolve_profile(&self.engine, credentials)
    }
}
