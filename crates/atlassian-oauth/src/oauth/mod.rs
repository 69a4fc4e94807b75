//! OAuth 1.0a engine.
//!
//! [`OAuthEngine`] is the seam between the login strategy and the protocol
//! machinery: token exchange, user authorization URLs and signed requests.
//! [`OAuthConsumer`] is the HTTP implementation; [`MockEngine`] serves
//! scripted responses for tests.

mod consumer;
pub(crate) mod key;
mod mock;
pub(crate) mod signature;

use std::collections::HashMap;

pub use consumer::OAuthConsumer;
pub use mock::{MockEngine, RecordedRequest};

use crate::error::OAuthError;
use signature::form_decode;

/// Temporary credentials from the request token phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestToken {
    pub oauth_token: String,
    pub oauth_token_secret: String,
}

/// Access credentials for one authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub token_secret: String,
}

impl Credentials {
    #[must_use]
    pub fn new(token: impl Into<String>, token_secret: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            token_secret: token_secret.into(),
        }
    }
}

/// OAuth 1.0a protocol operations used by a login strategy.
///
/// Implementations must be shareable across threads: one engine serves every
/// concurrent authentication attempt.
pub trait OAuthEngine: Send + Sync {
    /// Obtain temporary credentials (step 1 of the handshake).
    fn request_token(&self) -> Result<RequestToken, OAuthError>;

    /// URL the user must visit to authorize `request_token` (step 2).
    fn authorization_url(&self, request_token: &RequestToken) -> String;

    /// Exchange an authorized request token for access credentials (step 3).
    fn access_token(
        &self,
        request_token: &RequestToken,
        verifier: &str,
    ) -> Result<Credentials, OAuthError>;

    /// Perform a signed request on behalf of `credentials` and return the body.
    ///
    /// `accept` sets the `Accept` header when present.
    fn perform_secure_request(
        &self,
        credentials: &Credentials,
        method: &str,
        url: &str,
        accept: Option<&str>,
    ) -> Result<String, OAuthError>;
}

impl<E: OAuthEngine + ?Sized> OAuthEngine for &E {
    fn request_token(&self) -> Result<RequestToken, OAuthError> {
        (**self).request_token()
    }

    fn authorization_url(&self, request_token: &RequestToken) -> String {
        (**self).authorization_url(request_token)
    }

    fn access_token(
        &self,
        request_token: &RequestToken,
        verifier: &str,
    ) -> Result<Credentials, OAuthError> {
        (**self).access_token(request_token, verifier)
    }

    fn perform_secure_request(
        &self,
        credentials: &Credentials,
        method: &str,
        url: &str,
        accept: Option<&str>,
    ) -> Result<String, OAuthError> {
        (**self).perform_secure_request(credentials, method, url, accept)
    }
}

/// Parse a form-encoded body or query string.
pub(crate) fn parse_form(body: &str) -> HashMap<String, String> {
    body.trim()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (form_decode(key), form_decode(value))
        })
        .collect()
}
