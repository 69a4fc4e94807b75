//! Error types for the Atlassian OAuth strategy.

use std::str::Utf8Error;

/// Error raised while constructing a strategy from its options.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// `application_url` was absent or empty.
    #[error("Atlassian OAuth strategy requires an application_url option")]
    MissingApplicationUrl,

    /// `callback_url` was absent or empty.
    #[error("Atlassian OAuth strategy requires a callback_url option")]
    MissingCallbackUrl,

    /// Signature method name is not one of RSA-SHA1, HMAC-SHA1 or PLAINTEXT.
    #[error("unsupported OAuth signature method: {0}")]
    UnsupportedSignatureMethod(String),

    /// Consumer secret is not a usable RSA private key.
    #[error("invalid RSA consumer secret")]
    RsaKey(#[from] RsaKeyError),
}

/// RSA key loading/parsing error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RsaKeyError {
    /// Invalid UTF-8 in key.
    #[error("invalid UTF-8 in key")]
    InvalidUtf8(#[from] Utf8Error),

    /// PKCS#1 key parsing error.
    #[error("PKCS#1 key error")]
    Pkcs1(#[from] rsa::pkcs1::Error),

    /// PKCS#8 key parsing error (returned when both formats fail).
    #[error("PKCS#8 key error")]
    Pkcs8(#[from] rsa::pkcs8::Error),
}

/// Failure inside the OAuth engine: signing, transport or token exchange.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum OAuthError {
    /// HTTP request failed (network error, timeout, etc).
    #[error("HTTP request failed")]
    HttpRequest(#[from] ureq::Error),

    /// HTTP response error (server returned error status).
    #[error("HTTP error: {status} - {body}")]
    HttpResponse {
        /// HTTP status code.
        status: u16,
        /// Response body (may contain error details).
        body: String,
    },

    /// Request URL could not be parsed.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// HTTP method the engine does not know how to send.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// Token endpoint response lacked a required parameter.
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    /// Service provider did not confirm the callback URL.
    #[error("service provider did not confirm oauth_callback")]
    CallbackNotConfirmed,

    /// Signature could not be produced.
    #[error("signing failed: {0}")]
    Signing(String),
}

/// Error while resolving the authenticated user's profile.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// One of the signed profile requests failed.
    #[error("{message}")]
    Fetch {
        /// Which step failed.
        message: &'static str,
        /// Underlying OAuth/transport failure.
        #[source]
        source: OAuthError,
    },

    /// Profile body was not valid JSON.
    #[error("failed to parse user profile")]
    Parse(#[source] serde_json::Error),
}

/// Error returned by a user-supplied verify callback.
pub type VerifyError = Box<dyn std::error::Error + Send + Sync>;

/// Error while completing an authentication attempt.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AuthError {
    /// Request token phase failed.
    #[error("failed to obtain request token")]
    RequestToken(#[source] OAuthError),

    /// Access token exchange failed.
    #[error("failed to obtain access token")]
    AccessToken(#[source] OAuthError),

    /// Callback carried no `oauth_verifier`.
    #[error("callback is missing oauth_verifier")]
    MissingVerifier,

    /// Callback `oauth_token` differs from the pending request token.
    #[error("callback oauth_token does not match the pending request token")]
    TokenMismatch,

    /// Profile resolution failed.
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// Verify callback returned an error.
    #[error("user verification failed")]
    Verify(#[source] VerifyError),
}
