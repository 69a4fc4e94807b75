//! Strategy construction options and endpoint derivation.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigurationError;

/// Path of the request token endpoint, relative to the application URL.
pub const REQUEST_TOKEN_PATH: &str = "/plugins/servlet/oauth/request-token";
/// Path of the access token endpoint, relative to the application URL.
pub const ACCESS_TOKEN_PATH: &str = "/plugins/servlet/oauth/access-token";
/// Path of the user authorization page, relative to the application URL.
pub const AUTHORIZE_PATH: &str = "/plugins/servlet/oauth/authorize";

/// OAuth 1.0a signature method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureMethod {
    /// RSA-SHA1; the consumer secret is a PEM-encoded RSA private key.
    #[default]
    RsaSha1,
    /// HMAC-SHA1 keyed by consumer secret and token secret.
    HmacSha1,
    /// PLAINTEXT; only sensible over TLS.
    Plaintext,
}

impl SignatureMethod {
    /// Value sent as `oauth_signature_method`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RsaSha1 => "RSA-SHA1",
            Self::HmacSha1 => "HMAC-SHA1",
            Self::Plaintext => "PLAINTEXT",
        }
    }
}

impl fmt::Display for SignatureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureMethod {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RSA-SHA1" => Ok(Self::RsaSha1),
            "HMAC-SHA1" => Ok(Self::HmacSha1),
            "PLAINTEXT" => Ok(Self::Plaintext),
            _ => Err(ConfigurationError::UnsupportedSignatureMethod(s.to_owned())),
        }
    }
}

/// Options accepted by the Atlassian strategy.
///
/// Only `application_url` and `callback_url` are required. Endpoint URLs
/// left unset are derived from `application_url`.
///
/// ```
/// use atlassian_oauth::StrategyOptions;
///
/// let resolved = StrategyOptions::new("https://jira.example.com", "oob")
///     .consumer_key("my-app")
///     .consumer_secret("shared-secret")
///     .signature_method("HMAC-SHA1")
///     .resolve()
///     .unwrap();
///
/// assert_eq!(
///     resolved.endpoints.request_token_url,
///     "https://jira.example.com/plugins/servlet/oauth/request-token"
/// );
/// ```
#[derive(Clone, Default)]
pub struct StrategyOptions {
    /// Base URL of the Atlassian application.
    pub application_url: Option<String>,
    /// URL the user is sent back to after authorizing (or `oob`).
    pub callback_url: Option<String>,
    /// OAuth consumer key configured in the application link.
    pub consumer_key: String,
    /// Consumer secret. For RSA-SHA1 this is the PEM private key.
    pub consumer_secret: String,
    /// Override for the request token endpoint.
    pub request_token_url: Option<String>,
    /// Override for the access token endpoint.
    pub access_token_url: Option<String>,
    /// Override for the user authorization page.
    pub user_authorization_url: Option<String>,
    /// Signature method name; RSA-SHA1 when unset.
    pub signature_method: Option<String>,
}

impl StrategyOptions {
    /// Create options with the two required URLs.
    #[must_use]
    pub fn new(application_url: impl Into<String>, callback_url: impl Into<String>) -> Self {
        Self {
            application_url: Some(application_url.into()),
            callback_url: Some(callback_url.into()),
            ..Self::default()
        }
    }

    /// Set the consumer key.
    #[must_use]
    pub fn consumer_key(mut self, consumer_key: impl Into<String>) -> Self {
        self.consumer_key = consumer_key.into();
        self
    }

    /// Set the consumer secret (PEM private key for RSA-SHA1).
    #[must_use]
    pub fn consumer_secret(mut self, consumer_secret: impl Into<String>) -> Self {
        self.consumer_secret = consumer_secret.into();
        self
    }

    /// Override the request token endpoint.
    #[must_use]
    pub fn request_token_url(mut self, url: impl Into<String>) -> Self {
        self.request_token_url = Some(url.into());
        self
    }

    /// Override the access token endpoint.
    #[must_use]
    pub fn access_token_url(mut self, url: impl Into<String>) -> Self {
        self.access_token_url = Some(url.into());
        self
    }

    /// Override the user authorization page.
    #[must_use]
    pub fn user_authorization_url(mut self, url: impl Into<String>) -> Self {
        self.user_authorization_url = Some(url.into());
        self
    }

    /// Set the signature method by name.
    #[must_use]
    pub fn signature_method(mut self, method: impl Into<String>) -> Self {
        self.signature_method = Some(method.into());
        self
    }

    /// Validate the options and fill in derived values.
    ///
    /// Endpoint URLs are derived by plain concatenation; a trailing slash on
    /// `application_url` is kept as-is.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingApplicationUrl`] or
    /// [`ConfigurationError::MissingCallbackUrl`] when a required URL is
    /// absent or empty, and
    /// [`ConfigurationError::UnsupportedSignatureMethod`] for unknown methods.
    pub fn resolve(self) -> Result<OAuthOptions, ConfigurationError> {
        let application_url = non_empty(self.application_url)
            .ok_or(ConfigurationError::MissingApplicationUrl)?;
        let callback_url =
            non_empty(self.callback_url).ok_or(ConfigurationError::MissingCallbackUrl)?;

        let signature_method = match non_empty(self.signature_method) {
            Some(name) => name.parse()?,
            None => SignatureMethod::default(),
        };

        let derive = |explicit: Option<String>, path: &str| {
            non_empty(explicit).unwrap_or_else(|| format!("{application_url}{path}"))
        };
        let endpoints = Endpoints {
            request_token_url: derive(self.request_token_url, REQUEST_TOKEN_PATH),
            access_token_url: derive(self.access_token_url, ACCESS_TOKEN_PATH),
            user_authorization_url: derive(self.user_authorization_url, AUTHORIZE_PATH),
        };

        Ok(OAuthOptions {
            application_url,
            callback_url,
            consumer_key: self.consumer_key,
            consumer_secret: self.consumer_secret,
            endpoints,
            signature_method,
        })
    }
}

impl fmt::Debug for StrategyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyOptions")
            .field("application_url", &self.application_url)
            .field("callback_url", &self.callback_url)
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("request_token_url", &self.request_token_url)
            .field("access_token_url", &self.access_token_url)
            .field("user_authorization_url", &self.user_authorization_url)
            .field("signature_method", &self.signature_method)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// The three OAuth 1.0a endpoints of an Atlassian application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Temporary credential request endpoint.
    pub request_token_url: String,
    /// Token credential request endpoint.
    pub access_token_url: String,
    /// Resource owner authorization page.
    pub user_authorization_url: String,
}

/// Fully populated options handed to the OAuth engine.
#[derive(Clone)]
pub struct OAuthOptions {
    /// Base URL of the Atlassian application.
    pub application_url: String,
    /// Callback URL sent as `oauth_callback`.
    pub callback_url: String,
    /// OAuth consumer key.
    pub consumer_key: String,
    /// Consumer secret (PEM private key for RSA-SHA1).
    pub consumer_secret: String,
    /// Resolved endpoint URLs.
    pub endpoints: Endpoints,
    /// Signature method.
    pub signature_method: SignatureMethod,
}

impl fmt::Debug for OAuthOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthOptions")
            .field("application_url", &self.application_url)
            .field("callback_url", &self.callback_url)
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("endpoints", &self.endpoints)
            .field("signature_method", &self.signature_method)
            .finish()
    }
}
