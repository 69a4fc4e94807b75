//! Mock OAuth engine for testing.
//!
//! Provides [`MockEngine`] for exercising strategies and profile resolvers
//! without a service provider.

use std::sync::RwLock;

use super::{Credentials, OAuthEngine, RequestToken};
use crate::error::OAuthError;

/// Request observed by a [`MockEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub token: String,
    pub method: String,
    pub url: String,
    pub accept: Option<String>,
}

#[derive(Debug, Clone)]
enum Reply {
    Body(String),
    Status(u16, String),
}

impl Reply {
    fn into_result(self) -> Result<String, OAuthError> {
        match self {
            Self::Body(body) => Ok(body),
            Self::Status(status, body) => Err(OAuthError::HttpResponse { status, body }),
        }
    }
}

#[derive(Debug)]
struct Route {
    /// Only match requests signed with this access token.
    token: Option<String>,
    url: String,
    reply: Reply,
}

/// Mock engine serving scripted responses.
///
/// Routes registered for a specific access token win over token-agnostic
/// ones. Unrouted URLs answer `404`.
///
/// # Example
///
/// ```
/// use atlassian_oauth::{Credentials, MockEngine, OAuthEngine};
///
/// let engine = MockEngine::new()
///     .with_response("https://jira.example.com/plugins/servlet/applinks/whoami", "jdoe");
///
/// let body = engine
///     .perform_secure_request(
///         &Credentials::new("token", "secret"),
///         "GET",
///         "https://jira.example.com/plugins/servlet/applinks/whoami",
///         None,
///     )
///     .unwrap();
/// assert_eq!(body, "jdoe");
/// ```
#[derive(Debug)]
pub struct MockEngine {
    routes: Vec<Route>,
    request_token: Reply,
    request_token_value: RequestToken,
    access_token: Option<Credentials>,
    authorize_url: String,
    requests: RwLock<Vec<RecordedRequest>>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            request_token: Reply::Body(String::new()),
            request_token_value: RequestToken {
                oauth_token: "request-token".to_owned(),
                oauth_token_secret: "request-secret".to_owned(),
            },
            access_token: None,
            authorize_url: "https://mock.invalid/authorize".to_owned(),
            requests: RwLock::new(Vec::new()),
        }
    }
}

impl MockEngine {
    /// Create a mock with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests to `url` with `body`.
    #[must_use]
    pub fn with_response(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.routes.push(Route {
            token: None,
            url: url.into(),
            reply: Reply::Body(body.into()),
        });
        self
    }

    /// Answer requests to `url` signed with `token` with `body`.
    #[must_use]
    pub fn with_user_response(
        mut self,
        token: impl Into<String>,
        url: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        self.routes.push(Route {
            token: Some(token.into()),
            url: url.into(),
            reply: Reply::Body(body.into()),
        });
        self
    }

    /// Answer requests to `url` with an HTTP error status.
    #[must_use]
    pub fn with_status(mut self, url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        self.routes.push(Route {
            token: None,
            url: url.into(),
            reply: Reply::Status(status, body.into()),
        });
        self
    }

    /// Return `token` from [`OAuthEngine::request_token`].
    #[must_use]
    pub fn with_request_token(mut self, token: RequestToken) -> Self {
        self.request_token_value = token;
        self
    }

    /// Make [`OAuthEngine::request_token`] fail with `status`.
    #[must_use]
    pub fn with_request_token_status(mut self, status: u16, body: impl Into<String>) -> Self {
        self.request_token = Reply::Status(status, body.into());
        self
    }

    /// Return `credentials` from [`OAuthEngine::access_token`].
    ///
    /// Without this the exchange fails with `401`.
    #[must_use]
    pub fn with_access_token(mut self, credentials: Credentials) -> Self {
        self.access_token = Some(credentials);
        self
    }

    /// Signed requests performed so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        match self.requests.read() {
            Ok(requests) => requests.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn route(&self, token: &str, url: &str) -> Reply {
        self.routes
            .iter()
            .filter(|route| route.url == url)
            .find(|route| route.token.as_deref() == Some(token))
            .or_else(|| {
                self.routes
                    .iter()
                    .find(|route| route.url == url && route.token.is_none())
            })
            .map_or_else(
                || Reply::Status(404, format!("no route for {url}")),
                |route| route.reply.clone(),
            )
    }
}

impl OAuthEngine for MockEngine {
    fn request_token(&self) -> Result<RequestToken, OAuthError> {
        self.request_token.clone().into_result()?;
        Ok(self.request_token_value.clone())
    }

    fn authorization_url(&self, request_token: &RequestToken) -> String {
        format!(
            "{}?oauth_token={}",
            self.authorize_url, request_token.oauth_token
        )
    }

    fn access_token(
        &self,
        _request_token: &RequestToken,
        _verifier: &str,
    ) -> Result<Credentials, OAuthError> {
        self.access_token
            .clone()
            .ok_or_else(|| OAuthError::HttpResponse {
                status: 401,
                body: "oauth_problem=token_rejected".to_owned(),
            })
    }

    fn perform_secure_request(
        &self,
        credentials: &Credentials,
        method: &str,
        url: &str,
        accept: Option<&str>,
    ) -> Result<String, OAuthError> {
        let mut requests = match self.requests.write() {
            Ok(requests) => requests,
            Err(poisoned) => poisoned.into_inner(),
        };
        requests.push(RecordedRequest {
            token: credentials.token.clone(),
            method: method.to_owned(),
            url: url.to_owned(),
            accept: accept.map(str::to_owned),
        });
        drop(requests);

        self.route(&credentials.token, url).into_result()
    }
}
