//! OAuth 1.0a login for Atlassian applications.
//!
//! This crate lets a web application delegate login to JIRA, Bitbucket
//! Server or Confluence through three-legged OAuth 1.0a with RSA-SHA1
//! request signing:
//! - [`AtlassianStrategy`]: derives the OAuth endpoints from an application
//!   URL and drives the handshake
//! - [`ProfileFetcher`]: resolves the authenticated user's profile into a
//!   [`UserProfile`]
//! - [`OAuthConsumer`]: HTTP OAuth 1.0a engine behind the [`OAuthEngine`] trait
//!
//! # Resolving a profile
//!
//! ```
//! use atlassian_oauth::{Credentials, MockEngine, ProfileFetcher};
//!
//! let engine = MockEngine::new()
//!     .with_response("https://jira.example.com/plugins/servlet/applinks/whoami", "jdoe")
//!     .with_response(
//!         "https://jira.example.com/rest/api/1.0/users/jdoe",
//!         r#"{"name":"jdoe","displayName":"Jane Doe","slug":"jdoe"}"#,
//!     );
//!
//! let fetcher = ProfileFetcher::new("https://jira.example.com");
//! let profile = fetcher
//!     .fetch_profile(&engine, &Credentials::new("token", "secret"))
//!     .unwrap();
//! assert_eq!(profile.display_name, "Jane Doe");
//! ```

pub mod error;
pub mod oauth;
mod options;
mod profile;
mod strategy;

pub use error::{AuthError, ConfigurationError, OAuthError, ProfileError, RsaKeyError, VerifyError};
pub use oauth::{Credentials, MockEngine, OAuthConsumer, OAuthEngine, RecordedRequest, RequestToken};
pub use options::{
    ACCESS_TOKEN_PATH, AUTHORIZE_PATH, Endpoints, OAuthOptions, REQUEST_TOKEN_PATH,
    SignatureMethod, StrategyOptions,
};
pub use profile::{Email, PROVIDER, ProfileFetcher, ProfileResolver, USERS_PATH, UserProfile, WHOAMI_PATH};
pub use strategy::{
    AtlassianStrategy, AuthOutcome, Authorization, CallbackParams, OAuthStrategy, STRATEGY_NAME,
};
