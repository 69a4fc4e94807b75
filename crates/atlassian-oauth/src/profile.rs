//! Atlassian user profile resolution.
//!
//! The profile is assembled from two signed requests: the applinks `whoami`
//! servlet yields the username, then the REST user resource yields the
//! details.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::ProfileError;
use crate::oauth::{Credentials, OAuthEngine};

/// Provider name carried by every profile.
pub const PROVIDER: &str = "atlassian-oauth";

/// Path of the servlet returning the current username as plain text.
pub const WHOAMI_PATH: &str = "/plugins/servlet/applinks/whoami";
/// Path prefix of the REST user resource.
pub const USERS_PATH: &str = "/rest/api/1.0/users/";

/// Turns access credentials into a user profile.
///
/// Implemented once per provider; the generic strategy invokes it after the
/// access token exchange.
pub trait ProfileResolver: Send + Sync {
    /// Profile type handed to the verify callback.
    type Profile;

    /// Resolve the profile of the user owning `credentials`.
    fn resolve_profile<E: OAuthEngine + ?Sized>(
        &self,
        engine: &E,
        credentials: &Credentials,
    ) -> Result<Self::Profile, ProfileError>;
}

/// E-mail address entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    pub value: String,
}

/// Normalized Atlassian user profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    /// Always [`PROVIDER`].
    pub provider: &'static str,
    pub id: String,
    pub username: String,
    pub display_name: String,
    /// The user's `slug`; not a set of avatar URLs despite the name.
    pub avatar_urls: String,
    pub emails: Vec<Email>,
    #[serde(skip)]
    pub token: String,
    #[serde(skip)]
    pub token_secret: String,
    /// Unparsed user resource body.
    #[serde(skip)]
    pub raw_body: String,
    /// Parsed user resource, including fields not mapped above.
    #[serde(rename = "_json")]
    pub raw_json: Value,
}

/// Profile resolver for Atlassian applications.
#[derive(Debug, Clone)]
pub struct ProfileFetcher {
    application_url: String,
}

impl ProfileFetcher {
    #[must_use]
    pub fn new(application_url: impl Into<String>) -> Self {
        Self {
            application_url: application_url.into(),
        }
    }

    /// Base URL of the Atlassian application.
    #[must_use]
    pub fn application_url(&self) -> &str {
        &self.application_url
    }

    /// URL of the `whoami` servlet.
    #[must_use]
    pub fn whoami_url(&self) -> String {
        format!("{}{}", self.application_url, WHOAMI_PATH)
    }

    /// URL of the REST resource for `username`; the name is not encoded.
    #[must_use]
    pub fn user_url(&self, username: &str) -> String {
        format!("{}{}{}", self.application_url, USERS_PATH, username)
    }

    /// Fetch and normalize the profile of the user owning `credentials`.
    ///
    /// The user resource is only requested once `whoami` succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Fetch`] if either request fails and
    /// [`ProfileError::Parse`] if the user resource is not valid JSON.
    pub fn fetch_profile<E: OAuthEngine + ?Sized>(
        &self,
        engine: &E,
        credentials: &Credentials,
    ) -> Result<UserProfile, ProfileError> {
        let username = engine
            .perform_secure_request(credentials, "GET", &self.whoami_url(), None)
            .map_err(|source| ProfileError::Fetch {
                message: "failed to fetch username",
                source,
            })?;
        debug!("Resolved username {}", username);

        let raw_body = engine
            .perform_secure_request(
                credentials,
                "GET",
                &self.user_url(&username),
                Some("application/json"),
            )
            .map_err(|source| ProfileError::Fetch {
                message: "failed to fetch user profile",
                source,
            })?;

        parse_profile(raw_body, credentials)
    }
}

impl ProfileResolver for ProfileFetcher {
    type Profile = UserProfile;

    fn resolve_profile<E: OAuthEngine + ?Sized>(
        &self,
        engine: &E,
        credentials: &Credentials,
    ) -> Result<UserProfile, ProfileError> {
        self.fetch_profile(engine, credentials)
    }
}

/// Read a string member of the user resource; absent, `null` and
/// non-string values read as empty.
fn string_field<'a>(raw_json: &'a Value, key: &str) -> &'a str {
    raw_json.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn parse_profile(raw_body: String, credentials: &Credentials) -> Result<UserProfile, ProfileError> {
    let raw_json: Value = serde_json::from_str(&raw_body).map_err(ProfileError::Parse)?;
    let name = string_field(&raw_json, "name").to_owned();
    let emails = raw_json
        .get("emailAddress")
        .and_then(Value::as_str)
        .map(|value| {
            vec![Email {
                value: value.to_owned(),
            }]
        })
        .unwrap_or_default();

    Ok(UserProfile {
        provider: PROVIDER,
        id: name.clone(),
        username: name,
        display_name: string_field(&raw_json, "displayName").to_owned(),
        avatar_urls: string_field(&raw_json, "slug").to_owned(),
        emails,
        token: credentials.token.clone(),
        token_secret: credentials.token_secret.clone(),
        raw_body,
        raw_json,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn credentials() -> Credentials {
        Credentials::new("token", "secret")
    }

    #[test]
    fn test_urls() {
        let fetcher = ProfileFetcher::new("https://jira.example.com");

        assert_eq!(
            fetcher.whoami_url(),
            "https://jira.example.com/plugins/servlet/applinks/whoami"
        );
        assert_eq!(
            fetcher.user_url("jdoe"),
            "https://jira.example.com/rest/api/1.0/users/jdoe"
        );
    }

    #[test]
    fn test_user_url_does_not_encode() {
        let fetcher = ProfileFetcher::new("https://jira.example.com");
        assert_eq!(
            fetcher.user_url("j doe"),
            "https://jira.example.com/rest/api/1.0/users/j doe"
        );
    }

    #[test]
    fn test_parse_profile_maps_fields() {
        let body = r#"{"name":"jdoe","displayName":"Jane Doe","slug":"jdoe-slug","emailAddress":"jane@example.com","active":true}"#;
        let profile = parse_profile(body.to_owned(), &credentials()).unwrap();

        assert_eq!(profile.provider, "atlassian-oauth");
        assert_eq!(profile.id, "jdoe");
        assert_eq!(profile.username, "jdoe");
        assert_eq!(profile.display_name, "Jane Doe");
        assert_eq!(profile.avatar_urls, "jdoe-slug");
        assert_eq!(
            profile.emails,
            vec![Email {
                value: "jane@example.com".to_owned()
            }]
        );
        assert_eq!(profile.raw_body, body);
        assert_eq!(profile.raw_json["active"], Value::Bool(true));
        assert_eq!(profile.token, "token");
        assert_eq!(profile.token_secret, "secret");
    }

    #[test]
    fn test_parse_profile_without_email() {
        let profile = parse_profile(r#"{"name":"bot"}"#.to_owned(), &credentials()).unwrap();

        assert!(profile.emails.is_empty());
        assert_eq!(profile.display_name, "");
    }

    #[test]
    fn test_parse_profile_rejects_invalid_json() {
        let result = parse_profile("not-json".to_owned(), &credentials());
        assert!(matches!(result, Err(ProfileError::Parse(_))));
    }

    #[test]
    fn test_parse_profile_accepts_null_and_non_string_fields() {
        let body = r#"{"name":"jdoe","displayName":null,"slug":42,"emailAddress":null}"#;
        let profile = parse_profile(body.to_owned(), &credentials()).unwrap();

        assert_eq!(profile.username, "jdoe");
        assert_eq!(profile.display_name, "");
        assert_eq!(profile.avatar_urls, "");
        assert!(profile.emails.is_empty());
        assert_eq!(profile.raw_json["displayName"], Value::Null);
    }

    #[test]
    fn test_parse_profile_non_object_json() {
        let profile = parse_profile("[1, 2]".to_owned(), &credentials()).unwrap();

        assert_eq!(profile.id, "");
        assert_eq!(profile.raw_json, serde_json::json!([1, 2]));
    }

    #[test]
    fn test_serialize_skips_secrets() {
        let profile = parse_profile(r#"{"name":"jdoe"}"#.to_owned(), &credentials()).unwrap();
        let json = serde_json::to_string(&profile).unwrap();

        assert!(!json.contains("secret"));
        assert!(json.contains(r#""_json":{"name":"jdoe"}"#));
    }
}
