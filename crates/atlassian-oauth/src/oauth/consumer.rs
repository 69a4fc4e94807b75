//! HTTP implementation of [`OAuthEngine`].

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, warn};
use ureq::Agent;
use ureq::http::Response;

use super::signature::{OAuthParams, RequestSigner, authorization_header, oauth_encode};
use super::{Credentials, OAuthEngine, RequestToken, parse_form};
use crate::error::{ConfigurationError, OAuthError};
use crate::options::{Endpoints, OAuthOptions, SignatureMethod};

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// OAuth 1.0a consumer talking to a service provider over HTTP.
///
/// Handles the three-legged flow:
/// 1. Request temporary credentials (request token)
/// 2. Generate authorization URL for user
/// 3. Exchange verifier for access credentials
///
/// and signs arbitrary requests with the resulting access token.
pub struct OAuthConsumer {
    agent: Agent,
    consumer_key: String,
    callback_url: String,
    signer: RequestSigner,
    endpoints: Endpoints,
}

impl OAuthConsumer {
    /// Create a consumer from resolved options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::RsaKey`] if the signature method is
    /// RSA-SHA1 and the consumer secret is not a PEM private key.
    pub fn new(options: &OAuthOptions) -> Result<Self, ConfigurationError> {
        let signer = RequestSigner::new(options.signature_method, &options.consumer_secret)?;

        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT)))
            .http_status_as_error(false)
            .build()
            .into();

        Ok(Self {
            agent,
            consumer_key: options.consumer_key.clone(),
            callback_url: options.callback_url.clone(),
            signer,
            endpoints: options.endpoints.clone(),
        })
    }

    /// Endpoints this consumer talks to.
    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Signature method used for every request.
    #[must_use]
    pub fn signature_method(&self) -> SignatureMethod {
        self.signer.method()
    }

    /// POST to a token endpoint and return the decoded response parameters.
    fn token_request(
        &self,
        url: &str,
        params: &OAuthParams<'_>,
        token_secret: &str,
    ) -> Result<HashMap<String, String>, OAuthError> {
        let auth_header = authorization_header(&self.signer, "POST", url, params, token_secret)?;
        debug!("POST {}", url);

        let response = self
            .agent
            .post(url)
            .header("Authorization", &auth_header)
            .send(&[] as &[u8])?;

        let body = read_body(response)?;
        Ok(parse_form(&body))
    }
}

impl OAuthEngine for OAuthConsumer {
    fn request_token(&self) -> Result<RequestToken, OAuthError> {
        let params = OAuthParams {
            consumer_key: &self.consumer_key,
            callback: Some(&self.callback_url),
            ..OAuthParams::default()
        };
        let response = self.token_request(&self.endpoints.request_token_url, &params, "")?;

        // Absent in OAuth 1.0 (pre-1.0a) providers
        if response
            .get("oauth_callback_confirmed")
            .is_some_and(|confirmed| confirmed != "true")
        {
            return Err(OAuthError::CallbackNotConfirmed);
        }

        Ok(RequestToken {
            oauth_token: required_param(&response, "oauth_token")?,
            oauth_token_secret: required_param(&response, "oauth_token_secret")?,
        })
    }

    fn authorization_url(&self, request_token: &RequestToken) -> String {
        let separator = if self.endpoints.user_authorization_url.contains('?') {
            '&'
        } else {
            '?'
        };
        format!(
            "{}{}oauth_token={}",
            self.endpoints.user_authorization_url,
            separator,
            oauth_encode(&request_token.oauth_token)
        )
    }

    fn access_token(
        &self,
        request_token: &RequestToken,
        verifier: &str,
    ) -> Result<Credentials, OAuthError> {
        let params = OAuthParams {
            consumer_key: &self.consumer_key,
            token: Some(&request_token.oauth_token),
            verifier: Some(verifier),
            ..OAuthParams::default()
        };
        let response = self.token_request(
            &self.endpoints.access_token_url,
            &params,
            &request_token.oauth_token_secret,
        )?;

        Ok(Credentials {
            token: required_param(&response, "oauth_token")?,
            token_secret: required_param(&response, "oauth_token_secret")?,
        })
    }

    fn perform_secure_request(
        &self,
        credentials: &Credentials,
        method: &str,
        url: &str,
        accept: Option<&str>,
    ) -> Result<String, OAuthError> {
        let method = method.to_ascii_uppercase();
        let params = OAuthParams {
            consumer_key: &self.consumer_key,
            token: Some(&credentials.token),
            ..OAuthParams::default()
        };
        let auth_header =
            authorization_header(&self.signer, &method, url, &params, &credentials.token_secret)?;
        let accept = accept.unwrap_or("*/*");
        debug!("{} {}", method, url);

        let response = match method.as_str() {
            "GET" => self
                .agent
                .get(url)
                .header("Authorization", &auth_header)
                .header("Accept", accept)
                .call()?,
            "DELETE" => self
                .agent
                .delete(url)
                .header("Authorization", &auth_header)
                .header("Accept", accept)
                .call()?,
            "POST" => self
                .agent
                .post(url)
                .header("Authorization", &auth_header)
                .header("Accept", accept)
                .send(&[] as &[u8])?,
            "PUT" => self
                .agent
                .put(url)
                .header("Authorization", &auth_header)
                .header("Accept", accept)
                .send(&[] as &[u8])?,
            _ => return Err(OAuthError::UnsupportedMethod(method)),
        };

        read_body(response)
    }
}

/// Read a response body, turning error statuses into [`OAuthError::HttpResponse`].
fn read_body(response: Response<ureq::Body>) -> Result<String, OAuthError> {
    let status = response.status().as_u16();
    let mut body_reader = response.into_body();

    if status >= 400 {
        let body = body_reader
            .read_to_string()
            .unwrap_or_else(|_| "(unable to read error body)".to_owned());
        warn!("OAuth provider returned {}", status);
        return Err(OAuthError::HttpResponse { status, body });
    }

    Ok(body_reader.read_to_string()?)
}

/// Extract required parameter from a token endpoint response.
fn required_param(
    params: &HashMap<String, String>,
    key: &'static str,
) -> Result<String, OAuthError> {
    params
        .get(key)
        .cloned()
        .ok_or(OAuthError::MissingParameter(key))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    use super::*;
    use crate::error::ProfileError;
    use crate::options::StrategyOptions;
    use crate::profile::ProfileFetcher;

    const TEST_KEY: &str = include_str!("../../tests/fixtures/private_key.pem");

    /// Loopback provider answering one connection per scripted response.
    ///
    /// Joining the handle yields the request heads (request line and
    /// headers, lowercased) in arrival order.
    fn serve(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let mut heads = Vec::new();
            for (status, body) in responses {
                let (stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(&stream);
                let mut head = String::new();
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).unwrap();
                    if line == "\r\n" || line.is_empty() {
                        break;
                    }
                    head.push_str(&line);
                }
                heads.push(head.to_ascii_lowercase());

                let response = format!(
                    "HTTP/1.1 {status} Scripted\r\ncontent-type: text/plain\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                (&stream).write_all(response.as_bytes()).unwrap();
            }
            heads
        });

        (base_url, handle)
    }

    fn loopback_consumer(base_url: &str) -> OAuthConsumer {
        consumer(StrategyOptions::new(base_url, "oob").consumer_secret(TEST_KEY))
    }

    fn request_token() -> RequestToken {
        RequestToken {
            oauth_token: "rt".to_owned(),
            oauth_token_secret: "rs".to_owned(),
        }
    }

    fn consumer(options: StrategyOptions) -> OAuthConsumer {
        OAuthConsumer::new(&options.consumer_key("consumer_key").resolve().unwrap()).unwrap()
    }

    #[test]
    fn test_endpoints_from_application_url() {
        let consumer = consumer(
            StrategyOptions::new("https://jira.example.com", "oob").consumer_secret(TEST_KEY),
        );

        assert_eq!(
            consumer.endpoints().request_token_url,
            "https://jira.example.com/plugins/servlet/oauth/request-token"
        );
        assert_eq!(consumer.signature_method(), SignatureMethod::RsaSha1);
    }

    #[test]
    fn test_authorization_url() {
        let consumer = consumer(
            StrategyOptions::new("https://jira.example.com", "oob").consumer_secret(TEST_KEY),
        );
        let request_token = RequestToken {
            oauth_token: "test token".to_owned(),
            oauth_token_secret: "test_secret".to_owned(),
        };

        assert_eq!(
            consumer.authorization_url(&request_token),
            "https://jira.example.com/plugins/servlet/oauth/authorize?oauth_token=test%20token"
        );
    }

    #[test]
    fn test_authorization_url_with_existing_query() {
        let consumer = consumer(
            StrategyOptions::new("https://jira.example.com", "oob")
                .consumer_secret("secret")
                .signature_method("PLAINTEXT")
                .user_authorization_url("https://sso.example.com/authorize?realm=jira"),
        );
        let request_token = RequestToken {
            oauth_token: "t".to_owned(),
            oauth_token_secret: "s".to_owned(),
        };

        assert_eq!(
            consumer.authorization_url(&request_token),
            "https://sso.example.com/authorize?realm=jira&oauth_token=t"
        );
    }

    #[test]
    fn test_required_param_missing() {
        let result = required_param(&HashMap::new(), "oauth_token");

        assert!(matches!(
            result,
            Err(OAuthError::MissingParameter("oauth_token"))
        ));
    }

    #[test]
    fn test_unsupported_method_is_rejected_before_sending() {
        let consumer = consumer(
            StrategyOptions::new("https://jira.example.com", "oob").consumer_secret(TEST_KEY),
        );
        let result = consumer.perform_secure_request(
            &Credentials::new("token", "secret"),
            "PATCH",
            "https://jira.example.com/rest/api/1.0/users/jdoe",
            None,
        );

        assert!(matches!(result, Err(OAuthError::UnsupportedMethod(m)) if m == "PATCH"));
    }

    #[test]
    fn test_request_token_over_http() {
        let (base_url, server) = serve(vec![(
            200,
            "oauth_token=rt&oauth_token_secret=rs&oauth_callback_confirmed=true",
        )]);

        let token = loopback_consumer(&base_url).request_token().unwrap();
        let heads = server.join().unwrap();

        assert_eq!(token, request_token());
        assert!(heads[0].starts_with("post /plugins/servlet/oauth/request-token "));
        assert!(heads[0].contains("authorization: oauth "));
        assert!(heads[0].contains(r#"oauth_callback="oob""#));
        assert!(heads[0].contains(r#"oauth_signature_method="rsa-sha1""#));
    }

    #[test]
    fn test_request_token_callback_not_confirmed() {
        let (base_url, server) = serve(vec![(
            200,
            "oauth_token=rt&oauth_token_secret=rs&oauth_callback_confirmed=false",
        )]);

        let result = loopback_consumer(&base_url).request_token();
        server.join().unwrap();

        assert!(matches!(result, Err(OAuthError::CallbackNotConfirmed)));
    }

    #[test]
    fn test_request_token_missing_secret() {
        let (base_url, server) = serve(vec![(200, "oauth_token=rt")]);

        let result = loopback_consumer(&base_url).request_token();
        server.join().unwrap();

        assert!(matches!(
            result,
            Err(OAuthError::MissingParameter("oauth_token_secret"))
        ));
    }

    #[test]
    fn test_request_token_error_status() {
        let (base_url, server) = serve(vec![(401, "oauth_problem=consumer_key_unknown")]);

        let result = loopback_consumer(&base_url).request_token();
        server.join().unwrap();

        match result {
            Err(OAuthError::HttpResponse { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "oauth_problem=consumer_key_unknown");
            }
            other => panic!("expected HTTP error, got {other:?}"),
        }
    }

    #[test]
    fn test_access_token_over_http() {
        let (base_url, server) = serve(vec![(200, "oauth_token=at&oauth_token_secret=as")]);

        let credentials = loopback_consumer(&base_url)
            .access_token(&request_token(), "v123")
            .unwrap();
        let heads = server.join().unwrap();

        assert_eq!(credentials, Credentials::new("at", "as"));
        assert!(heads[0].starts_with("post /plugins/servlet/oauth/access-token "));
        assert!(heads[0].contains(r#"oauth_token="rt""#));
        assert!(heads[0].contains(r#"oauth_verifier="v123""#));
    }

    #[test]
    fn test_profile_requests_over_http() {
        let (base_url, server) = serve(vec![
            (200, "jdoe"),
            (200, r#"{"name":"jdoe","displayName":"Jane Doe","slug":"jdoe"}"#),
        ]);
        let consumer = loopback_consumer(&base_url);

        let profile = ProfileFetcher::new(&base_url)
            .fetch_profile(&consumer, &Credentials::new("at", "as"))
            .unwrap();
        let heads = server.join().unwrap();

        assert_eq!(profile.display_name, "Jane Doe");
        assert!(heads[0].starts_with("get /plugins/servlet/applinks/whoami "));
        assert!(heads[0].contains("accept: */*"));
        assert!(heads[1].starts_with("get /rest/api/1.0/users/jdoe "));
        assert!(heads[1].contains("accept: application/json"));
        assert!(heads[1].contains(r#"oauth_token="at""#));
    }

    #[test]
    fn test_whoami_error_status_over_http() {
        let (base_url, server) = serve(vec![(401, "oauth_problem=token_rejected")]);
        let consumer = loopback_consumer(&base_url);

        let result = ProfileFetcher::new(&base_url)
            .fetch_profile(&consumer, &Credentials::new("at", "as"));
        server.join().unwrap();

        match result {
            Err(ProfileError::Fetch { message, source }) => {
                assert_eq!(message, "failed to fetch username");
                assert!(matches!(
                    source,
                    OAuthError::HttpResponse { status: 401, .. }
                ));
            }
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[test]
    fn test_secure_request_methods_over_http() {
        let (base_url, server) = serve(vec![(200, "deleted"), (200, "created"), (200, "updated")]);
        let consumer = loopback_consumer(&base_url);
        let credentials = Credentials::new("at", "as");
        let url = format!("{base_url}/rest/api/1.0/users/jdoe");

        let bodies: Vec<String> = ["delete", "POST", "Put"]
            .into_iter()
            .map(|method| {
                consumer
                    .perform_secure_request(&credentials, method, &url, None)
                    .unwrap()
            })
            .collect();
        let heads = server.join().unwrap();

        assert_eq!(bodies, ["deleted", "created", "updated"]);
        assert!(heads[0].starts_with("delete /rest/api/1.0/users/jdoe "));
        assert!(heads[1].starts_with("post /rest/api/1.0/users/jdoe "));
        assert!(heads[2].starts_with("put /rest/api/1.0/users/jdoe "));
    }
}
