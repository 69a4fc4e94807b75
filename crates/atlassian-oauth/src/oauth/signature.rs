//! OAuth 1.0 signature generation (RFC 5849).

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, percent_encode};
use rand::RngExt;
use rsa::pkcs1v15::SigningKey;
use rsa::signature::{SignatureEncoding, Signer};
use sha1::Sha1;
use ureq::http::Uri;

use super::key::load_private_key;
use crate::error::{ConfigurationError, OAuthError};
use crate::options::SignatureMethod;

/// OAuth unreserved characters: A-Z a-z 0-9 - . _ ~
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode string per RFC 3986.
pub(crate) fn oauth_encode(input: &str) -> String {
    percent_encode(input.as_bytes(), OAUTH_ENCODE_SET).to_string()
}

/// Decode a form-encoded component (`+` is a space).
pub(crate) fn form_decode(input: &str) -> String {
    percent_decode_str(&input.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

/// Generate cryptographically random nonce (32 hex characters).
fn generate_nonce() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    hex::encode(bytes)
}

/// Generate Unix timestamp.
fn generate_timestamp() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
        .to_string()
}

/// Signs signature base strings with the consumer's configured method.
pub(crate) enum RequestSigner {
    RsaSha1(SigningKey<Sha1>),
    HmacSha1 { consumer_secret: String },
    Plaintext { consumer_secret: String },
}

impl RequestSigner {
    /// Build a signer; RSA-SHA1 parses the consumer secret as a PEM key.
    pub(crate) fn new(
        method: SignatureMethod,
        consumer_secret: &str,
    ) -> Result<Self, ConfigurationError> {
        Ok(match method {
            SignatureMethod::RsaSha1 => {
                let private_key = load_private_key(consumer_secret.as_bytes())?;
                Self::RsaSha1(SigningKey::<Sha1>::new(private_key))
            }
            SignatureMethod::HmacSha1 => Self::HmacSha1 {
                consumer_secret: consumer_secret.to_owned(),
            },
            SignatureMethod::Plaintext => Self::Plaintext {
                consumer_secret: consumer_secret.to_owned(),
            },
        })
    }

    pub(crate) fn method(&self) -> SignatureMethod {
        match self {
            Self::RsaSha1(_) => SignatureMethod::RsaSha1,
            Self::HmacSha1 { .. } => SignatureMethod::HmacSha1,
            Self::Plaintext { .. } => SignatureMethod::Plaintext,
        }
    }

    /// Produce the `oauth_signature` value (before header encoding).
    fn sign(&self, base_string: &str, token_secret: &str) -> Result<String, OAuthError> {
        match self {
            Self::RsaSha1(signing_key) => {
                let signature = signing_key
                    .try_sign(base_string.as_bytes())
                    .map_err(|e| OAuthError::Signing(e.to_string()))?;
                Ok(BASE64_STANDARD.encode(signature.to_bytes()))
            }
            Self::HmacSha1 { consumer_secret } => {
                let key = secret_key(consumer_secret, token_secret);
                let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
                    .map_err(|e| OAuthError::Signing(e.to_string()))?;
                mac.update(base_string.as_bytes());
                Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
            }
            Self::Plaintext { consumer_secret } => Ok(secret_key(consumer_secret, token_secret)),
        }
    }
}

/// Key shared by HMAC-SHA1 and PLAINTEXT (RFC 5849 Section 3.4.2).
fn secret_key(consumer_secret: &str, token_secret: &str) -> String {
    format!(
        "{}&{}",
        oauth_encode(consumer_secret),
        oauth_encode(token_secret)
    )
}

/// Protocol parameters for a single signed request.
#[derive(Debug, Default)]
pub(crate) struct OAuthParams<'a> {
    pub consumer_key: &'a str,
    /// Absent for the request token phase.
    pub token: Option<&'a str>,
    /// Request token phase only.
    pub callback: Option<&'a str>,
    /// Access token phase only.
    pub verifier: Option<&'a str>,
}

/// Split a request URL into the base string URI and decoded query parameters.
///
/// The base URI excludes the query string and default ports
/// (RFC 5849 Section 3.4.1.2).
fn split_url(url: &str) -> Result<(String, Vec<(String, String)>), OAuthError> {
    let uri: Uri = url
        .parse()
        .map_err(|_| OAuthError::InvalidUrl(url.to_owned()))?;

    let scheme = uri.scheme_str().unwrap_or("https").to_ascii_lowercase();
    let host = uri
        .host()
        .ok_or_else(|| OAuthError::InvalidUrl(url.to_owned()))?
        .to_ascii_lowercase();
    let port = match (scheme.as_str(), uri.port_u16()) {
        ("http", Some(80)) | ("https", Some(443)) | (_, None) => String::new(),
        (_, Some(port)) => format!(":{port}"),
    };
    let path = match uri.path() {
        "" => "/",
        path => path,
    };

    let query_params = uri
        .query()
        .map(|q| {
            q.split('&')
                .filter(|param| !param.is_empty())
                .map(|param| {
                    let (key, value) = param.split_once('=').unwrap_or((param, ""));
                    (form_decode(key), form_decode(value))
                })
                .collect()
        })
        .unwrap_or_default();

    Ok((format!("{scheme}://{host}{port}{path}"), query_params))
}

/// Build OAuth signature base string per RFC 5849 Section 3.4.1.
///
/// Format: `HTTP_METHOD&encoded_base_url&encoded_parameters`
fn build_signature_base_string(method: &str, base_url: &str, params: &[(String, String)]) -> String {
    // Normalize parameters: encode keys/values, sort by key then value
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (oauth_encode(k), oauth_encode(v)))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        oauth_encode(base_url),
        oauth_encode(&param_string)
    )
}

/// Build OAuth Authorization header from OAuth params.
fn build_authorization_header(oauth_params: &[(String, String)]) -> String {
    let header_parts: Vec<String> = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, oauth_encode(v)))
        .collect();
    format!("OAuth {}", header_parts.join(", "))
}

/// Create OAuth `Authorization` header value for a request.
///
/// Query parameters of `url` take part in the signature
/// (RFC 5849 Section 3.4.1.3). `token_secret` is only used by HMAC-SHA1
/// and PLAINTEXT.
pub(crate) fn authorization_header(
    signer: &RequestSigner,
    method: &str,
    url: &str,
    params: &OAuthParams<'_>,
    token_secret: &str,
) -> Result<String, OAuthError> {
    signed_header(
        signer,
        method,
        url,
        params,
        token_secret,
        &generate_nonce(),
        &generate_timestamp(),
    )
}

fn signed_header(
    signer: &RequestSigner,
    method: &str,
    url: &str,
    params: &OAuthParams<'_>,
    token_secret: &str,
    nonce: &str,
    timestamp: &str,
) -> Result<String, OAuthError> {
    let (base_url, query_params) = split_url(url)?;

    let mut oauth_params = vec![
        ("oauth_consumer_key".to_owned(), params.consumer_key.to_owned()),
        ("oauth_nonce".to_owned(), nonce.to_owned()),
        (
            "oauth_signature_method".to_owned(),
            signer.method().as_str().to_owned(),
        ),
        ("oauth_timestamp".to_owned(), timestamp.to_owned()),
        ("oauth_version".to_owned(), "1.0".to_owned()),
    ];
    if let Some(token) = params.token {
        oauth_params.push(("oauth_token".to_owned(), token.to_owned()));
    }
    if let Some(callback) = params.callback {
        oauth_params.push(("oauth_callback".to_owned(), callback.to_owned()));
    }
    if let Some(verifier) = params.verifier {
        oauth_params.push(("oauth_verifier".to_owned(), verifier.to_owned()));
    }

    let mut signature_params = oauth_params.clone();
    signature_params.extend(query_params);

    let base_string = build_signature_base_string(method, &base_url, &signature_params);
    let signature = signer.sign(&base_string, token_secret)?;

    oauth_params.push(("oauth_signature".to_owned(), signature));
    oauth_params.sort();

    Ok(build_authorization_header(&oauth_params))
}
