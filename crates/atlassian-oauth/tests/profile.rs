//! Profile resolution against a scripted engine.

use std::thread;

use atlassian_oauth::{
    Credentials, Email, MockEngine, OAuthError, ProfileError, ProfileFetcher, RecordedRequest,
};
use pretty_assertions::assert_eq;

const APP: &str = "https://example.atlassian.net";
const WHOAMI: &str = "https://example.atlassian.net/plugins/servlet/applinks/whoami";
const JDOE: &str = "https://example.atlassian.net/rest/api/1.0/users/jdoe";
const JDOE_BODY: &str =
    r#"{"name":"jdoe","displayName":"Jane Doe","slug":"jdoe","emailAddress":"jane@example.com"}"#;

fn credentials() -> Credentials {
    Credentials::new("access-token", "access-secret")
}

#[test]
fn test_fetch_profile_maps_user_resource() {
    let engine = MockEngine::new()
        .with_response(WHOAMI, "jdoe")
        .with_response(JDOE, JDOE_BODY);

    let profile = ProfileFetcher::new(APP)
        .fetch_profile(&engine, &credentials())
        .unwrap();

    assert_eq!(profile.provider, "atlassian-oauth");
    assert_eq!(profile.id, "jdoe");
    assert_eq!(profile.username, "jdoe");
    assert_eq!(profile.display_name, "Jane Doe");
    assert_eq!(profile.avatar_urls, "jdoe");
    assert_eq!(
        profile.emails,
        vec![Email {
            value: "jane@example.com".to_owned()
        }]
    );
    assert_eq!(profile.raw_json["name"], "jdoe");
    assert_eq!(profile.raw_body, JDOE_BODY);
    assert_eq!(profile.token, "access-token");
    assert_eq!(profile.token_secret, "access-secret");
}

#[test]
fn test_fetch_profile_requests_in_order() {
    let engine = MockEngine::new()
        .with_response(WHOAMI, "jdoe")
        .with_response(JDOE, JDOE_BODY);

    ProfileFetcher::new(APP)
        .fetch_profile(&engine, &credentials())
        .unwrap();

    assert_eq!(
        engine.requests(),
        vec![
            RecordedRequest {
                token: "access-token".to_owned(),
                method: "GET".to_owned(),
                url: WHOAMI.to_owned(),
                accept: None,
            },
            RecordedRequest {
                token: "access-token".to_owned(),
                method: "GET".to_owned(),
                url: JDOE.to_owned(),
                accept: Some("application/json".to_owned()),
            },
        ]
    );
}

#[test]
fn test_whoami_failure_stops_before_profile_request() {
    let engine = MockEngine::new()
        .with_status(WHOAMI, 401, "oauth_problem=token_rejected")
        .with_response(JDOE, JDOE_BODY);

    let result = ProfileFetcher::new(APP).fetch_profile(&engine, &credentials());

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
    assert_eq!(engine.requests().len(), 1);
}

#[test]
fn test_profile_request_failure() {
    let engine = MockEngine::new()
        .with_response(WHOAMI, "jdoe")
        .with_status(JDOE, 500, "boom");

    let err = ProfileFetcher::new(APP)
        .fetch_profile(&engine, &credentials())
        .unwrap_err();

    assert_eq!(err.to_string(), "failed to fetch user profile");
    assert!(matches!(err, ProfileError::Fetch { .. }));
}

#[test]
fn test_profile_body_not_json() {
    let engine = MockEngine::new()
        .with_response(WHOAMI, "jdoe")
        .with_response(JDOE, "not-json");

    let result = ProfileFetcher::new(APP).fetch_profile(&engine, &credentials());

    assert!(matches!(result, Err(ProfileError::Parse(_))));
}

#[test]
fn test_profile_with_null_display_name() {
    let engine = MockEngine::new().with_response(WHOAMI, "jdoe").with_response(
        JDOE,
        r#"{"name":"jdoe","displayName":null,"slug":"jdoe","emailAddress":"jane@example.com"}"#,
    );

    let profile = ProfileFetcher::new(APP)
        .fetch_profile(&engine, &credentials())
        .unwrap();

    assert_eq!(profile.username, "jdoe");
    assert_eq!(profile.display_name, "");
    assert_eq!(profile.emails.len(), 1);
}

#[test]
fn test_profile_with_numeric_name() {
    let engine = MockEngine::new()
        .with_response(WHOAMI, "jdoe")
        .with_response(JDOE, r#"{"name":42,"displayName":"Jane Doe"}"#);

    let profile = ProfileFetcher::new(APP)
        .fetch_profile(&engine, &credentials())
        .unwrap();

    assert_eq!(profile.id, "");
    assert_eq!(profile.display_name, "Jane Doe");
    assert_eq!(profile.raw_json["name"], 42);
}

#[test]
fn test_whoami_body_is_used_verbatim() {
    let engine = MockEngine::new().with_response(WHOAMI, "jdoe\n");

    let result = ProfileFetcher::new(APP).fetch_profile(&engine, &credentials());

    assert!(result.is_err());
    assert_eq!(
        engine.requests()[1].url,
        "https://example.atlassian.net/rest/api/1.0/users/jdoe\n"
    );
}

#[test]
fn test_concurrent_fetches_do_not_mix_users() {
    let engine = MockEngine::new()
        .with_user_response("token-a", WHOAMI, "alice")
        .with_user_response("token-b", WHOAMI, "bob")
        .with_response(
            "https://example.atlassian.net/rest/api/1.0/users/alice",
            r#"{"name":"alice","displayName":"Alice","emailAddress":"alice@example.com"}"#,
        )
        .with_response(
            "https://example.atlassian.net/rest/api/1.0/users/bob",
            r#"{"name":"bob","displayName":"Bob","emailAddress":"bob@example.com"}"#,
        );
    let fetcher = ProfileFetcher::new(APP);

    thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let (token, name) = if i % 2 == 0 {
                    ("token-a", "alice")
                } else {
                    ("token-b", "bob")
                };
                let (engine, fetcher) = (&engine, &fetcher);
                scope.spawn(move || {
                    let profile = fetcher
                        .fetch_profile(engine, &Credentials::new(token, "secret"))
                        .unwrap();
                    (name, token, profile)
                })
            })
            .collect();

        for handle in handles {
            let (name, token, profile) = handle.join().unwrap();
            assert_eq!(profile.username, name);
            assert_eq!(profile.token, token);
            assert_eq!(profile.emails[0].value, format!("{name}@example.com"));
        }
    });
}
