// ABOUTME: End-to-end token verification tests against a locally minted key set
// ABOUTME: Covers successful principal construction plus issuer, expiry, and kid failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::time::Duration;

use serde_json::json;
use uuid::Uuid;
use warden::config::KeyCacheConfig;
use warden::errors::ErrorCode;
use warden::keys::KeyMaterialCache;
use warden::principal::ProjectRole;
use warden::verifier::TokenVerifier;

const ISSUER: &str = "https://issuer.example.com";

fn key_cache() -> KeyMaterialCache {
    KeyMaterialCache::new(KeyCacheConfig {
        // Never fetched: tests install key material directly.
        jwks_url: "http://127.0.0.1:9/jwks.json".into(),
        ttl: Duration::from_secs(300),
        hard_expiry: Duration::from_secs(3600),
        max_refresh_per_minute: 5,
    })
}

async fn verifier_with_key(key: &common::TestSigningKey) -> TokenVerifier {
    common::init_logging();
    let cache = key_cache();
    cache.install_key_set(&key.jwks).await.unwrap();
    TokenVerifier::new(cache, ISSUER, None)
}

fn base_claims(project: Uuid) -> serde_json::Value {
    let now = chrono::Utc::now().timestamp();
    json!({
        "sub": "user-42",
        "permissions": ["employee:read", "chatbot:read"],
        "memberships": { project.to_string(): "admin" },
        "iss": ISSUER,
        "exp": now + 3600,
        "iat": now,
    })
}

#[tokio::test]
async fn test_valid_token_yields_principal_context() {
    let key = common::generate_signing_key("kid-1");
    let verifier = verifier_with_key(&key).await;
    let project = Uuid::new_v4();

    let token = common::sign_token(&key, &base_claims(project));
    let principal = verifier.verify(&token).await.unwrap();

    assert_eq!(principal.subject_id(), "user-42");
    assert!(principal.grants("employee:read"));
    assert!(!principal.grants("employee:delete"));
    assert_eq!(principal.role_in(project), Some(ProjectRole::Admin));
    assert_eq!(principal.role_in(Uuid::new_v4()), None);
}

#[tokio::test]
async fn test_wrong_issuer_is_rejected() {
    let key = common::generate_signing_key("kid-1");
    let verifier = verifier_with_key(&key).await;

    let mut claims = base_claims(Uuid::new_v4());
    claims["iss"] = json!("https://rogue.example.com");
    let token = common::sign_token(&key, &claims);

    let err = verifier.verify(&token).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Unauthenticated);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let key = common::generate_signing_key("kid-1");
    let verifier = verifier_with_key(&key).await;

    let now = chrono::Utc::now().timestamp();
    let mut claims = base_claims(Uuid::new_v4());
    claims["exp"] = json!(now - 600);
    let token = common::sign_token(&key, &claims);

    let err = verifier.verify(&token).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Unauthenticated);
}

#[tokio::test]
async fn test_token_without_kid_is_rejected() {
    let key = common::generate_signing_key("kid-1");
    let verifier = verifier_with_key(&key).await;

    let header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256);
    let token =
        jsonwebtoken::encode(&header, &base_claims(Uuid::new_v4()), &key.encoding_key).unwrap();

    let err = verifier.verify(&token).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Unauthenticated);
    assert!(err.message.contains("key id"), "{}", err.message);
}

#[tokio::test]
async fn test_token_signed_by_unknown_key_is_rejected() {
    let trusted = common::generate_signing_key("kid-1");
    let verifier = verifier_with_key(&trusted).await;

    let rogue = common::generate_signing_key("kid-2");
    let token = common::sign_token(&rogue, &base_claims(Uuid::new_v4()));

    // The unknown kid triggers a refresh attempt against the unroutable
    // source; its failure stays an authentication error, never an
    // availability one.
    let err = verifier.verify(&token).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Unauthenticated);
    assert!(
        err.message.contains("unknown signing key id"),
        "{}",
        err.message
    );
}

#[tokio::test]
async fn test_audience_enforced_when_configured() {
    let key = common::generate_signing_key("kid-1");
    let cache = key_cache();
    cache.install_key_set(&key.jwks).await.unwrap();
    let verifier = TokenVerifier::new(cache, ISSUER, Some(vec!["warden-api".into()]));

    let mut claims = base_claims(Uuid::new_v4());
    claims["aud"] = json!("warden-api");
    let token = common::sign_token(&key, &claims);
    assert!(verifier.verify(&token).await.is_ok());

    let mut claims = base_claims(Uuid::new_v4());
    claims["aud"] = json!("other-api");
    let token = common::sign_token(&key, &claims);
    let err = verifier.verify(&token).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Unauthenticated);
}

#[tokio::test]
async fn test_malformed_memberships_fail_closed() {
    let key = common::generate_signing_key("kid-1");
    let verifier = verifier_with_key(&key).await;

    let now = chrono::Utc::now().timestamp();
    let claims = json!({
        "sub": "user-42",
        "permissions": [],
        "memberships": { "not-a-uuid": "admin" },
        "iss": ISSUER,
        "exp": now + 3600,
        "iat": now,
    });
    let token = common::sign_token(&key, &claims);

    let err = verifier.verify(&token).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Unauthenticated);
}
