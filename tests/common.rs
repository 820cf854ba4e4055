// ABOUTME: Shared helpers for integration tests
// ABOUTME: Mints RSA keypairs and signs RS256 tokens against a generated JWKS
//
// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(dead_code)]

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::{pkcs8::EncodePrivateKey, traits::PublicKeyParts, RsaPrivateKey, RsaPublicKey};
use warden::keys::{JsonWebKey, JsonWebKeySet};

/// Initialize tracing for test output; safe to call from every test.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// 2048 bits keeps test key generation fast; production keys come from the
/// external key source, never from this crate.
const TEST_RSA_KEY_SIZE: usize = 2048;

pub struct TestSigningKey {
    pub kid: String,
    pub encoding_key: EncodingKey,
    pub jwks: JsonWebKeySet,
}

pub fn generate_signing_key(kid: &str) -> TestSigningKey {
    let mut rng = rand::rngs::OsRng;
    let private_key =
        RsaPrivateKey::new(&mut rng, TEST_RSA_KEY_SIZE).expect("failed to generate RSA key");
    let public_key = RsaPublicKey::from(&private_key);

    let pem = private_key
        .to_pkcs8_pem(rsa::pkcs8::LineEnding::LF)
        .expect("failed to encode private key");
    let encoding_key =
        EncodingKey::from_rsa_pem(pem.as_bytes()).expect("failed to build encoding key");

    let jwks = JsonWebKeySet {
        keys: vec![JsonWebKey {
            kty: "RSA".into(),
            key_use: Some("sig".into()),
            kid: kid.into(),
            alg: Some("RS256".into()),
            n: Some(URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be())),
            e: Some(URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be())),
        }],
    };

    TestSigningKey {
        kid: kid.into(),
        encoding_key,
        jwks,
    }
}

pub fn sign_token(key: &TestSigningKey, claims: &serde_json::Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(key.kid.clone());
    encode(&header, claims, &key.encoding_key).expect("failed to sign token")
}
