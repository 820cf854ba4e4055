// ABOUTME: Argon2id credential hashing with fixed, versioned parameters
// ABOUTME: Generates client secrets and public identifiers from an unambiguous charset
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Credential Hashing
//!
//! Client secrets are hashed with Argon2id using fixed parameters tuned for
//! an interactive latency budget (tens of milliseconds on commodity
//! hardware). The PHC-encoded output embeds algorithm, version, parameters,
//! and salt, so stored hashes remain verifiable even after the constants
//! below change for newly issued credentials.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::{thread_rng, Rng};
use zeroize::Zeroizing;

use crate::errors::{AppError, AppResult};

/// Argon2id memory cost in KiB (19 MiB, OWASP interactive baseline)
const ARGON2_MEMORY_KIB: u32 = 19_456;

/// Argon2id time cost (iterations)
const ARGON2_ITERATIONS: u32 = 2;

/// Argon2id parallelism (lanes)
const ARGON2_LANES: u32 = 1;

/// Argon2id tag length in bytes
const ARGON2_OUTPUT_LEN: usize = 32;

/// Length of generated client secrets
pub const SECRET_LENGTH: usize = 48;

/// Length of the random portion of public client identifiers
const PUBLIC_ID_LENGTH: usize = 14;

/// Prefix marking public client identifiers as client handles
const PUBLIC_ID_PREFIX: &str = "cl_";

/// Alphanumeric charset with visually ambiguous characters removed (0 O 1 l I)
const UNAMBIGUOUS_CHARSET: &[u8] =
    b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnpqrstuvwxyz23456789";

fn hasher() -> AppResult<Argon2<'static>> {
    let params = Params::new(
        ARGON2_MEMORY_KIB,
        ARGON2_ITERATIONS,
        ARGON2_LANES,
        Some(ARGON2_OUTPUT_LEN),
    )
    .map_err(|e| {
        tracing::error!(error = %e, "invalid Argon2 parameters");
        AppError::hashing()
    })?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a plaintext secret for storage.
///
/// A fresh random salt is generated per hash; the returned PHC string is the
/// only thing that may be persisted.
///
/// # Errors
/// Returns an opaque hashing error if the primitive fails; never returns
/// partial output.
pub fn hash_secret(plaintext: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()?
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| {
            tracing::error!(error = %e, "Argon2 hashing failed");
            AppError::hashing()
        })?;
    Ok(hash.to_string())
}

/// Verify a plaintext secret against a stored PHC-encoded hash.
///
/// Parameters are recovered from the encoded string, so hashes produced
/// under earlier parameter choices keep verifying. A mismatch is `Ok(false)`;
/// a malformed stored hash is an internal error.
///
/// # Errors
/// Returns an opaque hashing error if the stored hash cannot be parsed or
/// the primitive fails.
pub fn verify_secret(encoded: &str, plaintext: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(encoded).map_err(|e| {
        tracing::error!(error = %e, "stored secret hash is malformed");
        AppError::hashing()
    })?;

    match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => {
            tracing::error!(error = %e, "Argon2 verification failed");
            Err(AppError::hashing())
        }
    }
}

/// Generate a new client secret.
///
/// The plaintext exists only transiently: it is returned exactly once at
/// creation or rotation and zeroized when the caller drops it.
#[must_use]
pub fn generate_client_secret() -> Zeroizing<String> {
    Zeroizing::new(random_unambiguous(SECRET_LENGTH))
}

/// Generate a short, collision-resistant, human-shareable public identifier
#[must_use]
pub fn generate_public_id() -> String {
    format!("{PUBLIC_ID_PREFIX}{}", random_unambiguous(PUBLIC_ID_LENGTH))
}

fn random_unambiguous(len: usize) -> String {
    let mut rng = thread_rng();
    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..UNAMBIGUOUS_CHARSET.len());
            UNAMBIGUOUS_CHARSET[idx] as char
        })
        .collect()
}
