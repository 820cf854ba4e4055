// ABOUTME: Bearer token verification feeding principal context construction
// ABOUTME: Resolves the signing key by kid, validates RS256 plus issuer and audience claims
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Token Verifier
//!
//! The bridge between the key material cache and the principal context:
//! extract the `kid` from the token header, resolve the decoding key through
//! the cache, validate signature, expiry, issuer, and (when configured)
//! audience, then reshape the verified claims into a [`PrincipalContext`].

use jsonwebtoken::{decode, decode_header, Algorithm, Validation};

use crate::errors::{AppError, AppResult};
use crate::keys::KeyMaterialCache;
use crate::principal::{AccessClaims, PrincipalContext};

/// Verifies bearer tokens against the cached key material
#[derive(Clone)]
pub struct TokenVerifier {
    keys: KeyMaterialCache,
    issuer: String,
    audiences: Option<Vec<String>>,
}

impl TokenVerifier {
    /// Create a verifier expecting tokens from `issuer`; audience validation
    /// is enabled only when `audiences` is provided.
    #[must_use]
    pub fn new(
        keys: KeyMaterialCache,
        issuer: impl Into<String>,
        audiences: Option<Vec<String>>,
    ) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            audiences,
        }
    }

    /// Verify a token and build the request-scoped principal context.
    ///
    /// # Errors
    /// `Unauthenticated` for a malformed, expired, or otherwise invalid
    /// token; `KeySourceUnavailable` when no key material can be obtained.
    pub async fn verify(&self, token: &str) -> AppResult<PrincipalContext> {
        let header = decode_header(token)
            .map_err(|e| AppError::unauthenticated(format!("malformed token: {e}")))?;
        let kid = header
            .kid
            .ok_or_else(|| AppError::unauthenticated("token header missing key id"))?;

        let key = self.keys.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        match &self.audiences {
            Some(audiences) => validation.set_audience(audiences),
            None => validation.validate_aud = false,
        }

        let token_data = decode::<AccessClaims>(token, &key, &validation)
            .map_err(|e| AppError::unauthenticated(format!("token validation failed: {e}")))?;

        PrincipalContext::from_claims(&token_data.claims)
    }
}
