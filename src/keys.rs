// ABOUTME: Background-refreshed cache of JWKS verification keys with TTL and grace semantics
// ABOUTME: Non-blocking reads, rate-limited asynchronous refresh, fail-closed hard expiry
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Key Material Cache
//!
//! Verification keys are fetched from an external JWKS document and cached
//! with a time-to-live. Concurrent requests read the cached key set without
//! blocking on refresh:
//!
//! - within the TTL, reads are served directly
//! - past the TTL but within the hard expiry, reads are served from the
//!   last-known-good set while a refresh runs asynchronously; refresh
//!   failure never evicts keys that are still within grace
//! - past the hard expiry, a refresh is attempted inline and verification
//!   fails closed if it cannot produce fresh keys
//!
//! Refresh attempts are capped per 60-second window so a broken key source
//! is not hammered under sustained failure.

use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::config::KeyCacheConfig;
use crate::errors::{AppError, AppResult};

/// Timeout for a single JWKS fetch
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// JWK (JSON Web Key) as published by the key source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWebKey {
    /// Key type; only RSA keys are usable here
    pub kty: String,
    /// Public key use; anything other than "sig" is skipped
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// Key ID for rotation tracking
    pub kid: String,
    /// Algorithm hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// RSA modulus (base64url encoded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA exponent (base64url encoded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
}

/// JWKS (JSON Web Key Set) container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWebKeySet {
    /// Published public keys
    pub keys: Vec<JsonWebKey>,
}

struct CachedKeys {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Instant,
}

struct RefreshWindow {
    window_start: Instant,
    attempts: u32,
}

struct CacheInner {
    config: KeyCacheConfig,
    http: reqwest::Client,
    state: RwLock<Option<CachedKeys>>,
    refresh_in_flight: AtomicBool,
    refresh_window: Mutex<RefreshWindow>,
}

/// Shared, clonable cache of token verification keys
#[derive(Clone)]
pub struct KeyMaterialCache {
    inner: Arc<CacheInner>,
}

impl KeyMaterialCache {
    /// Create a cache; no fetch happens until the first key lookup or an
    /// explicit [`Self::refresh`].
    #[must_use]
    pub fn new(config: KeyCacheConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            inner: Arc::new(CacheInner {
                config,
                http,
                state: RwLock::new(None),
                refresh_in_flight: AtomicBool::new(false),
                refresh_window: Mutex::new(RefreshWindow {
                    window_start: Instant::now(),
                    attempts: 0,
                }),
            }),
        }
    }

    /// Resolve the decoding key for `kid`.
    ///
    /// An unknown `kid` on an otherwise fresh cache triggers one refresh
    /// (the signer may have just rotated) before giving up. A refresh that
    /// cannot run or fails on this path does not change the answer: the kid
    /// is simply not one we trust, and a caller-supplied bogus kid must not
    /// surface as a service-availability signal.
    ///
    /// # Errors
    /// `KeySourceUnavailable` when no usable key material exists at all or
    /// the hard expiry has passed and refresh failed; `Unauthenticated` when
    /// a key set is available but `kid` is not in it.
    pub async fn decoding_key(&self, kid: &str) -> AppResult<DecodingKey> {
        self.ensure_fresh().await?;

        if let Some(key) = self.lookup(kid).await {
            return Ok(key);
        }

        // Unknown kid: the signer may have rotated ahead of our TTL. One
        // budgeted refresh, then fail as unauthenticated.
        tracing::debug!(kid = %kid, "unknown key id, attempting refresh");
        if let Err(error) = self.refresh().await {
            tracing::debug!(kid = %kid, error = %error, "refresh for unknown key id failed");
        }
        self.lookup(kid).await.ok_or_else(|| {
            AppError::unauthenticated(format!("unknown signing key id: {kid}"))
        })
    }

    async fn lookup(&self, kid: &str) -> Option<DecodingKey> {
        let guard = self.inner.state.read().await;
        guard.as_ref().and_then(|cached| cached.keys.get(kid).cloned())
    }

    async fn ensure_fresh(&self) -> AppResult<()> {
        let age = {
            let guard = self.inner.state.read().await;
            guard.as_ref().map(|cached| cached.fetched_at.elapsed())
        };

        match age {
            // First use: the initial fetch has to block.
            None => self.refresh().await,
            // Past grace: refresh inline, fail closed on failure.
            Some(age) if age >= self.inner.config.hard_expiry => {
                self.refresh().await.map_err(|e| {
                    tracing::error!(
                        error = %e,
                        "verification keys past hard expiry and refresh failed"
                    );
                    AppError::key_source("verification keys expired and refresh failed")
                })
            }
            // Stale but within grace: serve last-known-good, refresh in the
            // background.
            Some(age) if age >= self.inner.config.ttl => {
                self.spawn_refresh();
                Ok(())
            }
            Some(_) => Ok(()),
        }
    }

    fn spawn_refresh(&self) {
        if self
            .inner
            .refresh_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        let cache = self.clone();
        tokio::spawn(async move {
            if let Err(e) = cache.refresh().await {
                tracing::warn!(error = %e, "background key refresh failed, keeping cached keys");
            }
            cache.inner.refresh_in_flight.store(false, Ordering::Release);
        });
    }

    /// Fetch the JWKS document and install its keys.
    ///
    /// A failed fetch or an unusable document leaves the previously cached
    /// key set untouched.
    ///
    /// # Errors
    /// `KeySourceUnavailable` on fetch failure, an unusable document, or an
    /// exhausted refresh budget.
    pub async fn refresh(&self) -> AppResult<()> {
        if !self.take_refresh_slot() {
            return Err(AppError::key_source("key refresh budget exhausted"));
        }

        let jwks: JsonWebKeySet = self
            .inner
            .http
            .get(&self.inner.config.jwks_url)
            .send()
            .await
            .map_err(|e| AppError::key_source(format!("JWKS fetch failed: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::key_source(format!("JWKS fetch failed: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::key_source(format!("JWKS response malformed: {e}")))?;

        let installed = self.install_key_set(&jwks).await?;
        tracing::info!(
            keys = installed,
            url = %self.inner.config.jwks_url,
            "refreshed verification key set"
        );
        Ok(())
    }

    /// Build decoding keys from a JWKS document and swap them in.
    ///
    /// Unusable entries (non-RSA, non-signature, missing components) are
    /// skipped with a warning. Also the seam for deployments that load key
    /// material from local storage instead of over HTTP.
    ///
    /// # Errors
    /// `KeySourceUnavailable` when the set contains no usable key; the
    /// previous cache entry is kept in that case.
    pub async fn install_key_set(&self, jwks: &JsonWebKeySet) -> AppResult<usize> {
        let mut keys = HashMap::new();
        for jwk in &jwks.keys {
            if jwk.kty != "RSA" {
                tracing::warn!(kid = %jwk.kid, kty = %jwk.kty, "skipping non-RSA key");
                continue;
            }
            if let Some(key_use) = &jwk.key_use {
                if key_use != "sig" {
                    continue;
                }
            }
            let (Some(n), Some(e)) = (&jwk.n, &jwk.e) else {
                tracing::warn!(kid = %jwk.kid, "skipping RSA key missing modulus or exponent");
                continue;
            };
            match DecodingKey::from_rsa_components(n, e) {
                Ok(key) => {
                    keys.insert(jwk.kid.clone(), key);
                }
                Err(err) => {
                    tracing::warn!(kid = %jwk.kid, error = %err, "skipping unparseable RSA key");
                }
            }
        }

        if keys.is_empty() {
            return Err(AppError::key_source("JWKS document contains no usable keys"));
        }

        let installed = keys.len();
        let mut guard = self.inner.state.write().await;
        *guard = Some(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });
        Ok(installed)
    }

    fn take_refresh_slot(&self) -> bool {
        // Mutex poisoning cannot happen: no panic inside the critical section.
        let Ok(mut window) = self.inner.refresh_window.lock() else {
            return false;
        };
        if window.window_start.elapsed() >= Duration::from_secs(60) {
            window.window_start = Instant::now();
            window.attempts = 0;
        }
        if window.attempts >= self.inner.config.max_refresh_per_minute {
            return false;
        }
        window.attempts += 1;
        true
    }
}
