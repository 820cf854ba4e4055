// ABOUTME: Environment-driven configuration for token verification
// ABOUTME: Key source URL, cache TTL and refresh budget, issuer and audience expectations
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment-based configuration.
//!
//! Required variables produce hard errors; malformed numeric values fall
//! back to documented defaults with a warning so a typo degrades gracefully
//! instead of taking the service down.

use std::env;
use std::time::Duration;

use crate::errors::{AppError, AppResult};

/// Default cache TTL before a background refresh is triggered
const DEFAULT_KEY_TTL_SECS: u64 = 300;

/// Default hard expiry after which verification fails closed
const DEFAULT_KEY_HARD_EXPIRY_SECS: u64 = 3600;

/// Default maximum refresh attempts per minute
const DEFAULT_KEY_REFRESH_MAX_PER_MINUTE: u32 = 5;

/// Configuration for the key material cache
#[derive(Debug, Clone)]
pub struct KeyCacheConfig {
    /// URL of the JWKS document to fetch verification keys from
    pub jwks_url: String,
    /// How long a fetched key set is considered fresh
    pub ttl: Duration,
    /// Grace deadline; past this, stale keys are refused and verification
    /// fails closed
    pub hard_expiry: Duration,
    /// Upper bound on refresh attempts per 60-second window
    pub max_refresh_per_minute: u32,
}

/// Top-level configuration for token verification
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Key cache settings
    pub key_cache: KeyCacheConfig,
    /// Expected `iss` claim
    pub issuer: String,
    /// Expected `aud` values; `None` disables audience validation
    pub audiences: Option<Vec<String>>,
}

impl AuthConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// `ConfigMissing` when `WARDEN_JWKS_URL` or `WARDEN_TOKEN_ISSUER` is
    /// absent; `ConfigError` when the hard expiry is shorter than the TTL.
    pub fn from_env() -> AppResult<Self> {
        let jwks_url = require_env("WARDEN_JWKS_URL")?;
        let issuer = require_env("WARDEN_TOKEN_ISSUER")?;

        let audiences = env::var("WARDEN_TOKEN_AUDIENCE").ok().and_then(|raw| {
            let list: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect();
            if list.is_empty() {
                None
            } else {
                Some(list)
            }
        });

        let ttl = Duration::from_secs(parse_env_u64(
            "WARDEN_KEY_TTL_SECS",
            DEFAULT_KEY_TTL_SECS,
        ));
        let hard_expiry = Duration::from_secs(parse_env_u64(
            "WARDEN_KEY_HARD_EXPIRY_SECS",
            DEFAULT_KEY_HARD_EXPIRY_SECS,
        ));
        let max_refresh_per_minute = u32::try_from(parse_env_u64(
            "WARDEN_KEY_REFRESH_MAX_PER_MINUTE",
            u64::from(DEFAULT_KEY_REFRESH_MAX_PER_MINUTE),
        ))
        .unwrap_or(DEFAULT_KEY_REFRESH_MAX_PER_MINUTE);

        if hard_expiry < ttl {
            return Err(AppError::config(
                "WARDEN_KEY_HARD_EXPIRY_SECS must be at least WARDEN_KEY_TTL_SECS",
            ));
        }

        Ok(Self {
            key_cache: KeyCacheConfig {
                jwks_url,
                ttl,
                hard_expiry,
                max_refresh_per_minute,
            },
            issuer,
            audiences,
        })
    }
}

fn require_env(name: &str) -> AppResult<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::config_missing(name)),
    }
}

fn parse_env_u64(name: &str, default: u64) -> u64 {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(
                variable = name,
                value = %raw,
                default,
                "malformed numeric configuration, using default"
            );
            default
        }),
        Err(_) => default,
    }
}
