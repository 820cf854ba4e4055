// ABOUTME: OAuth client records, projections, and request DTOs
// ABOUTME: Enforces redirect URI validation rules at the model boundary
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// A registered caller of the platform's token-issuing flow.
///
/// This is the stored record and the only shape that carries the secret
/// hash; everything handed to callers goes through [`ClientView`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthClient {
    /// Opaque external identifier for admin addressing (short, shareable)
    pub public_id: String,
    /// Machine-oriented UUID used as the OAuth `client_id` in protocol flows
    pub client_identifier: Uuid,
    /// Display label; uniqueness is left to storage
    pub name: String,
    /// Non-empty ordered set of absolute http/https redirect URIs
    pub redirect_uris: Vec<String>,
    /// Whether PKCE is required; always true for public clients
    pub pkce_required: bool,
    /// True when the client can hold a secret and authenticate with it
    pub confidential: bool,
    /// Marks the single protected bootstrap client
    pub is_default: bool,
    /// Scopes this client may request
    pub allowed_scopes: Vec<String>,
    /// PHC-encoded secret hash; present only for confidential clients
    pub secret_hash: Option<String>,
    /// When the client was registered
    pub created_at: DateTime<Utc>,
    /// When the client was last modified
    pub updated_at: DateTime<Utc>,
}

impl OAuthClient {
    /// Hash-free projection for listing and detail views
    #[must_use]
    pub fn view(&self) -> ClientView {
        ClientView {
            public_id: self.public_id.clone(),
            client_identifier: self.client_identifier,
            name: self.name.clone(),
            redirect_uris: self.redirect_uris.clone(),
            pkce_required: self.pkce_required,
            confidential: self.confidential,
            is_default: self.is_default,
            allowed_scopes: self.allowed_scopes.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Client projection returned by lookup and list operations.
///
/// Never includes the secret hash; that is retrievable only through the
/// audited reveal operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientView {
    pub public_id: String,
    pub client_identifier: Uuid,
    pub name: String,
    pub redirect_uris: Vec<String>,
    pub pkce_required: bool,
    pub confidential: bool,
    pub is_default: bool,
    pub allowed_scopes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration request for a new OAuth client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterClientRequest {
    /// Display label
    pub name: String,
    /// Redirect URIs, validated per [`validate_redirect_uris`]
    pub redirect_uris: Vec<String>,
    /// Requested PKCE setting; forced on for public clients
    #[serde(default)]
    pub pkce_required: bool,
    /// Whether the client can hold a secret
    #[serde(default)]
    pub confidential: bool,
    /// Scopes this client may request
    #[serde(default)]
    pub allowed_scopes: Vec<String>,
}

/// Partial update for an existing client; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateClientRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uris: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pkce_required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_scopes: Option<Vec<String>>,
}

/// Stored secret material disclosed by the audited reveal operation.
///
/// This is the PHC-encoded hash, not the plaintext: the plaintext is
/// unrecoverable after creation. Lost secrets are replaced through rotation.
#[derive(Debug, Clone, Serialize)]
pub struct RevealedSecret {
    pub public_id: String,
    pub secret_hash: String,
}

/// Validate a redirect URI set: non-empty, each entry well-formed.
///
/// # Errors
/// Returns `InvalidInput` naming the first offending URI.
pub fn validate_redirect_uris(uris: &[String]) -> AppResult<()> {
    if uris.is_empty() {
        return Err(AppError::new(
            crate::errors::ErrorCode::MissingRequiredField,
            "at least one redirect URI is required",
        ));
    }
    for uri in uris {
        validate_redirect_uri(uri)?;
    }
    Ok(())
}

/// Validate a single redirect URI: absolute http/https, host required,
/// no wildcard characters, no query string, no fragment (RFC 6749 §3.1.2).
fn validate_redirect_uri(uri: &str) -> AppResult<()> {
    if uri.trim().is_empty() {
        return Err(AppError::invalid_redirect_uri(uri, "URI is empty"));
    }
    if uri.contains('*') {
        return Err(AppError::invalid_redirect_uri(
            uri,
            "wildcard characters are not allowed",
        ));
    }

    let parsed = Url::parse(uri)
        .map_err(|_| AppError::invalid_redirect_uri(uri, "not an absolute URI"))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::invalid_redirect_uri(
            uri,
            "scheme must be http or https",
        ));
    }
    if parsed.host_str().is_none() {
        return Err(AppError::invalid_redirect_uri(uri, "host is required"));
    }
    if parsed.query().is_some() {
        return Err(AppError::invalid_redirect_uri(
            uri,
            "query strings are not allowed",
        ));
    }
    if parsed.fragment().is_some() {
        return Err(AppError::invalid_redirect_uri(
            uri,
            "fragments are not allowed",
        ));
    }

    Ok(())
}
