// ABOUTME: OAuth client lifecycle operations with the registry's security invariants
// ABOUTME: Registration with one-time secrets, PKCE forcing, protected default client, audited reveal/rotation
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Client Registry
//!
//! Owns the lifecycle of OAuth client records. Invariants enforced here:
//!
//! - public clients (`confidential == false`) always have PKCE required,
//!   at registration and across every update
//! - the default bootstrap client can never be deleted and can never have
//!   PKCE disabled
//! - the plaintext secret of a confidential client is returned exactly once
//!   (at registration or rotation) and is unrecoverable afterwards; only the
//!   hash is stored
//! - reveal and rotation are audit-logged on every attempt

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use zeroize::Zeroizing;

use super::models::{
    validate_redirect_uris, ClientView, OAuthClient, RegisterClientRequest, RevealedSecret,
    UpdateClientRequest,
};
use super::store::ClientStore;
use crate::audit::{self, AuditAction};
use crate::crypto;
use crate::errors::{AppError, AppResult, ErrorCode};

/// Lifecycle manager for OAuth client records
#[derive(Clone)]
pub struct ClientRegistry {
    store: Arc<dyn ClientStore>,
}

impl ClientRegistry {
    /// Create a registry over the given store
    #[must_use]
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        Self { store }
    }

    /// Register a new OAuth client.
    ///
    /// Public clients get PKCE forced on regardless of the requested value
    /// and never receive a secret. For confidential clients the returned
    /// plaintext is the only copy that will ever exist; it is not
    /// recoverable from any later operation.
    ///
    /// # Errors
    /// `InvalidInput` for a bad name or redirect URI set, `AlreadyExists` on
    /// an identity collision, opaque internal errors from hashing or storage.
    pub async fn register(
        &self,
        request: RegisterClientRequest,
    ) -> AppResult<(ClientView, Option<Zeroizing<String>>)> {
        self.register_internal(request, false).await
    }

    /// Register the platform's own bootstrap client.
    ///
    /// The resulting record is marked default: it cannot be deleted and its
    /// PKCE requirement is forced on permanently. The single-default
    /// invariant is enforced atomically inside the store, so concurrent
    /// registrations produce exactly one default client.
    ///
    /// # Errors
    /// `AlreadyExists` when a default client is already registered, plus
    /// everything [`Self::register`] can return.
    pub async fn register_default(
        &self,
        mut request: RegisterClientRequest,
    ) -> AppResult<(ClientView, Option<Zeroizing<String>>)> {
        request.pkce_required = true;
        self.register_internal(request, true).await
    }

    async fn register_internal(
        &self,
        request: RegisterClientRequest,
        is_default: bool,
    ) -> AppResult<(ClientView, Option<Zeroizing<String>>)> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::new(
                ErrorCode::MissingRequiredField,
                "client name is required",
            ));
        }
        validate_redirect_uris(&request.redirect_uris)?;

        // Public clients rely on PKCE alone; the requested value cannot
        // disable it.
        let pkce_required = request.pkce_required || !request.confidential;

        let (secret_hash, plaintext) = if request.confidential {
            let secret = crypto::generate_client_secret();
            let hash = crypto::hash_secret(&secret)?;
            (Some(hash), Some(secret))
        } else {
            (None, None)
        };

        let now = Utc::now();
        let client = OAuthClient {
            public_id: crypto::generate_public_id(),
            client_identifier: Uuid::new_v4(),
            name: name.to_string(),
            redirect_uris: request.redirect_uris,
            pkce_required,
            confidential: request.confidential,
            is_default,
            allowed_scopes: request.allowed_scopes,
            secret_hash,
            created_at: now,
            updated_at: now,
        };
        let view = client.view();
        if is_default {
            self.store.insert_default(client).await?;
        } else {
            self.store.insert(client).await?;
        }

        tracing::info!(
            public_id = %view.public_id,
            client_identifier = %view.client_identifier,
            confidential = view.confidential,
            pkce_required = view.pkce_required,
            "registered OAuth client"
        );
        Ok((view, plaintext))
    }

    /// Look up a client by its public id.
    ///
    /// # Errors
    /// `NotFound` when absent.
    pub async fn get(&self, public_id: &str) -> AppResult<ClientView> {
        self.store
            .get(public_id)
            .await?
            .map(|client| client.view())
            .ok_or_else(|| AppError::not_found("client"))
    }

    /// Look up a client by the machine-oriented OAuth `client_id`.
    ///
    /// # Errors
    /// `NotFound` when absent.
    pub async fn get_by_client_identifier(
        &self,
        client_identifier: Uuid,
    ) -> AppResult<ClientView> {
        self.store
            .get_by_client_identifier(client_identifier)
            .await?
            .map(|client| client.view())
            .ok_or_else(|| AppError::not_found("client"))
    }

    /// List all registered clients, oldest first
    ///
    /// # Errors
    /// Opaque storage errors only.
    pub async fn list(&self) -> AppResult<Vec<ClientView>> {
        Ok(self
            .store
            .list()
            .await?
            .iter()
            .map(OAuthClient::view)
            .collect())
    }

    /// Apply a partial update to a client.
    ///
    /// Disabling PKCE is rejected for the default client and for public
    /// clients; `confidential` and `is_default` are immutable after
    /// registration.
    ///
    /// # Errors
    /// `NotFound`, `InvalidInput` for bad redirect URIs,
    /// `InvariantViolation`/`DefaultClientProtected` for PKCE downgrades.
    pub async fn update(
        &self,
        public_id: &str,
        request: UpdateClientRequest,
    ) -> AppResult<ClientView> {
        let mut client = self
            .store
            .get(public_id)
            .await?
            .ok_or_else(|| AppError::not_found("client"))?;

        if let Some(pkce_required) = request.pkce_required {
            if !pkce_required {
                if client.is_default {
                    return Err(AppError::new(
                        ErrorCode::DefaultClientProtected,
                        "PKCE cannot be disabled on the default client",
                    ));
                }
                if !client.confidential {
                    return Err(AppError::invariant_violation(
                        "public clients cannot disable PKCE",
                    ));
                }
            }
            client.pkce_required = pkce_required;
        }

        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::new(
                    ErrorCode::MissingRequiredField,
                    "client name is required",
                ));
            }
            client.name = name;
        }

        if let Some(redirect_uris) = request.redirect_uris {
            validate_redirect_uris(&redirect_uris)?;
            client.redirect_uris = redirect_uris;
        }

        if let Some(allowed_scopes) = request.allowed_scopes {
            client.allowed_scopes = allowed_scopes;
        }

        client.updated_at = Utc::now();
        let stored = self.store.update(client).await?;
        tracing::info!(public_id = %stored.public_id, "updated OAuth client");
        Ok(stored.view())
    }

    /// Delete a client.
    ///
    /// # Errors
    /// `NotFound` when absent; `DefaultClientProtected` for the bootstrap
    /// client, checked atomically with the existence check inside the store.
    pub async fn delete(&self, public_id: &str) -> AppResult<()> {
        self.store.delete(public_id).await?;
        tracing::info!(public_id = %public_id, "deleted OAuth client");
        Ok(())
    }

    /// Disclose the stored secret hash for verification and debugging.
    ///
    /// This returns the hash, never the plaintext: the plaintext is
    /// unrecoverable after creation. Every invocation is audit-logged with
    /// the acting subject, attempt and outcome both.
    ///
    /// # Errors
    /// `NotFound` when absent; `NoClientSecret` (distinct from `NotFound`)
    /// when the client is public and never had a secret.
    pub async fn reveal_secret(
        &self,
        actor: &str,
        public_id: &str,
    ) -> AppResult<RevealedSecret> {
        audit::attempted(AuditAction::RevealSecret, actor, public_id);
        let result = self.reveal_secret_inner(public_id).await;
        match &result {
            Ok(_) => audit::succeeded(AuditAction::RevealSecret, actor, public_id),
            Err(error) => audit::denied(AuditAction::RevealSecret, actor, public_id, error),
        }
        result
    }

    async fn reveal_secret_inner(&self, public_id: &str) -> AppResult<RevealedSecret> {
        let client = self
            .store
            .get(public_id)
            .await?
            .ok_or_else(|| AppError::not_found("client"))?;
        let secret_hash = client
            .secret_hash
            .ok_or_else(|| AppError::no_client_secret(public_id))?;
        Ok(RevealedSecret {
            public_id: client.public_id,
            secret_hash,
        })
    }

    /// Issue a fresh secret for a confidential client, invalidating the old
    /// hash atomically.
    ///
    /// The returned plaintext is the only copy; the previous secret stops
    /// verifying the moment the swap lands. Audit-logged like reveal.
    ///
    /// # Errors
    /// `NotFound` when absent; `NoClientSecret` for public clients.
    pub async fn rotate_secret(
        &self,
        actor: &str,
        public_id: &str,
    ) -> AppResult<Zeroizing<String>> {
        audit::attempted(AuditAction::RotateSecret, actor, public_id);
        let result = self.rotate_secret_inner(public_id).await;
        match &result {
            Ok(_) => audit::succeeded(AuditAction::RotateSecret, actor, public_id),
            Err(error) => audit::denied(AuditAction::RotateSecret, actor, public_id, error),
        }
        result
    }

    async fn rotate_secret_inner(&self, public_id: &str) -> AppResult<Zeroizing<String>> {
        let client = self
            .store
            .get(public_id)
            .await?
            .ok_or_else(|| AppError::not_found("client"))?;
        if !client.confidential {
            return Err(AppError::no_client_secret(public_id));
        }

        let secret = crypto::generate_client_secret();
        let hash = crypto::hash_secret(&secret)?;
        self.store.replace_secret_hash(public_id, hash).await?;
        Ok(secret)
    }
}
