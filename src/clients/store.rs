// ABOUTME: Storage seam for OAuth client records with an in-memory reference implementation
// ABOUTME: Store implementations own the atomicity boundaries for protected-field mutations
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use super::models::OAuthClient;
use crate::errors::{AppError, AppResult};

/// Persistence seam for client records.
///
/// Implementations enforce identity uniqueness and make protected-field
/// mutations atomic: the existence check and the default-flag check on
/// delete happen as one operation, never a race-prone two-step. A SQL
/// implementation maps these to single statements (`INSERT .. ON CONFLICT`,
/// conditional `DELETE`); [`MemoryClientStore`] uses per-entry atomics.
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Insert a new client.
    ///
    /// # Errors
    /// `AlreadyExists` when a client with the same public id is present,
    /// or an opaque storage error.
    async fn insert(&self, client: OAuthClient) -> AppResult<()>;

    /// Insert the protected bootstrap client, enforcing that at most one
    /// default record ever exists. The existence check and the insert are
    /// one atomic operation; default records must go through this method,
    /// never plain [`Self::insert`].
    ///
    /// # Errors
    /// `AlreadyExists` when a default client is already registered or the
    /// public id collides.
    async fn insert_default(&self, client: OAuthClient) -> AppResult<()>;

    /// Fetch by public id.
    async fn get(&self, public_id: &str) -> AppResult<Option<OAuthClient>>;

    /// Fetch by the machine-oriented OAuth `client_id`.
    async fn get_by_client_identifier(
        &self,
        client_identifier: Uuid,
    ) -> AppResult<Option<OAuthClient>>;

    /// All registered clients.
    async fn list(&self) -> AppResult<Vec<OAuthClient>>;

    /// Replace an existing record.
    ///
    /// # Errors
    /// `NotFound` when no client with that public id exists.
    async fn update(&self, client: OAuthClient) -> AppResult<OAuthClient>;

    /// Delete a client, refusing to remove the default client.
    ///
    /// # Errors
    /// `NotFound` when absent, `DefaultClientProtected` when the record is
    /// the protected bootstrap client. The default-flag check is atomic with
    /// the removal.
    async fn delete(&self, public_id: &str) -> AppResult<()>;

    /// Atomically swap the stored secret hash, bumping `updated_at`.
    ///
    /// # Errors
    /// `NotFound` when absent.
    async fn replace_secret_hash(&self, public_id: &str, secret_hash: String) -> AppResult<()>;
}

/// In-memory store backed by a concurrent map.
///
/// The reference implementation used by tests and single-node deployments;
/// production deployments put a relational store behind [`ClientStore`].
#[derive(Debug, Default)]
pub struct MemoryClientStore {
    clients: DashMap<String, OAuthClient>,
    default_registered: AtomicBool,
}

impl MemoryClientStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientStore for MemoryClientStore {
    async fn insert(&self, client: OAuthClient) -> AppResult<()> {
        match self.clients.entry(client.public_id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(AppError::already_exists("client"))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(client);
                Ok(())
            }
        }
    }

    async fn insert_default(&self, client: OAuthClient) -> AppResult<()> {
        // The flag is the claim on the single default slot; taking it and
        // inserting the record must look atomic to racing callers.
        if self
            .default_registered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(AppError::already_exists("default client"));
        }
        if let Err(err) = self.insert(client).await {
            self.default_registered.store(false, Ordering::Release);
            return Err(err);
        }
        Ok(())
    }

    async fn get(&self, public_id: &str) -> AppResult<Option<OAuthClient>> {
        Ok(self.clients.get(public_id).map(|entry| entry.clone()))
    }

    async fn get_by_client_identifier(
        &self,
        client_identifier: Uuid,
    ) -> AppResult<Option<OAuthClient>> {
        Ok(self
            .clients
            .iter()
            .find(|entry| entry.client_identifier == client_identifier)
            .map(|entry| entry.clone()))
    }

    async fn list(&self) -> AppResult<Vec<OAuthClient>> {
        let mut clients: Vec<OAuthClient> =
            self.clients.iter().map(|entry| entry.clone()).collect();
        clients.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(clients)
    }

    async fn update(&self, client: OAuthClient) -> AppResult<OAuthClient> {
        match self.clients.get_mut(&client.public_id) {
            Some(mut entry) => {
                *entry = client.clone();
                Ok(client)
            }
            None => Err(AppError::not_found("client")),
        }
    }

    async fn delete(&self, public_id: &str) -> AppResult<()> {
        // remove_if holds the entry lock across the predicate, making the
        // default-flag check atomic with the removal.
        if self
            .clients
            .remove_if(public_id, |_, client| !client.is_default)
            .is_some()
        {
            return Ok(());
        }
        if self.clients.contains_key(public_id) {
            Err(AppError::default_client_protected())
        } else {
            Err(AppError::not_found("client"))
        }
    }

    async fn replace_secret_hash(&self, public_id: &str, secret_hash: String) -> AppResult<()> {
        match self.clients.get_mut(public_id) {
            Some(mut entry) => {
                entry.secret_hash = Some(secret_hash);
                entry.updated_at = Utc::now();
                Ok(())
            }
            None => Err(AppError::not_found("client")),
        }
    }
}
