// ABOUTME: OAuth client registry: data model, storage seam, and lifecycle operations
// ABOUTME: Owns registration, lookup, update, delete, reveal, and rotation of client credentials
//
// SPDX-License-Identifier: MIT OR Apache-2.0

mod models;
mod registry;
mod store;

pub use models::{
    ClientView, OAuthClient, RegisterClientRequest, RevealedSecret, UpdateClientRequest,
};
pub use registry::ClientRegistry;
pub use store::{ClientStore, MemoryClientStore};
