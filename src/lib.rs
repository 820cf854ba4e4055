// ABOUTME: Library entry point for the warden trust-and-access core
// ABOUTME: Exposes OAuth client lifecycle, authorization primitives, and token key management
//
// SPDX-License-Identifier: MIT OR Apache-2.0

#![deny(unsafe_code)]

//! # Warden
//!
//! The trust-and-access core of a multi-tenant platform. Warden owns two
//! things: the lifecycle of OAuth client credentials, and the runtime
//! authorization model that gates every protected operation.
//!
//! ## Request flow
//!
//! 1. [`keys::KeyMaterialCache`] supplies the current token verification keys
//! 2. [`verifier::TokenVerifier`] validates the bearer token and decodes it
//!    into a [`principal::PrincipalContext`]
//! 3. [`authz`] predicates evaluate the required permission against that
//!    context; on deny the request is rejected before any domain code runs
//!
//! Administrative operations drive [`clients::ClientRegistry`] directly and
//! are themselves gated through the same [`authz`] predicates with global
//! (non-project) permissions.
//!
//! Warden deliberately knows nothing about the transport layer: denials carry
//! machine-distinguishable reasons and HTTP status hints, but route
//! registration, response rendering, and session handling live in the
//! surrounding application.

/// Audit trail events for sensitive administrative actions
pub mod audit;

/// Pure authorization decision primitives
pub mod authz;

/// OAuth client registry: models, storage seam, and lifecycle operations
pub mod clients;

/// Environment-driven configuration
pub mod config;

/// Credential hashing and secret generation
pub mod crypto;

/// Unified error handling with typed codes and HTTP status mapping
pub mod errors;

/// Background-refreshed cache of token verification keys
pub mod keys;

/// Request-scoped principal context derived from verified claims
pub mod principal;

/// Token verification feeding principal construction
pub mod verifier;
