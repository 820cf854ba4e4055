// ABOUTME: Cryptographic utilities for client credential handling
// ABOUTME: Argon2id hashing plus CSPRNG-backed secret and identifier generation
//
// SPDX-License-Identifier: MIT OR Apache-2.0

mod secrets;

pub use secrets::{
    generate_client_secret, generate_public_id, hash_secret, verify_secret, SECRET_LENGTH,
};
