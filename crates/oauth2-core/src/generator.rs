//! Opaque identifier generation
//!
//! Client ids, client secrets, authorization codes, and access/refresh tokens
//! are all 64-character URL-safe values drawn from the OS CSPRNG. Generation
//! is infallible and makes no uniqueness promise — the store's unique columns
//! are the correctness guarantee, and callers regenerate on conflict.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;

use crate::models::{Client, OPAQUE_LEN};

/// 48 random bytes encode to exactly 64 base64url characters.
const RANDOM_BYTES: usize = 48;

/// Mints the opaque values the managers persist.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenGenerator;

impl TokenGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Public client identifier.
    pub fn generate_client_id(&self) -> String {
        random_opaque()
    }

    /// Plaintext client secret (hashed before storage).
    pub fn generate_client_secret(&self) -> String {
        random_opaque()
    }

    /// Authorization code or access/refresh token scoped to `client`.
    ///
    /// The owning client's public id is appended to the random input before
    /// encoding, partitioning the input space across clients. All entropy
    /// still comes from the CSPRNG.
    pub fn generate_token(&self, client: &Client) -> String {
        let mut bytes = [0u8; RANDOM_BYTES];
        rand::rng().fill(&mut bytes);
        let mut material = bytes.to_vec();
        material.extend_from_slice(client.client_id.as_bytes());
        let mut encoded = URL_SAFE_NO_PAD.encode(material);
        encoded.truncate(OPAQUE_LEN);
        encoded
    }
}

fn random_opaque() -> String {
    let mut bytes = [0u8; RANDOM_BYTES];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
