//! OAuth2 credential and token lifecycle engine
//!
//! Issues, stores (digest-only), validates, expires, revokes, and rotates
//! client credentials, authorization codes, and access/refresh token pairs.
//! This crate is a standalone library with no HTTP surface — the authorize
//! and token endpoints are callers of these managers, and persistence sits
//! behind the `CredentialStore` trait.
//!
//! Credential flow:
//! 1. Bootstrap calls `ClientCredentials::create()` and prints the returned
//!    `(client_id, secret)` pair once; only the scrypt digest is stored
//! 2. The token endpoint authenticates the client via `verify_secret()`
//! 3. The authorize endpoint mints a code via `AuthorizationCodes::issue()`
//! 4. The token endpoint checks `is_expired_or_revoked()` (an expired code
//!    revokes itself on the read) and mints a pair via `TokenPairs::issue()`
//! 5. A refresh grant calls `TokenPairs::refresh()`: the old pair is
//!    tombstoned and a fresh pair minted in its place
//!
//! Revocation is monotonic everywhere: once `revoked` is true no operation
//! sets it back, and rows are never deleted.

pub mod clients;
pub mod clock;
pub mod codes;
pub mod config;
pub mod error;
pub mod generator;
pub mod hasher;
pub mod models;
pub mod schema;
pub mod store;
pub mod tokens;

pub use clients::ClientCredentials;
pub use clock::{Clock, ManualClock, SystemClock};
pub use codes::AuthorizationCodes;
pub use config::ProviderConfig;
pub use error::{Error, Result};
pub use generator::TokenGenerator;
pub use hasher::{Salt, SecretHasher};
pub use models::{AuthorizationCode, Client, RedirectUri, TokenPair};
pub use store::{CredentialStore, FileStore, MemoryStore};
pub use tokens::TokenPairs;

#[cfg(test)]
mod tests {
    //! Full lifecycle scenarios across all managers and a shared store.

    use std::sync::Arc;

    use super::*;

    #[test]
    fn end_to_end_code_lifecycle() {
        let store = MemoryStore::new();
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let generator = TokenGenerator::new();

        let salt = Salt::from_base64("AAAA").unwrap();
        let clients = ClientCredentials::new(
            SecretHasher::new(Some(salt)),
            generator,
            clock.clone(),
        );
        let codes = AuthorizationCodes::new(generator, clock.clone());

        // bootstrap: create the client, hand the secret out once
        let (client, secret) = clients.create(&store, None).unwrap();
        assert!(clients.verify_secret(&client, secret.expose(), None).unwrap());

        // authorize: issue a code for user 7 with the default 600s window
        let mut code = codes.issue(&store, &client, 7, Some(600)).unwrap();
        assert!(!codes.is_expired_or_revoked(&store, &mut code).unwrap());

        // 601 seconds later the code is expired; the check revokes it
        clock.advance(601);
        assert!(codes.is_expired_or_revoked(&store, &mut code).unwrap());
        let stamped = code.revocation_time;
        assert!(stamped.is_some());

        // terminal state is idempotent: a second check changes nothing
        assert!(codes.is_expired_or_revoked(&store, &mut code).unwrap());
        assert_eq!(code.revocation_time, stamped);
        assert!(store.code_by_value(&code.code).unwrap().revoked);
    }

    #[test]
    fn end_to_end_token_lifecycle_with_rotation() {
        let store = MemoryStore::new();
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let generator = TokenGenerator::new();

        let salt = Salt::from_base64("AAAA").unwrap();
        let clients = ClientCredentials::new(
            SecretHasher::new(Some(salt)),
            generator,
            clock.clone(),
        );
        let tokens = TokenPairs::new(generator, clock.clone());

        let (client, _secret) = clients.create(&store, None).unwrap();

        let mut pair = tokens.issue(&store, &client, 42, None).unwrap();
        assert!(!tokens.is_expired_or_revoked(&store, &mut pair).unwrap());

        // rotation keeps the user session alive past the original window
        clock.advance(3_000);
        let mut fresh = tokens.refresh(&store, &mut pair).unwrap();
        assert!(pair.revoked);
        assert!(!fresh.revoked);
        assert_eq!(fresh.creation_time, 1_700_003_000);

        // the old window no longer applies to the fresh pair
        clock.advance(1_000);
        assert!(!tokens.is_expired_or_revoked(&store, &mut fresh).unwrap());

        // wire shape for the token endpoint response
        let body = TokenPairs::serialize(&fresh, serde_json::Map::new());
        assert_eq!(body["user_id"], serde_json::Value::from(42));
        assert_eq!(body["expires_in"], serde_json::Value::from(3600));
    }

    #[test]
    fn lifecycle_survives_a_file_store_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let generator = TokenGenerator::new();

        let salt = Salt::from_base64("AAAA").unwrap();
        let clients = ClientCredentials::new(
            SecretHasher::new(Some(salt)),
            generator,
            clock.clone(),
        );
        let tokens = TokenPairs::new(generator, clock.clone());

        let (client, access_token) = {
            let store = FileStore::load(path.clone()).unwrap();
            let (client, _secret) = clients.create(&store, None).unwrap();
            let pair = tokens.issue(&store, &client, 7, None).unwrap();
            (client, pair.access_token)
        };

        // a fresh process sees the same rows and the same invariants
        let store = FileStore::load(path).unwrap();
        let mut pair = store.pair_by_access_token(&access_token).unwrap();
        assert_eq!(pair.client_id, client.id);

        clock.advance(3_601);
        assert!(tokens.is_expired_or_revoked(&store, &mut pair).unwrap());
        assert!(store.pair_by_access_token(&access_token).unwrap().revoked);
    }
}
