//! Token pair manager
//!
//! Access and refresh tokens are issued together, share a creation time and
//! ttl, and are revoked as a unit. `refresh` rotates a pair: the old row is
//! tombstoned and retained, a brand-new pair is minted for the same client
//! and user. Expiry follows the same lazy check-with-side-effect semantics as
//! authorization codes.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::Result;
use crate::generator::TokenGenerator;
use crate::models::{Client, DEFAULT_TOKEN_TTL_SECS, TokenPair};
use crate::store::{CredentialStore, insert_with_retry};

/// Manager for access/refresh token pairs.
pub struct TokenPairs {
    generator: TokenGenerator,
    clock: Arc<dyn Clock>,
}

impl TokenPairs {
    pub fn new(generator: TokenGenerator, clock: Arc<dyn Clock>) -> Self {
        Self { generator, clock }
    }

    /// Issue a pair bound to `client` and `user_id`. `ttl_secs` defaults to
    /// 3600 seconds; both tokens share it.
    pub fn issue(
        &self,
        store: &dyn CredentialStore,
        client: &Client,
        user_id: i64,
        ttl_secs: Option<i64>,
    ) -> Result<TokenPair> {
        let expires_in = ttl_secs.unwrap_or(DEFAULT_TOKEN_TTL_SECS);
        let stored = insert_with_retry("token pair", || {
            store.insert_token_pair(TokenPair {
                id: 0,
                user_id,
                access_token: self.generator.generate_token(client),
                refresh_token: self.generator.generate_token(client),
                expires_in,
                revoked: false,
                revocation_time: None,
                creation_time: self.clock.now(),
                client_id: client.id,
            })
        })?;
        debug!(
            client_id = %client.client_id,
            user_id,
            expires_in,
            "token pair issued"
        );
        Ok(stored)
    }

    /// Tombstone the pair as a unit — access and refresh share fate.
    pub fn revoke(&self, store: &dyn CredentialStore, pair: &mut TokenPair) -> Result<()> {
        pair.revoked = true;
        pair.revocation_time = Some(self.clock.now());
        store.update_token_pair(pair)?;
        debug!(pair_id = pair.id, "token pair revoked");
        Ok(())
    }

    /// Lazy expiry check: when `now > creation_time + expires_in` the pair is
    /// revoked as a side effect and the check returns true; otherwise the
    /// stored flag is returned unchanged.
    pub fn is_expired_or_revoked(
        &self,
        store: &dyn CredentialStore,
        pair: &mut TokenPair,
    ) -> Result<bool> {
        if !pair.revoked && self.clock.now() > pair.expires_at() {
            debug!(pair_id = pair.id, "token pair expired, revoking");
            self.revoke(store, pair)?;
        }
        Ok(pair.revoked)
    }

    /// Rotate the pair: revoke the old one, mint a new one for the same
    /// client and user with fresh values and a fresh default ttl window. The
    /// old row is retained as a tombstone.
    ///
    /// This is two store writes, not one. The engine does not manage
    /// transactions; callers must wrap the call in a single ambient
    /// transaction, otherwise a failure between the writes leaves the old
    /// pair revoked with no replacement.
    pub fn refresh(&self, store: &dyn CredentialStore, pair: &mut TokenPair) -> Result<TokenPair> {
        let client = store.client_by_id(pair.client_id)?;
        self.revoke(store, pair)?;
        let fresh = self.issue(store, &client, pair.user_id, None)?;
        info!(
            client_id = %client.client_id,
            user_id = pair.user_id,
            "token pair rotated"
        );
        Ok(fresh)
    }

    /// Canonical wire mapping of a pair, merged over `extra`.
    ///
    /// When `extra` and the canonical fields share a key, the canonical token
    /// field wins; non-colliding extras pass through unchanged.
    pub fn serialize(pair: &TokenPair, extra: Map<String, Value>) -> Map<String, Value> {
        let mut out = extra;
        out.insert(
            "access_token".into(),
            Value::String(pair.access_token.clone()),
        );
        out.insert(
            "refresh_token".into(),
            Value::String(pair.refresh_token.clone()),
        );
        out.insert("user_id".into(), Value::from(pair.user_id));
        out.insert("expires_in".into(), Value::from(pair.expires_in));
        out
    }
}
