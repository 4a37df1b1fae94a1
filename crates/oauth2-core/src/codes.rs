//! Authorization code manager
//!
//! Short-lived, one-time exchange codes tied to a client and a resource-owner
//! identity. Expiry is lazy: nothing sweeps expired codes in the background,
//! the expiry check itself performs the revoke transition when the window has
//! passed. Revocation is monotonic; expired and manually revoked codes end in
//! the same terminal state.

use std::sync::Arc;

use tracing::debug;

use crate::clock::Clock;
use crate::error::Result;
use crate::generator::TokenGenerator;
use crate::models::{AuthorizationCode, Client, DEFAULT_CODE_TTL_SECS};
use crate::store::{CredentialStore, insert_with_retry};

/// Manager for authorization codes.
pub struct AuthorizationCodes {
    generator: TokenGenerator,
    clock: Arc<dyn Clock>,
}

impl AuthorizationCodes {
    pub fn new(generator: TokenGenerator, clock: Arc<dyn Clock>) -> Self {
        Self { generator, clock }
    }

    /// Issue a code bound to `client` and `user_id`. `ttl_secs` defaults to
    /// 600 seconds.
    pub fn issue(
        &self,
        store: &dyn CredentialStore,
        client: &Client,
        user_id: i64,
        ttl_secs: Option<i64>,
    ) -> Result<AuthorizationCode> {
        let expires_in = ttl_secs.unwrap_or(DEFAULT_CODE_TTL_SECS);
        let stored = insert_with_retry("authorization code", || {
            store.insert_code(AuthorizationCode {
                id: 0,
                user_id,
                code: self.generator.generate_token(client),
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
            "authorization code issued"
        );
        Ok(stored)
    }

    /// Tombstone the code. Monotonic — there is no un-revoke.
    pub fn revoke(&self, store: &dyn CredentialStore, code: &mut AuthorizationCode) -> Result<()> {
        code.revoked = true;
        code.revocation_time = Some(self.clock.now());
        store.update_code(code)?;
        debug!(code_id = code.id, "authorization code revoked");
        Ok(())
    }

    /// Lazy expiry check: when `now > creation_time + expires_in` the code is
    /// revoked as a side effect and the check returns true; otherwise the
    /// stored flag is returned unchanged. A code already revoked is left
    /// untouched, so the terminal state is idempotent.
    pub fn is_expired_or_revoked(
        &self,
        store: &dyn CredentialStore,
        code: &mut AuthorizationCode,
    ) -> Result<bool> {
        if !code.revoked && self.clock.now() > code.expires_at() {
            debug!(code_id = code.id, "authorization code expired, revoking");
            self.revoke(store, code)?;
        }
        Ok(code.revoked)
    }
}
