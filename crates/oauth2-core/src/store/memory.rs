//! In-memory store
//!
//! Reference implementation of `CredentialStore` over Mutex'd tables. Used by
//! the test suites and as the semantic model a SQL-backed store must match:
//! same uniqueness rejections, same `NotFound` surfaces.

use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::models::{AuthorizationCode, Client, RedirectUri, TokenPair};

use super::{CredentialStore, Tables};

/// Mutex'd in-memory implementation of the storage contract.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.state
            .lock()
            .map_err(|_| Error::Storage("memory store mutex poisoned".into()))
    }
}

impl CredentialStore for MemoryStore {
    fn insert_client(&self, client: Client) -> Result<Client> {
        self.lock()?.insert_client(client)
    }

    fn update_client(&self, client: &Client) -> Result<()> {
        self.lock()?.update_client(client)
    }

    fn client_by_id(&self, id: i64) -> Result<Client> {
        self.lock()?.client_by_id(id)
    }

    fn client_by_public_id(&self, client_id: &str) -> Result<Client> {
        self.lock()?.client_by_public_id(client_id)
    }

    fn insert_redirect_uri(&self, uri: RedirectUri) -> Result<RedirectUri> {
        self.lock()?.insert_redirect_uri(uri)
    }

    fn redirect_uris_for_client(&self, client_id: i64) -> Result<Vec<RedirectUri>> {
        self.lock()?.redirect_uris_for_client(client_id)
    }

    fn insert_code(&self, code: AuthorizationCode) -> Result<AuthorizationCode> {
        self.lock()?.insert_code(code)
    }

    fn update_code(&self, code: &AuthorizationCode) -> Result<()> {
        self.lock()?.update_code(code)
    }

    fn code_by_value(&self, code: &str) -> Result<AuthorizationCode> {
        self.lock()?.code_by_value(code)
    }

    fn insert_token_pair(&self, pair: TokenPair) -> Result<TokenPair> {
        self.lock()?.insert_token_pair(pair)
    }

    fn update_token_pair(&self, pair: &TokenPair) -> Result<()> {
        self.lock()?.update_token_pair(pair)
    }

    fn pair_by_access_token(&self, access_token: &str) -> Result<TokenPair> {
        self.lock()?.pair_by_access_token(access_token)
    }

    fn pair_by_refresh_token(&self, refresh_token: &str) -> Result<TokenPair> {
        self.lock()?.pair_by_refresh_token(refresh_token)
    }
}
