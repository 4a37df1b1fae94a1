//! Persistence boundary for clients, redirect URIs, codes, and token pairs
//!
//! `CredentialStore` is the seam the managers write through. It guarantees
//! uniqueness of the opaque columns (`client_id`, `uri`, `code`,
//! `access_token`, `refresh_token`) and assigns row ids on insert. It does
//! NOT manage transaction boundaries: a logical operation spanning several
//! calls (notably token refresh) is atomic only under a transaction supplied
//! by the request layer.
//!
//! Revocation is a logical tombstone: rows are updated in place and never
//! deleted, preserving the audit trail and preventing value reuse.

pub mod file;
pub mod memory;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::models::{AuthorizationCode, Client, RedirectUri, TokenPair};

pub use file::FileStore;
pub use memory::MemoryStore;

/// How many colliding generate+insert attempts a manager makes before
/// surfacing `ExhaustedRetries`.
pub const MAX_INSERT_ATTEMPTS: usize = 5;

/// Storage contract consumed by the managers.
///
/// Inserts assign the row id (the caller passes `id = 0`) and reject
/// duplicates in any unique column with `UniquenessConflict`. Updates and
/// lookups return `NotFound` for absent rows — never a silent "expired".
pub trait CredentialStore: Send + Sync {
    fn insert_client(&self, client: Client) -> Result<Client>;
    fn update_client(&self, client: &Client) -> Result<()>;
    fn client_by_id(&self, id: i64) -> Result<Client>;
    fn client_by_public_id(&self, client_id: &str) -> Result<Client>;

    fn insert_redirect_uri(&self, uri: RedirectUri) -> Result<RedirectUri>;
    fn redirect_uris_for_client(&self, client_id: i64) -> Result<Vec<RedirectUri>>;

    fn insert_code(&self, code: AuthorizationCode) -> Result<AuthorizationCode>;
    fn update_code(&self, code: &AuthorizationCode) -> Result<()>;
    fn code_by_value(&self, code: &str) -> Result<AuthorizationCode>;

    fn insert_token_pair(&self, pair: TokenPair) -> Result<TokenPair>;
    fn update_token_pair(&self, pair: &TokenPair) -> Result<()>;
    fn pair_by_access_token(&self, access_token: &str) -> Result<TokenPair>;
    fn pair_by_refresh_token(&self, refresh_token: &str) -> Result<TokenPair>;
}

/// Run a generate+insert attempt up to `MAX_INSERT_ATTEMPTS` times,
/// regenerating on uniqueness conflicts only. Any other error propagates
/// immediately (configuration is not self-healing).
pub(crate) fn insert_with_retry<T>(what: &str, mut attempt: impl FnMut() -> Result<T>) -> Result<T> {
    for _ in 0..MAX_INSERT_ATTEMPTS {
        match attempt() {
            Err(Error::UniquenessConflict(conflict)) => {
                warn!(
                    entity = what,
                    conflict = %conflict,
                    "generated identifier collided, regenerating"
                );
            }
            other => return other,
        }
    }
    Err(Error::ExhaustedRetries(format!(
        "{what}: gave up after {MAX_INSERT_ATTEMPTS} colliding inserts"
    )))
}

/// The four tables plus derived unique-column indexes. Shared by both store
/// implementations; `FileStore` serializes the tables (indexes are rebuilt
/// on load).
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct Tables {
    next_id: i64,
    clients: HashMap<i64, Client>,
    redirect_uris: HashMap<i64, RedirectUri>,
    codes: HashMap<i64, AuthorizationCode>,
    tokens: HashMap<i64, TokenPair>,
    #[serde(skip)]
    index: UniqueIndex,
}

#[derive(Debug, Default)]
struct UniqueIndex {
    client_ids: HashMap<String, i64>,
    uris: HashMap<String, i64>,
    codes: HashMap<String, i64>,
    access_tokens: HashMap<String, i64>,
    refresh_tokens: HashMap<String, i64>,
}

impl Tables {
    /// Rebuild the unique-column indexes from the rows (after deserialize).
    pub(crate) fn reindex(&mut self) {
        let mut index = UniqueIndex::default();
        for (id, client) in &self.clients {
            index.client_ids.insert(client.client_id.clone(), *id);
        }
        for (id, uri) in &self.redirect_uris {
            index.uris.insert(uri.uri.clone(), *id);
        }
        for (id, code) in &self.codes {
            index.codes.insert(code.code.clone(), *id);
        }
        for (id, pair) in &self.tokens {
            index.access_tokens.insert(pair.access_token.clone(), *id);
            index.refresh_tokens.insert(pair.refresh_token.clone(), *id);
        }
        self.index = index;
    }

    pub(crate) fn row_counts(&self) -> (usize, usize, usize, usize) {
        (
            self.clients.len(),
            self.redirect_uris.len(),
            self.codes.len(),
            self.tokens.len(),
        )
    }

    fn alloc_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn require_client(&self, id: i64) -> Result<()> {
        if self.clients.contains_key(&id) {
            Ok(())
        } else {
            Err(Error::NotFound(format!("client {id}")))
        }
    }

    pub(crate) fn insert_client(&mut self, mut client: Client) -> Result<Client> {
        if self.index.client_ids.contains_key(&client.client_id) {
            return Err(Error::UniquenessConflict(
                "client_id already present".into(),
            ));
        }
        client.id = self.alloc_id();
        self.index.client_ids.insert(client.client_id.clone(), client.id);
        self.clients.insert(client.id, client.clone());
        Ok(client)
    }

    pub(crate) fn update_client(&mut self, client: &Client) -> Result<()> {
        let existing = self
            .clients
            .get(&client.id)
            .ok_or_else(|| Error::NotFound(format!("client {}", client.id)))?;
        if existing.client_id != client.client_id {
            if self.index.client_ids.contains_key(&client.client_id) {
                return Err(Error::UniquenessConflict(
                    "client_id already present".into(),
                ));
            }
            self.index.client_ids.remove(&existing.client_id);
            self.index.client_ids.insert(client.client_id.clone(), client.id);
        }
        self.clients.insert(client.id, client.clone());
        Ok(())
    }

    pub(crate) fn client_by_id(&self, id: i64) -> Result<Client> {
        self.clients
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("client {id}")))
    }

    pub(crate) fn client_by_public_id(&self, client_id: &str) -> Result<Client> {
        self.index
            .client_ids
            .get(client_id)
            .and_then(|id| self.clients.get(id))
            .cloned()
            .ok_or_else(|| Error::NotFound("no client with that client_id".into()))
    }

    pub(crate) fn insert_redirect_uri(&mut self, mut uri: RedirectUri) -> Result<RedirectUri> {
        self.require_client(uri.client_id)?;
        if self.index.uris.contains_key(&uri.uri) {
            return Err(Error::UniquenessConflict(format!(
                "redirect uri already registered: {}",
                uri.uri
            )));
        }
        uri.id = self.alloc_id();
        self.index.uris.insert(uri.uri.clone(), uri.id);
        self.redirect_uris.insert(uri.id, uri.clone());
        Ok(uri)
    }

    pub(crate) fn redirect_uris_for_client(&self, client_id: i64) -> Result<Vec<RedirectUri>> {
        self.require_client(client_id)?;
        let mut uris: Vec<RedirectUri> = self
            .redirect_uris
            .values()
            .filter(|u| u.client_id == client_id)
            .cloned()
            .collect();
        uris.sort_by_key(|u| u.id);
        Ok(uris)
    }

    pub(crate) fn insert_code(&mut self, mut code: AuthorizationCode) -> Result<AuthorizationCode> {
        self.require_client(code.client_id)?;
        if self.index.codes.contains_key(&code.code) {
            return Err(Error::UniquenessConflict(
                "authorization code value already present".into(),
            ));
        }
        code.id = self.alloc_id();
        self.index.codes.insert(code.code.clone(), code.id);
        self.codes.insert(code.id, code.clone());
        Ok(code)
    }

    pub(crate) fn update_code(&mut self, code: &AuthorizationCode) -> Result<()> {
        let existing = self
            .codes
            .get(&code.id)
            .ok_or_else(|| Error::NotFound(format!("authorization code {}", code.id)))?;
        if existing.code != code.code {
            if self.index.codes.contains_key(&code.code) {
                return Err(Error::UniquenessConflict(
                    "authorization code value already present".into(),
                ));
            }
            self.index.codes.remove(&existing.code);
            self.index.codes.insert(code.code.clone(), code.id);
        }
        self.codes.insert(code.id, code.clone());
        Ok(())
    }

    pub(crate) fn code_by_value(&self, code: &str) -> Result<AuthorizationCode> {
        self.index
            .codes
            .get(code)
            .and_then(|id| self.codes.get(id))
            .cloned()
            .ok_or_else(|| Error::NotFound("no such authorization code".into()))
    }

    pub(crate) fn insert_token_pair(&mut self, mut pair: TokenPair) -> Result<TokenPair> {
        self.require_client(pair.client_id)?;
        if self.index.access_tokens.contains_key(&pair.access_token) {
            return Err(Error::UniquenessConflict(
                "access token value already present".into(),
            ));
        }
        if self.index.refresh_tokens.contains_key(&pair.refresh_token) {
            return Err(Error::UniquenessConflict(
                "refresh token value already present".into(),
            ));
        }
        pair.id = self.alloc_id();
        self.index.access_tokens.insert(pair.access_token.clone(), pair.id);
        self.index.refresh_tokens.insert(pair.refresh_token.clone(), pair.id);
        self.tokens.insert(pair.id, pair.clone());
        Ok(pair)
    }

    pub(crate) fn update_token_pair(&mut self, pair: &TokenPair) -> Result<()> {
        let existing = self
            .tokens
            .get(&pair.id)
            .ok_or_else(|| Error::NotFound(format!("token pair {}", pair.id)))?;
        if existing.access_token != pair.access_token {
            if self.index.access_tokens.contains_key(&pair.access_token) {
                return Err(Error::UniquenessConflict(
                    "access token value already present".into(),
                ));
            }
            self.index.access_tokens.remove(&existing.access_token);
            self.index.access_tokens.insert(pair.access_token.clone(), pair.id);
        }
        if existing.refresh_token != pair.refresh_token {
            if self.index.refresh_tokens.contains_key(&pair.refresh_token) {
                return Err(Error::UniquenessConflict(
                    "refresh token value already present".into(),
                ));
            }
            self.index.refresh_tokens.remove(&existing.refresh_token);
            self.index.refresh_tokens.insert(pair.refresh_token.clone(), pair.id);
        }
        self.tokens.insert(pair.id, pair.clone());
        Ok(())
    }

    pub(crate) fn pair_by_access_token(&self, access_token: &str) -> Result<TokenPair> {
        self.index
            .access_tokens
            .get(access_token)
            .and_then(|id| self.tokens.get(id))
            .cloned()
            .ok_or_else(|| Error::NotFound("no pair with that access token".into()))
    }

    pub(crate) fn pair_by_refresh_token(&self, refresh_token: &str) -> Result<TokenPair> {
        self.index
            .refresh_tokens
            .get(refresh_token)
            .and_then(|id| self.tokens.get(id))
            .cloned()
            .ok_or_else(|| Error::NotFound("no pair with that refresh token".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_helper_regenerates_on_conflict_only() {
        let mut calls = 0;
        let result = insert_with_retry("test entity", || {
            calls += 1;
            if calls < 3 {
                Err(Error::UniquenessConflict("dup".into()))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn retry_helper_gives_up_after_bounded_attempts() {
        let mut calls = 0;
        let result: Result<()> = insert_with_retry("test entity", || {
            calls += 1;
            Err(Error::UniquenessConflict("dup".into()))
        });
        assert_eq!(calls, MAX_INSERT_ATTEMPTS);
        assert!(matches!(result, Err(Error::ExhaustedRetries(_))));
    }

    #[test]
    fn retry_helper_propagates_other_errors_immediately() {
        let mut calls = 0;
        let result: Result<()> = insert_with_retry("test entity", || {
            calls += 1;
            Err(Error::Configuration("no salt".into()))
        });
        assert_eq!(calls, 1, "configuration errors must not be retried");
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
