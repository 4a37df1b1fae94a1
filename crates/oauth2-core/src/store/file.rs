//! JSON-file-backed store
//!
//! Persists the four tables as a single JSON document. All writes use atomic
//! temp-file + rename to prevent corruption on crash, and the file is created
//! 0600 since it holds token values and secret digests. A mutation that fails
//! (uniqueness conflict, absent row) writes nothing.
//!
//! Calls are synchronous; a mutex serializes access from concurrent requests.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{AuthorizationCode, Client, RedirectUri, TokenPair};

use super::{CredentialStore, Tables};

/// File-backed implementation of the storage contract.
pub struct FileStore {
    path: PathBuf,
    state: Mutex<Tables>,
}

impl FileStore {
    /// Load the store from the given file path.
    ///
    /// If the file doesn't exist, creates it as an empty document so future
    /// loads don't need the cold-start path.
    pub fn load(path: PathBuf) -> Result<Self> {
        let tables = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::Storage(format!("reading store file: {e}")))?;
            let mut tables: Tables = serde_json::from_str(&contents)
                .map_err(|e| Error::Storage(format!("parsing store file: {e}")))?;
            tables.reindex();
            let (clients, uris, codes, tokens) = tables.row_counts();
            info!(
                path = %path.display(),
                clients, uris, codes, tokens,
                "loaded credential store"
            );
            tables
        } else {
            info!(path = %path.display(), "store file not found, starting empty");
            let tables = Tables::default();
            write_atomic(&path, &tables)?;
            tables
        };

        Ok(Self {
            path,
            state: Mutex::new(tables),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.state
            .lock()
            .map_err(|_| Error::Storage("file store mutex poisoned".into()))
    }

    /// Apply a mutation and persist the result. Nothing is written when the
    /// mutation itself fails.
    fn mutate<T>(&self, op: impl FnOnce(&mut Tables) -> Result<T>) -> Result<T> {
        let mut tables = self.lock()?;
        let result = op(&mut tables)?;
        write_atomic(&self.path, &tables)?;
        Ok(result)
    }
}

impl CredentialStore for FileStore {
    fn insert_client(&self, client: Client) -> Result<Client> {
        self.mutate(|t| t.insert_client(client))
    }

    fn update_client(&self, client: &Client) -> Result<()> {
        self.mutate(|t| t.update_client(client))
    }

    fn client_by_id(&self, id: i64) -> Result<Client> {
        self.lock()?.client_by_id(id)
    }

    fn client_by_public_id(&self, client_id: &str) -> Result<Client> {
        self.lock()?.client_by_public_id(client_id)
    }

    fn insert_redirect_uri(&self, uri: RedirectUri) -> Result<RedirectUri> {
        self.mutate(|t| t.insert_redirect_uri(uri))
    }

    fn redirect_uris_for_client(&self, client_id: i64) -> Result<Vec<RedirectUri>> {
        self.lock()?.redirect_uris_for_client(client_id)
    }

    fn insert_code(&self, code: AuthorizationCode) -> Result<AuthorizationCode> {
        self.mutate(|t| t.insert_code(code))
    }

    fn update_code(&self, code: &AuthorizationCode) -> Result<()> {
        self.mutate(|t| t.update_code(code))
    }

    fn code_by_value(&self, code: &str) -> Result<AuthorizationCode> {
        self.lock()?.code_by_value(code)
    }

    fn insert_token_pair(&self, pair: TokenPair) -> Result<TokenPair> {
        self.mutate(|t| t.insert_token_pair(pair))
    }

    fn update_token_pair(&self, pair: &TokenPair) -> Result<()> {
        self.mutate(|t| t.update_token_pair(pair))
    }

    fn pair_by_access_token(&self, access_token: &str) -> Result<TokenPair> {
        self.lock()?.pair_by_access_token(access_token)
    }

    fn pair_by_refresh_token(&self, refresh_token: &str) -> Result<TokenPair> {
        self.lock()?.pair_by_refresh_token(refresh_token)
    }
}

/// Write the tables to a file atomically (temp file in the same directory,
/// then rename over the target). Permissions are set to 0600 before the
/// rename makes the content visible.
fn write_atomic(path: &Path, tables: &Tables) -> Result<()> {
    let json = serde_json::to_string_pretty(tables)
        .map_err(|e| Error::Storage(format!("serializing store: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Storage("store path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".credential-store.tmp.{}", std::process::id()));

    std::fs::write(&tmp_path, json.as_bytes())
        .map_err(|e| Error::Storage(format!("writing temp store file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&tmp_path, perms)
            .map_err(|e| Error::Storage(format!("setting store file permissions: {e}")))?;
    }

    std::fs::rename(&tmp_path, path)
        .map_err(|e| Error::Storage(format!("renaming temp store file: {e}")))?;

    debug!(path = %path.display(), "persisted credential store");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(client_id: &str) -> Client {
        Client {
            id: 0,
            client_id: client_id.into(),
            secret_digest: vec![7u8; 64],
            revoked: false,
            revocation_time: None,
        }
    }

    #[test]
    fn cold_start_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        assert!(!path.exists());
        let store = FileStore::load(path.clone()).unwrap();
        assert!(path.exists());
        assert!(matches!(
            store.client_by_public_id("nobody"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn all_tables_roundtrip_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::load(path.clone()).unwrap();
        let client = store.insert_client(test_client("client-a")).unwrap();
        store
            .insert_redirect_uri(RedirectUri {
                id: 0,
                uri: "https://app.example/cb".into(),
                client_id: client.id,
            })
            .unwrap();
        store
            .insert_code(AuthorizationCode {
                id: 0,
                user_id: 7,
                code: "code-1".into(),
                expires_in: 600,
                revoked: false,
                revocation_time: None,
                creation_time: 1_000,
                client_id: client.id,
            })
            .unwrap();
        store
            .insert_token_pair(TokenPair {
                id: 0,
                user_id: 7,
                access_token: "at-1".into(),
                refresh_token: "rt-1".into(),
                expires_in: 3600,
                revoked: false,
                revocation_time: None,
                creation_time: 1_000,
                client_id: client.id,
            })
            .unwrap();

        // Fresh instance reads everything back from disk
        let store2 = FileStore::load(path).unwrap();
        assert_eq!(
            store2.client_by_public_id("client-a").unwrap().id,
            client.id
        );
        assert_eq!(
            store2.redirect_uris_for_client(client.id).unwrap().len(),
            1
        );
        assert_eq!(store2.code_by_value("code-1").unwrap().user_id, 7);
        assert_eq!(
            store2.pair_by_refresh_token("rt-1").unwrap().access_token,
            "at-1"
        );
    }

    #[test]
    fn uniqueness_survives_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::load(path.clone()).unwrap();
        store.insert_client(test_client("client-a")).unwrap();
        drop(store);

        let store2 = FileStore::load(path).unwrap();
        let result = store2.insert_client(test_client("client-a"));
        assert!(
            matches!(result, Err(Error::UniquenessConflict(_))),
            "index must be rebuilt on load"
        );
    }

    #[test]
    fn failed_mutation_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::load(path.clone()).unwrap();
        store.insert_client(test_client("client-a")).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let _ = store.insert_client(test_client("client-a"));
        let after = std::fs::read_to_string(&path).unwrap();
        assert_eq!(before, after, "rejected insert must not touch the file");
    }

    #[cfg(unix)]
    #[test]
    fn file_permissions_are_0600() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::load(path.clone()).unwrap();
        store.insert_client(test_client("client-a")).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "store file must be 0600, got {mode:o}");
    }

    #[test]
    fn id_assignment_continues_after_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::load(path.clone()).unwrap();
        let first = store.insert_client(test_client("client-a")).unwrap();
        drop(store);

        let store2 = FileStore::load(path).unwrap();
        let second = store2.insert_client(test_client("client-b")).unwrap();
        assert!(
            second.id > first.id,
            "row ids must not be reused across loads"
        );
    }
}
