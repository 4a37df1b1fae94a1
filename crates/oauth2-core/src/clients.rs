//! Client credential manager
//!
//! Owns client identity: secret issuance and rotation, authentication against
//! the stored digest, revocation, and redirect URI registration. The plaintext
//! secret is returned exactly once from `create`/`rotate_secret` wrapped in
//! `common::Secret`; after that call returns only the digest exists.

use std::sync::Arc;

use common::Secret;
use subtle::ConstantTimeEq;
use tracing::info;

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::generator::TokenGenerator;
use crate::hasher::{Salt, SecretHasher};
use crate::models::{Client, MAX_REDIRECT_URI_LEN, RedirectUri};
use crate::store::{CredentialStore, insert_with_retry};

/// Manager for client identity and credentials.
pub struct ClientCredentials {
    hasher: SecretHasher,
    generator: TokenGenerator,
    clock: Arc<dyn Clock>,
}

impl ClientCredentials {
    pub fn new(hasher: SecretHasher, generator: TokenGenerator, clock: Arc<dyn Clock>) -> Self {
        Self {
            hasher,
            generator,
            clock,
        }
    }

    /// Mint a new client: fresh public id, fresh secret, digest-only storage.
    ///
    /// `salt` is a salt bound to this client for the bootstrap call; when
    /// `None` the process-wide configured salt applies. Returns the plaintext
    /// secret exactly once — it is never retrievable again.
    pub fn create(
        &self,
        store: &dyn CredentialStore,
        salt: Option<&Salt>,
    ) -> Result<(Client, Secret<String>)> {
        let plaintext = self.generator.generate_client_secret();
        let resolved = self.hasher.resolve_salt(salt)?;
        let digest = self.hasher.derive(plaintext.as_bytes(), resolved)?;

        let stored = insert_with_retry("client", || {
            store.insert_client(Client {
                id: 0,
                client_id: self.generator.generate_client_id(),
                secret_digest: digest.clone(),
                revoked: false,
                revocation_time: None,
            })
        })?;
        info!(client_id = %stored.client_id, "client created");
        Ok((stored, Secret::new(plaintext)))
    }

    /// Replace the client's digest with the hash of `plaintext`.
    ///
    /// Hashing is the documented side effect of this call; the record is
    /// mutated in memory and persisted by the caller (`rotate_secret` does
    /// both). Fails with a configuration error when no salt is resolvable.
    pub fn set_secret(
        &self,
        client: &mut Client,
        plaintext: &str,
        salt: Option<&Salt>,
    ) -> Result<()> {
        let resolved = self.hasher.resolve_salt(salt)?;
        client.secret_digest = self.hasher.derive(plaintext.as_bytes(), resolved)?;
        Ok(())
    }

    /// Generate and store a new secret, returning the plaintext once.
    ///
    /// The previous digest is overwritten, not archived: the old secret stops
    /// authenticating the moment this returns.
    pub fn rotate_secret(
        &self,
        store: &dyn CredentialStore,
        client: &mut Client,
        salt: Option<&Salt>,
    ) -> Result<Secret<String>> {
        let plaintext = self.generator.generate_client_secret();
        self.set_secret(client, &plaintext, salt)?;
        store.update_client(client)?;
        info!(client_id = %client.client_id, "client secret rotated");
        Ok(Secret::new(plaintext))
    }

    /// Check `plaintext` against the stored digest in constant time.
    pub fn verify_secret(
        &self,
        client: &Client,
        plaintext: &str,
        salt: Option<&Salt>,
    ) -> Result<bool> {
        let resolved = self.hasher.resolve_salt(salt)?;
        let digest = self.hasher.derive(plaintext.as_bytes(), resolved)?;
        Ok(digest
            .as_slice()
            .ct_eq(client.secret_digest.as_slice())
            .into())
    }

    /// Revoke the client. Idempotent: `revoked` is monotonic, the timestamp
    /// reflects the latest call.
    pub fn revoke(&self, store: &dyn CredentialStore, client: &mut Client) -> Result<()> {
        client.revoked = true;
        client.revocation_time = Some(self.clock.now());
        store.update_client(client)?;
        info!(client_id = %client.client_id, "client revoked");
        Ok(())
    }

    /// Pure read of the revoked flag; clients have no expiry.
    pub fn is_revoked(&self, client: &Client) -> bool {
        client.revoked
    }

    /// Register a redirect URI for the client. URIs are globally unique; a
    /// collision surfaces as-is since a caller-supplied value cannot be
    /// regenerated.
    pub fn add_redirect_uri(
        &self,
        store: &dyn CredentialStore,
        client: &Client,
        uri: &str,
    ) -> Result<RedirectUri> {
        if uri.len() > MAX_REDIRECT_URI_LEN {
            return Err(Error::Storage(format!(
                "redirect uri exceeds the {MAX_REDIRECT_URI_LEN} character column limit"
            )));
        }
        store.insert_redirect_uri(RedirectUri {
            id: 0,
            uri: uri.to_owned(),
            client_id: client.id,
        })
    }
}
