//! Secret hashing via scrypt
//!
//! Client secrets are never persisted in plaintext: the store only ever sees
//! the 64-byte scrypt digest produced here. The cost parameters (N=2^14, r=8,
//! p=1) make offline brute-force of a leaked digest expensive; determinism per
//! (secret, salt) pair is what makes verification possible at all.
//!
//! Salt resolution order: a salt bound to the specific client wins, else the
//! process-wide configured salt. If neither is available the operation fails
//! with a configuration error — a secret is never left unset silently.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Error, Result};

/// scrypt cost: N = 2^14
pub const SCRYPT_LOG_N: u8 = 14;
/// scrypt block size
pub const SCRYPT_R: u32 = 8;
/// scrypt parallelism
pub const SCRYPT_P: u32 = 1;
/// Digest output length in bytes
pub const DIGEST_LEN: usize = 64;

/// Decoded salt bytes.
///
/// Configured as a base64 value (`oauth2_provider.salt` equivalent); decoded
/// once at the configuration boundary so hashing never re-parses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Salt(Vec<u8>);

impl Salt {
    /// Decode a base64-encoded salt. Rejects invalid base64 and empty salts.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| Error::Configuration(format!("invalid base64 salt: {e}")))?;
        if bytes.is_empty() {
            return Err(Error::Configuration("salt must not be empty".into()));
        }
        Ok(Salt(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Derives non-reversible digests from plaintext secrets.
pub struct SecretHasher {
    default_salt: Option<Salt>,
}

impl SecretHasher {
    /// `default_salt` is the process-wide salt from configuration, if any.
    pub fn new(default_salt: Option<Salt>) -> Self {
        Self { default_salt }
    }

    /// Resolve the salt to hash with: client-bound salt first, else the
    /// process-wide salt, else a configuration error.
    pub fn resolve_salt<'a>(&'a self, client_salt: Option<&'a Salt>) -> Result<&'a Salt> {
        client_salt.or(self.default_salt.as_ref()).ok_or_else(|| {
            Error::Configuration(
                "no salt configured: set the provider salt or bind one to the client".into(),
            )
        })
    }

    /// Derive the scrypt digest of `secret` under `salt`.
    ///
    /// Deterministic for identical inputs. The plaintext is not retained or
    /// logged beyond this call.
    pub fn derive(&self, secret: &[u8], salt: &Salt) -> Result<Vec<u8>> {
        let params = scrypt::Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, DIGEST_LEN)
            .map_err(|e| Error::Configuration(format!("invalid scrypt parameters: {e}")))?;
        let mut digest = vec![0u8; DIGEST_LEN];
        scrypt::scrypt(secret, salt.as_bytes(), &params, &mut digest)
            .map_err(|e| Error::Configuration(format!("scrypt derivation failed: {e}")))?;
        Ok(digest)
    }
}
