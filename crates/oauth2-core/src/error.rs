//! Error types for credential and token lifecycle operations

/// Errors from lifecycle operations.
///
/// Expired and revoked are not errors — they are ordinary boolean results of
/// the `is_expired_or_revoked`/`is_revoked` checks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Fatal: no salt resolvable while hashing a secret, or the configured
    /// salt is unusable. Never silently skipped.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A generated opaque identifier collided with a stored one. Recoverable
    /// by regenerating and retrying the insert.
    #[error("uniqueness conflict: {0}")]
    UniquenessConflict(String),

    /// Bounded regeneration gave up after repeated uniqueness conflicts.
    #[error("identifier generation retries exhausted: {0}")]
    ExhaustedRetries(String),

    /// The referenced client/code/token does not exist in the store.
    #[error("not found: {0}")]
    NotFound(String),

    /// Store I/O or serialization failure, surfaced as-is.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Result alias for lifecycle operations.
pub type Result<T> = std::result::Result<T, Error>;
