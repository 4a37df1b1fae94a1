//! Plain data records for the four persisted tables
//!
//! These carry no behavior beyond derived-time helpers; all mutation goes
//! through the managers, and persistence goes through `CredentialStore`
//! (tables: clients, redirect_uris, authorization_codes, tokens — see the
//! `schema` module for the column contracts). `id` is assigned by the store
//! on insert; a record built by a manager carries `id = 0` until then.

use serde::{Deserialize, Serialize};

/// Opaque identifiers (client ids, secrets, codes, tokens) are exactly this long.
pub const OPAQUE_LEN: usize = 64;
/// Column limit for redirect URIs.
pub const MAX_REDIRECT_URI_LEN: usize = 256;
/// Authorization codes default to a 10 minute window.
pub const DEFAULT_CODE_TTL_SECS: i64 = 600;
/// Token pairs default to a 1 hour window.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// A registered OAuth2 client application.
///
/// The secret exists here only as its scrypt digest; the plaintext is handed
/// to the caller once at creation/rotation and never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    /// Public opaque identifier, unique across all clients.
    pub client_id: String,
    /// scrypt digest of the current secret.
    pub secret_digest: Vec<u8>,
    pub revoked: bool,
    pub revocation_time: Option<i64>,
}

impl Client {
    /// Clients have no expiry; this is a pure read of the stored flag.
    pub fn is_revoked(&self) -> bool {
        self.revoked
    }
}

/// A redirect URI registered to a client. Many-per-client, globally unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectUri {
    pub id: i64,
    pub uri: String,
    pub client_id: i64,
}

/// A short-lived authorization code bound to a client and a resource owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationCode {
    pub id: i64,
    pub user_id: i64,
    /// Opaque code value, unique across all codes.
    pub code: String,
    pub expires_in: i64,
    pub revoked: bool,
    pub revocation_time: Option<i64>,
    pub creation_time: i64,
    pub client_id: i64,
}

impl AuthorizationCode {
    /// The instant after which the code counts as expired.
    pub fn expires_at(&self) -> i64 {
        self.creation_time + self.expires_in
    }
}

/// An access/refresh token pair. Issued together, revoked together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub id: i64,
    pub user_id: i64,
    /// Opaque bearer token, unique across all pairs.
    pub access_token: String,
    /// Opaque rotation token, unique across all pairs.
    pub refresh_token: String,
    pub expires_in: i64,
    pub revoked: bool,
    pub revocation_time: Option<i64>,
    pub creation_time: i64,
    pub client_id: i64,
}

impl TokenPair {
    /// The instant after which the pair counts as expired.
    pub fn expires_at(&self) -> i64 {
        self.creation_time + self.expires_in
    }
}
