//! SQL schema for a relational credential store
//!
//! Explicit DDL, applied in order by whatever migration runner a deployment
//! uses — there is no global registry and nothing here executes at import
//! time. The column set is the storage contract the engine's records map
//! onto; a SQL-backed `CredentialStore` must present exactly these columns.
//!
//! Uniqueness lives in the schema, not in the generators: `client_id`, `uri`,
//! `code`, `access_token`, and `refresh_token` are unique columns, and the
//! managers regenerate on conflict.

/// One named, ordered schema step.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub name: &'static str,
    pub ddl: &'static str,
}

pub const CREATE_CLIENTS: &str = "\
CREATE TABLE clients (
    id              INTEGER PRIMARY KEY,
    client_id       VARCHAR(64) NOT NULL UNIQUE,
    secret_digest   VARBINARY(255) NOT NULL,
    revoked         BOOLEAN NOT NULL DEFAULT FALSE,
    revocation_time TIMESTAMP
)";

pub const CREATE_REDIRECT_URIS: &str = "\
CREATE TABLE redirect_uris (
    id        INTEGER PRIMARY KEY,
    uri       VARCHAR(256) NOT NULL UNIQUE,
    client_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE
)";

pub const CREATE_AUTHORIZATION_CODES: &str = "\
CREATE TABLE authorization_codes (
    id              INTEGER PRIMARY KEY,
    user_id         INTEGER NOT NULL,
    code            VARCHAR(64) NOT NULL UNIQUE,
    expires_in      INTEGER NOT NULL DEFAULT 600,
    revoked         BOOLEAN NOT NULL DEFAULT FALSE,
    revocation_time TIMESTAMP,
    creation_time   TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    client_id       INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE
)";

pub const CREATE_TOKENS: &str = "\
CREATE TABLE tokens (
    id              INTEGER PRIMARY KEY,
    user_id         INTEGER NOT NULL,
    access_token    VARCHAR(64) NOT NULL UNIQUE,
    refresh_token   VARCHAR(64) NOT NULL UNIQUE,
    expires_in      INTEGER NOT NULL DEFAULT 3600,
    revoked         BOOLEAN NOT NULL DEFAULT FALSE,
    revocation_time TIMESTAMP,
    creation_time   TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    client_id       INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE
)";

/// All schema steps, parent tables first.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "create_clients",
        ddl: CREATE_CLIENTS,
    },
    Migration {
        name: "create_redirect_uris",
        ddl: CREATE_REDIRECT_URIS,
    },
    Migration {
        name: "create_authorization_codes",
        ddl: CREATE_AUTHORIZATION_CODES,
    },
    Migration {
        name: "create_tokens",
        ddl: CREATE_TOKENS,
    },
];
