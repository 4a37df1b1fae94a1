//! Provider configuration
//!
//! The engine consumes exactly one configuration value: the process-wide
//! base64-encoded salt. Resolution order: `OAUTH2_PROVIDER_SALT` env var >
//! `salt_file` path from the TOML > `salt` value in the TOML. The salt may be
//! absent entirely — the hasher then fails with a configuration error at the
//! point a secret is actually set, never silently.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::hasher::Salt;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub provider: ProviderSection,
    /// Decoded salt, resolved and validated at load time.
    #[serde(skip)]
    pub salt: Option<Salt>,
}

/// `[provider]` table
#[derive(Debug, Default, Deserialize)]
pub struct ProviderSection {
    /// Base64-encoded process-wide salt
    #[serde(default)]
    pub salt: Option<String>,
    /// Path to a file containing the base64 salt (alternative to the env var
    /// or inline value, keeps the salt out of the TOML)
    #[serde(default)]
    pub salt_file: Option<PathBuf>,
}

impl ProviderConfig {
    /// Load configuration from a TOML file, then overlay the environment.
    ///
    /// The raw base64 value is decoded here so an unusable salt is rejected
    /// at startup instead of on the first client creation.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: ProviderConfig = toml::from_str(&contents)?;

        let raw = if let Ok(value) = std::env::var("OAUTH2_PROVIDER_SALT") {
            Some(value)
        } else if let Some(ref salt_file) = config.provider.salt_file {
            let value = std::fs::read_to_string(salt_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read salt_file {}: {e}",
                    salt_file.display()
                ))
            })?;
            let value = value.trim().to_owned();
            if value.is_empty() { None } else { Some(value) }
        } else {
            config.provider.salt.clone()
        };

        config.salt = match raw {
            Some(ref encoded) => Some(
                Salt::from_base64(encoded)
                    .map_err(|e| common::Error::Config(e.to_string()))?,
            ),
            None => None,
        };

        Ok(config)
    }
}
