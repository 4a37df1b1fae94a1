//! Common types for the OAuth2 provider workspace
//!
//! `Secret` wraps every plaintext client secret the engine hands back to a
//! caller exactly once; configuration loading in the core crate reports
//! through `Error`.

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
