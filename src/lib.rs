pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod generator;
pub mod manager;
pub mod policy;
pub mod session;
pub mod vault;

#[cfg(feature = "keyring-store")]
pub mod keyring;

pub use errors::{CredVaultError, Outcome, Result};
pub use manager::{GetOptions, VaultManager};
