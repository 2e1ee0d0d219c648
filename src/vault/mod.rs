//! Vault module: encrypted credential storage.
//!
//! This module provides:
//! - `CredentialRecord` and its kind-tagged payload (`record`)
//! - The in-memory, unlocked `Vault` (`store`)
//! - Per-identity encrypted blob files (`blob`)

pub mod blob;
pub mod record;
pub mod store;

// Re-export the most commonly used items.
pub use blob::{identity_dir, BlobStore};
pub use record::{CredentialData, CredentialKind, CredentialRecord};
pub use store::{validate_key, Vault};
