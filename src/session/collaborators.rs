//! Interfaces of the components that supply master passwords.
//!
//! The session manager never talks to a human directly.  It issues a
//! request to a `MasterPasswordPrompter` and awaits a typed response, and
//! it may consult a `SecretCache` (biometric store, OS keyring, ...) for a
//! previously saved password.

use async_trait::async_trait;

use crate::crypto::MasterPassword;
use crate::errors::{CredVaultError, Result};

/// What the prompter is asked to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub identity: String,
    /// The previous attempt failed; show a "wrong password" hint.
    pub is_retry: bool,
    /// A password is already saved in the secret cache.
    pub biometric_enabled: bool,
    /// The secret cache can store a password, so enrollment may be offered.
    pub secret_cache_available: bool,
}

/// The prompter's answer to a `PromptRequest`.
#[derive(Debug)]
pub enum PromptResponse {
    /// A password to try, and whether to save it to the secret cache once
    /// it proves correct.
    Password {
        password: MasterPassword,
        save_to_secret_cache: bool,
    },
    /// The human dismissed the prompt.
    Cancelled,
    /// A biometric check failed in a way worth retrying.
    BiometricFailed(String),
    /// The prompter cannot continue.
    Failed(String),
}

/// Why a new master password is being chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationPurpose {
    /// First use: no vault exists yet.
    Create,
    /// Replacing the password of an unlocked vault.
    Change,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationRequest {
    pub identity: String,
    pub purpose: CreationPurpose,
}

/// Collects master passwords from a human.
#[async_trait]
pub trait MasterPasswordPrompter: Send + Sync {
    /// Ask for the existing master password.
    async fn prompt_master_password(&self, request: PromptRequest) -> PromptResponse;

    /// Ask for a new master password. `None` means the human cancelled.
    async fn create_master_password(&self, request: CreationRequest) -> Option<MasterPassword>;
}

/// Optional store that can hand back the master password without a prompt.
///
/// Every call is best-effort: failures are logged by the session manager
/// and never fail the surrounding operation.
#[async_trait]
pub trait SecretCache: Send + Sync {
    /// Whether this cache can store passwords at all.
    fn is_available(&self) -> bool;

    /// Fetch the saved password, `Ok(None)` if nothing is saved.
    async fn retrieve(&self, identity: &str) -> Result<Option<MasterPassword>>;

    async fn save(&self, identity: &str, password: &MasterPassword) -> Result<()>;

    /// Drop the saved password, e.g. after it became stale.
    async fn forget(&self, identity: &str) -> Result<()>;
}

/// A secret cache that is never available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSecretCache;

#[async_trait]
impl SecretCache for NoSecretCache {
    fn is_available(&self) -> bool {
        false
    }

    async fn retrieve(&self, _identity: &str) -> Result<Option<MasterPassword>> {
        Ok(None)
    }

    async fn save(&self, _identity: &str, _password: &MasterPassword) -> Result<()> {
        Err(CredVaultError::KeyringError(
            "no secret cache is configured".into(),
        ))
    }

    async fn forget(&self, _identity: &str) -> Result<()> {
        Ok(())
    }
}
