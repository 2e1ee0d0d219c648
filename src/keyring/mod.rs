//! OS keyring-backed secret cache.
//!
//! Saves an identity's master password in the operating system's secure
//! credential store so the vault can be unlocked without a prompt:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring / KDE Wallet)
//!
//! Keyring calls block, so they run on tokio's blocking pool.

use async_trait::async_trait;

use crate::crypto::MasterPassword;
use crate::errors::{CredVaultError, Result};
use crate::session::SecretCache;

/// Service name used in the OS keyring.
const SERVICE_NAME: &str = "credvault";

/// Build a keyring entry key from an identity.
fn entry_key(identity: &str) -> String {
    format!("identity:{identity}")
}

fn entry(identity: &str) -> Result<keyring::Entry> {
    keyring::Entry::new(SERVICE_NAME, &entry_key(identity))
        .map_err(|e| CredVaultError::KeyringError(format!("failed to create keyring entry: {e}")))
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CredVaultError::TaskFailed(e.to_string()))?
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KeyringSecretCache;

#[async_trait]
impl SecretCache for KeyringSecretCache {
    fn is_available(&self) -> bool {
        true
    }

    /// Returns `None` if no password is stored (rather than an error).
    async fn retrieve(&self, identity: &str) -> Result<Option<MasterPassword>> {
        let identity = identity.to_string();
        blocking(move || match entry(&identity)?.get_password() {
            Ok(password) => Ok(Some(MasterPassword::new(password))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(CredVaultError::KeyringError(format!(
                "failed to read from keyring: {e}"
            ))),
        })
        .await
    }

    async fn save(&self, identity: &str, password: &MasterPassword) -> Result<()> {
        let identity = identity.to_string();
        let password = password.clone();
        blocking(move || {
            entry(&identity)?
                .set_password(password.expose())
                .map_err(|e| {
                    CredVaultError::KeyringError(format!("failed to store password in keyring: {e}"))
                })
        })
        .await
    }

    async fn forget(&self, identity: &str) -> Result<()> {
        let identity = identity.to_string();
        blocking(move || match entry(&identity)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(CredVaultError::KeyringError(format!(
                "failed to delete from keyring: {e}"
            ))),
        })
        .await
    }
}
