//! The caller-facing vault façade.
//!
//! Every operation follows the same shape: make sure a master password
//! exists, make sure the session is unlocked, operate on the in-memory
//! `Vault`, then persist the whole blob if anything changed.  A change that
//! cannot be persisted is undone in memory too.
//!
//! Records are tagged with the application that created them.  Ordinary
//! callers only ever see and touch their own records; the privileged
//! management application configured in `Settings` sees everything.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use zeroize::Zeroize;

use crate::config::Settings;
use crate::crypto::PasswordCipher;
use crate::errors::{CredVaultError, Result};
use crate::generator::{self, PasswordOptions};
use crate::policy::{PolicyStore, UnlockMode};
use crate::session::{
    MasterPasswordPrompter, OpenOptions, SecretCache, SessionManager, SessionStatus,
};
use crate::vault::{validate_key, BlobStore, CredentialRecord, Vault};

/// Options for `VaultManager::get_credential`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetOptions {
    /// Prompt for the master password when locked. When `false`, a locked
    /// vault yields `Cancelled` instead.
    pub prompt_if_locked: bool,
    /// Ask for the master password even if the session is unlocked.
    pub force_master_password_prompt: bool,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self {
            prompt_if_locked: true,
            force_master_password_prompt: false,
        }
    }
}

pub struct VaultManager {
    settings: Settings,
    sessions: SessionManager,
}

impl VaultManager {
    /// Build a manager storing vaults under `settings.data_dir`.
    pub fn new(
        settings: Settings,
        prompter: Arc<dyn MasterPasswordPrompter>,
        secret_cache: Arc<dyn SecretCache>,
    ) -> Self {
        let root = PathBuf::from(&settings.data_dir);
        let sessions = SessionManager::new(
            BlobStore::new(root.clone()),
            PolicyStore::new(root),
            PasswordCipher::new(settings.argon2_params()),
            prompter,
            secret_cache,
            settings.session_timeout(),
        );
        Self { settings, sessions }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn is_privileged(&self, caller_app: &str) -> bool {
        caller_app == self.settings.privileged_app
    }

    // ------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------

    /// Store `record` under `key`, creating the vault on first use.
    ///
    /// Overwriting keeps the original owner and creation time. An ordinary
    /// caller may not overwrite another application's record.
    pub async fn set_credential(
        &self,
        key: &str,
        mut record: CredentialRecord,
        identity: &str,
        caller_app: &str,
    ) -> Result<()> {
        validate_key(key)?;

        let options = OpenOptions {
            create_if_missing: true,
            ..OpenOptions::default()
        };
        let mut vault = self.sessions.open(identity, options).await?;

        match vault.get(key) {
            Some(existing) => {
                if !self.is_privileged(caller_app) && existing.app_id != caller_app {
                    return Err(CredVaultError::AccessDenied(format!(
                        "'{key}' belongs to another application"
                    )));
                }
                record.app_id = existing.app_id.clone();
                record.created_at = existing.created_at;
            }
            None => record.app_id = caller_app.to_string(),
        }
        record.modified_at = Utc::now();

        let previous = vault.get(key).cloned();
        vault.set(key, record)?;
        self.commit(identity, &mut vault, key, previous).await?;

        debug!(identity, key, caller_app, "credential stored");
        Ok(())
    }

    /// Fetch the record stored under `key`, `Ok(None)` if there is none.
    pub async fn get_credential(
        &self,
        key: &str,
        identity: &str,
        caller_app: &str,
        options: GetOptions,
    ) -> Result<Option<CredentialRecord>> {
        let open = OpenOptions {
            create_if_missing: true,
            prompt_if_locked: options.prompt_if_locked,
            force_prompt: options.force_master_password_prompt,
        };
        let vault = self.sessions.open(identity, open).await?;

        match vault.get(key) {
            Some(record) if self.is_privileged(caller_app) || record.app_id == caller_app => {
                Ok(Some(record.clone()))
            }
            Some(_) => Err(CredVaultError::AccessDenied(format!(
                "'{key}' belongs to another application"
            ))),
            None => Ok(None),
        }
    }

    /// Every record visible to `caller_app`, sorted by key.
    pub async fn list_credentials(
        &self,
        identity: &str,
        caller_app: &str,
    ) -> Result<Vec<CredentialRecord>> {
        let options = OpenOptions {
            create_if_missing: true,
            ..OpenOptions::default()
        };
        let vault = self.sessions.open(identity, options).await?;

        let privileged = self.is_privileged(caller_app);
        Ok(vault
            .list_all()
            .into_iter()
            .filter(|r| privileged || r.app_id == caller_app)
            .cloned()
            .collect())
    }

    /// Delete `target_app`'s record under `key`.
    ///
    /// Only the privileged application may name a target other than
    /// itself. Returns whether a record was removed; an absent key or an
    /// absent vault is a no-op.
    pub async fn delete_credential(
        &self,
        key: &str,
        identity: &str,
        caller_app: &str,
        target_app: &str,
    ) -> Result<bool> {
        if !self.is_privileged(caller_app) && target_app != caller_app {
            return Err(CredVaultError::AccessDenied(format!(
                "{caller_app} may not delete records of {target_app}"
            )));
        }
        if !self.sessions.blobs().exists(identity) {
            debug!(identity, key, "no vault, nothing to delete");
            return Ok(false);
        }

        let mut vault = self.sessions.open(identity, OpenOptions::default()).await?;
        let previous = match vault.get(key) {
            None => return Ok(false),
            Some(record) if record.app_id != target_app => {
                return Err(CredVaultError::AccessDenied(format!(
                    "'{key}' does not belong to {target_app}"
                )));
            }
            Some(record) => record.clone(),
        };

        vault.delete(key);
        self.commit(identity, &mut vault, key, Some(previous)).await?;

        debug!(identity, key, target_app, "credential deleted");
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Master password and session
    // ------------------------------------------------------------------

    /// Re-encrypt the whole vault under a newly chosen master password.
    ///
    /// Only the privileged application may do this. The saved password in
    /// the secret cache is stale afterwards, so biometric unlock is turned
    /// off until the next enrollment.
    pub async fn change_master_password(&self, identity: &str, caller_app: &str) -> Result<()> {
        if !self.is_privileged(caller_app) {
            return Err(CredVaultError::AccessDenied(format!(
                "{caller_app} may not change the master password"
            )));
        }

        self.sessions.change_master_password(identity).await?;
        self.disable_biometric(identity).await;
        Ok(())
    }

    pub async fn lock_vault(&self, identity: &str) {
        self.sessions.lock(identity).await;
    }

    /// Lock the session and irrecoverably delete the identity's blob.
    ///
    /// Returns whether a vault existed.
    pub async fn delete_all_credentials(&self, identity: &str) -> Result<bool> {
        let existed = self.sessions.delete_all(identity).await?;
        self.disable_biometric(identity).await;
        info!(identity, existed, "all credentials deleted");
        Ok(existed)
    }

    /// Whether an encrypted vault is stored for `identity`.
    pub fn vault_exists(&self, identity: &str) -> bool {
        self.sessions.blobs().exists(identity)
    }

    pub async fn session_status(&self, identity: &str) -> Result<SessionStatus> {
        self.sessions.status(identity).await
    }

    // ------------------------------------------------------------------
    // Policy
    // ------------------------------------------------------------------

    pub fn unlock_mode(&self, identity: &str) -> Result<UnlockMode> {
        self.sessions.policies().unlock_mode(identity)
    }

    /// Persist the unlock mode. Switching to `UnlockEveryTime` locks the
    /// current session immediately.
    pub async fn set_unlock_mode(&self, identity: &str, mode: UnlockMode) -> Result<()> {
        let policies = self.sessions.policies();
        let previous = policies.unlock_mode(identity)?;
        policies.set_unlock_mode(identity, mode)?;

        if mode == UnlockMode::UnlockEveryTime && previous != UnlockMode::UnlockEveryTime {
            self.sessions.lock(identity).await;
        }
        Ok(())
    }

    pub fn is_biometric_auth_enabled(&self, identity: &str) -> Result<bool> {
        self.sessions.policies().biometric_auth_enabled(identity)
    }

    /// Set the biometric flag. Disabling it also drops the saved password.
    pub async fn set_biometric_auth_enabled(&self, identity: &str, enabled: bool) -> Result<()> {
        self.sessions
            .policies()
            .set_biometric_auth_enabled(identity, enabled)?;
        if !enabled {
            self.forget_cached_password(identity).await;
        }
        Ok(())
    }

    pub fn generate_random_password(&self, options: &PasswordOptions) -> String {
        generator::generate_random_password(options)
    }

    /// Persist a change to `key`. If the blob cannot be written, `previous`
    /// is put back so the session keeps matching what is on disk.
    async fn commit(
        &self,
        identity: &str,
        vault: &mut Vault,
        key: &str,
        previous: Option<CredentialRecord>,
    ) -> Result<()> {
        match self.sessions.persist(identity, vault).await {
            Ok(()) => {
                if let Some(mut previous) = previous {
                    previous.zeroize();
                }
                Ok(())
            }
            Err(e) => {
                warn!(identity, key, error = %e, "could not persist vault, change rolled back");
                vault.restore(key, previous);
                Err(e)
            }
        }
    }

    async fn disable_biometric(&self, identity: &str) {
        if let Err(e) = self
            .sessions
            .policies()
            .set_biometric_auth_enabled(identity, false)
        {
            warn!(identity, error = %e, "could not clear biometric flag");
        }
        self.forget_cached_password(identity).await;
    }

    async fn forget_cached_password(&self, identity: &str) {
        if let Err(e) = self.sessions.secret_cache().forget(identity).await {
            warn!(identity, error = %e, "could not remove master password from secret cache");
        }
    }
}
