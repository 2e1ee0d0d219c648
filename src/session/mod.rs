//! Session manager: decides when an identity's vault is locked or unlocked.
//!
//! Each identity has its own slot in an owned registry.  A slot is in one
//! of three states:
//!
//! - **Locked**: no `Vault` in memory.
//! - **PromptPending**: a master password prompt is outstanding.  Any other
//!   request that would need a prompt fails with `Busy` instead of opening
//!   a second one.
//! - **Unlocked**: the decrypted `Vault` is in memory together with the
//!   time it was opened.
//!
//! Expiry is evaluated lazily when a session is opened: a session is
//! expired when the identity's unlock mode is `UnlockEveryTime`, or when it
//! was opened longer ago than the session timeout.  An expired session is
//! evicted (and zeroized) before anything reads from it.
//!
//! Prompts are awaited without holding the slot's lock, so `lock` and
//! `delete_all` never wait on a human.  They bump the slot's epoch; a prompt
//! that resolves after the epoch moved is discarded as `Cancelled`.

pub mod collaborators;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMappedMutexGuard, OwnedMutexGuard};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::crypto::{MasterPassword, PasswordCipher};
use crate::errors::{CredVaultError, Result};
use crate::policy::{PolicyStore, UnlockMode};
use crate::vault::{BlobStore, Vault};

pub use collaborators::{
    CreationPurpose, CreationRequest, MasterPasswordPrompter, NoSecretCache, PromptRequest,
    PromptResponse, SecretCache,
};

/// Exclusive access to an unlocked vault for the duration of one operation.
pub type SessionGuard = OwnedMappedMutexGuard<Option<Vault>, Vault>;

/// How `SessionManager::open` may obtain an unlocked vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    /// Run the master password creation flow when no vault exists yet.
    pub create_if_missing: bool,
    /// Prompt when the session is locked; otherwise fail with `Cancelled`.
    pub prompt_if_locked: bool,
    /// Re-authenticate even if the session is currently unlocked.
    pub force_prompt: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            create_if_missing: false,
            prompt_if_locked: true,
            force_prompt: false,
        }
    }
}

/// Observable state of one identity's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Locked,
    PromptPending,
    Unlocked { opened_at: DateTime<Utc> },
}

/// `true` if a session opened at `opened_at` may no longer be used at `now`.
pub fn session_expired(
    mode: UnlockMode,
    opened_at: DateTime<Utc>,
    now: DateTime<Utc>,
    timeout: Duration,
) -> bool {
    if mode == UnlockMode::UnlockEveryTime {
        return true;
    }
    let timeout = TimeDelta::from_std(timeout).unwrap_or(TimeDelta::MAX);
    now.signed_duration_since(opened_at) > timeout
}

#[derive(Default)]
struct IdentitySlot {
    vault: Arc<AsyncMutex<Option<Vault>>>,
    prompt_pending: AtomicBool,
    epoch: AtomicU64,
}

/// Marks a slot as `PromptPending` until dropped, including when the
/// operation future is dropped mid-prompt.
struct PendingPrompt {
    slot: Arc<IdentitySlot>,
}

impl PendingPrompt {
    fn acquire(slot: &Arc<IdentitySlot>, identity: &str) -> Result<Self> {
        if slot
            .prompt_pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(identity, "master password prompt already active, rejecting request");
            return Err(CredVaultError::Busy(identity.to_string()));
        }
        Ok(Self {
            slot: Arc::clone(slot),
        })
    }
}

impl Drop for PendingPrompt {
    fn drop(&mut self) {
        self.slot.prompt_pending.store(false, Ordering::SeqCst);
    }
}

/// Owns every identity's session and the collaborators used to unlock them.
pub struct SessionManager {
    slots: Mutex<HashMap<String, Arc<IdentitySlot>>>,
    blobs: BlobStore,
    policies: PolicyStore,
    cipher: PasswordCipher,
    prompter: Arc<dyn MasterPasswordPrompter>,
    secret_cache: Arc<dyn SecretCache>,
    session_timeout: Duration,
}

impl SessionManager {
    pub fn new(
        blobs: BlobStore,
        policies: PolicyStore,
        cipher: PasswordCipher,
        prompter: Arc<dyn MasterPasswordPrompter>,
        secret_cache: Arc<dyn SecretCache>,
        session_timeout: Duration,
    ) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            blobs,
            policies,
            cipher,
            prompter,
            secret_cache,
            session_timeout,
        }
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn policies(&self) -> &PolicyStore {
        &self.policies
    }

    pub fn secret_cache(&self) -> &dyn SecretCache {
        self.secret_cache.as_ref()
    }

    fn slot(&self, identity: &str) -> Arc<IdentitySlot> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(identity.to_string()).or_default())
    }

    // ------------------------------------------------------------------
    // State transitions
    // ------------------------------------------------------------------

    /// Return the identity's unlocked vault, unlocking or creating it first
    /// if needed.
    pub async fn open(&self, identity: &str, options: OpenOptions) -> Result<SessionGuard> {
        let slot = self.slot(identity);
        let mut state = Arc::clone(&slot.vault).lock_owned().await;

        let expired = match state.as_ref() {
            Some(vault) => Some(self.is_expired(identity, vault)?),
            None => None,
        };
        match expired {
            Some(false) if !options.force_prompt => return into_session_guard(state, identity),
            Some(false) => {
                debug!(identity, "re-authentication requested, locking session");
                *state = None;
            }
            Some(true) => {
                info!(identity, "session expired, vault locked");
                *state = None;
            }
            None => {}
        }

        let exists = self.blobs.exists(identity);
        if !exists && !options.create_if_missing {
            return Err(CredVaultError::VaultNotFound(identity.to_string()));
        }
        if slot.prompt_pending.load(Ordering::SeqCst) {
            debug!(identity, "master password prompt already active, rejecting request");
            return Err(CredVaultError::Busy(identity.to_string()));
        }
        if !options.prompt_if_locked {
            debug!(identity, "vault locked and prompting not allowed");
            return Err(CredVaultError::Cancelled);
        }

        let pending = PendingPrompt::acquire(&slot, identity)?;
        let epoch = slot.epoch.load(Ordering::SeqCst);
        drop(state);

        let (vault, created) = if exists {
            (self.unlock_existing(identity, options.force_prompt).await?, false)
        } else {
            (self.create_vault(identity).await?, true)
        };

        let mut state = Arc::clone(&slot.vault).lock_owned().await;
        if slot.epoch.load(Ordering::SeqCst) != epoch {
            info!(identity, "vault was locked while prompting, discarding unlock");
            return Err(CredVaultError::Cancelled);
        }
        if created {
            self.persist(identity, &vault).await?;
        }
        *state = Some(vault);
        drop(pending);

        into_session_guard(state, identity)
    }

    /// Evict the identity's vault from memory. No-op when already locked.
    pub async fn lock(&self, identity: &str) {
        let slot = self.slot(identity);
        slot.epoch.fetch_add(1, Ordering::SeqCst);
        let mut state = slot.vault.lock().await;
        if state.take().is_some() {
            info!(identity, "vault locked");
        }
    }

    /// Lock the session, then remove the blob irrecoverably.
    ///
    /// Returns whether a blob existed.
    pub async fn delete_all(&self, identity: &str) -> Result<bool> {
        let slot = self.slot(identity);
        slot.epoch.fetch_add(1, Ordering::SeqCst);
        let mut state = slot.vault.lock().await;
        if state.take().is_some() {
            info!(identity, "vault locked");
        }
        self.blobs.delete(identity)
    }

    /// Re-encrypt the identity's vault under a newly chosen master password.
    ///
    /// The current password is checked by unlocking first. The new one is
    /// asked for without holding the slot's lock; if `lock` or `delete_all`
    /// ran meanwhile, the change is discarded as `Cancelled`.
    pub async fn change_master_password(&self, identity: &str) -> Result<()> {
        let slot = self.slot(identity);
        let epoch = {
            let _unlocked = self.open(identity, OpenOptions::default()).await?;
            slot.epoch.load(Ordering::SeqCst)
        };

        let new_password = self
            .prompt_new_password(identity, CreationPurpose::Change)
            .await?;

        let state = Arc::clone(&slot.vault).lock_owned().await;
        if slot.epoch.load(Ordering::SeqCst) != epoch || state.is_none() {
            info!(identity, "vault was locked while choosing a new password, discarding change");
            return Err(CredVaultError::Cancelled);
        }
        let mut vault = into_session_guard(state, identity)?;

        self.write_encrypted(identity, &vault, new_password.clone())
            .await?;
        vault.replace_master_password(new_password);

        info!(identity, "master password changed");
        Ok(())
    }

    /// Current state of the identity's session. An expired session reports
    /// `Locked`.
    pub async fn status(&self, identity: &str) -> Result<SessionStatus> {
        let slot = self.slot(identity);
        if slot.prompt_pending.load(Ordering::SeqCst) {
            return Ok(SessionStatus::PromptPending);
        }
        let state = slot.vault.lock().await;
        match state.as_ref() {
            Some(vault) if !self.is_expired(identity, vault)? => Ok(SessionStatus::Unlocked {
                opened_at: vault.opened_at(),
            }),
            _ => Ok(SessionStatus::Locked),
        }
    }

    fn is_expired(&self, identity: &str, vault: &Vault) -> Result<bool> {
        let mode = self.policies.unlock_mode(identity)?;
        Ok(session_expired(
            mode,
            vault.opened_at(),
            Utc::now(),
            self.session_timeout,
        ))
    }

    // ------------------------------------------------------------------
    // Obtaining a password
    // ------------------------------------------------------------------

    /// Loop until a password decrypts the blob, the human cancels, or the
    /// prompter gives up.
    async fn unlock_existing(&self, identity: &str, force_prompt: bool) -> Result<Vault> {
        let blob: Arc<[u8]> = self
            .blobs
            .read(identity)?
            .ok_or_else(|| CredVaultError::VaultNotFound(identity.to_string()))?
            .into();

        let biometric_enabled = self.policies.biometric_auth_enabled(identity)?;
        let cache_available = self.secret_cache.is_available();
        let mut is_retry = false;

        if biometric_enabled && cache_available && !force_prompt {
            match self.secret_cache.retrieve(identity).await {
                Ok(Some(password)) => match self.decrypt_vault(Arc::clone(&blob), password).await {
                    Ok(vault) => {
                        info!(identity, "vault unlocked from secret cache");
                        return Ok(vault);
                    }
                    Err(CredVaultError::AuthenticationMismatch) => {
                        warn!(identity, "cached master password no longer opens the vault");
                        is_retry = true;
                    }
                    Err(e) => return Err(e),
                },
                Ok(None) => debug!(identity, "no master password in secret cache"),
                Err(e) => {
                    warn!(identity, error = %e, "secret cache retrieval failed");
                    is_retry = true;
                }
            }
        }

        loop {
            let request = PromptRequest {
                identity: identity.to_string(),
                is_retry,
                biometric_enabled,
                secret_cache_available: cache_available,
            };

            match self.prompter.prompt_master_password(request).await {
                PromptResponse::Password {
                    password,
                    save_to_secret_cache,
                } => match self.decrypt_vault(Arc::clone(&blob), password.clone()).await {
                    Ok(vault) => {
                        if save_to_secret_cache {
                            self.enroll_secret_cache(identity, &password).await;
                        }
                        info!(identity, "vault unlocked");
                        return Ok(vault);
                    }
                    Err(CredVaultError::AuthenticationMismatch) => {
                        debug!(identity, "wrong master password, prompting again");
                        is_retry = true;
                    }
                    Err(e) => return Err(e),
                },
                PromptResponse::BiometricFailed(reason) => {
                    warn!(identity, %reason, "biometric authentication failed, prompting again");
                    is_retry = true;
                }
                PromptResponse::Cancelled => {
                    info!(identity, "unlock cancelled");
                    return Err(CredVaultError::Cancelled);
                }
                PromptResponse::Failed(message) => {
                    return Err(CredVaultError::PromptFailed(message));
                }
            }
        }
    }

    async fn create_vault(&self, identity: &str) -> Result<Vault> {
        let password = self
            .prompt_new_password_unchecked(identity, CreationPurpose::Create)
            .await?;
        info!(identity, "master password created");
        Ok(Vault::empty(password, Utc::now()))
    }

    /// Ask for a new master password while holding the prompt slot.
    async fn prompt_new_password(
        &self,
        identity: &str,
        purpose: CreationPurpose,
    ) -> Result<MasterPassword> {
        let slot = self.slot(identity);
        let _pending = PendingPrompt::acquire(&slot, identity)?;
        self.prompt_new_password_unchecked(identity, purpose).await
    }

    async fn prompt_new_password_unchecked(
        &self,
        identity: &str,
        purpose: CreationPurpose,
    ) -> Result<MasterPassword> {
        let request = CreationRequest {
            identity: identity.to_string(),
            purpose,
        };
        match self.prompter.create_master_password(request).await {
            Some(password) if password.is_empty() => Err(CredVaultError::PromptFailed(
                "master password cannot be empty".into(),
            )),
            Some(password) => Ok(password),
            None => {
                info!(identity, "master password entry cancelled");
                Err(CredVaultError::Cancelled)
            }
        }
    }

    /// Best-effort: a failing cache never fails the unlock, but the
    /// biometric flag only flips on success.
    async fn enroll_secret_cache(&self, identity: &str, password: &MasterPassword) {
        match self.secret_cache.save(identity, password).await {
            Ok(()) => match self.policies.set_biometric_auth_enabled(identity, true) {
                Ok(()) => info!(identity, "master password saved to secret cache"),
                Err(e) => warn!(identity, error = %e, "could not record biometric enrollment"),
            },
            Err(e) => warn!(identity, error = %e, "could not save master password to secret cache"),
        }
    }

    // ------------------------------------------------------------------
    // Encryption and persistence
    // ------------------------------------------------------------------

    async fn decrypt_vault(&self, blob: Arc<[u8]>, password: MasterPassword) -> Result<Vault> {
        let cipher = self.cipher;
        tokio::task::spawn_blocking(move || {
            let plaintext = Zeroizing::new(cipher.decrypt(&blob, password.expose())?);
            Vault::load_from_blob(&plaintext, password, Utc::now())
        })
        .await
        .map_err(|e| CredVaultError::TaskFailed(e.to_string()))?
    }

    /// Re-encrypt the whole vault under its current master password and
    /// replace the blob.
    pub async fn persist(&self, identity: &str, vault: &Vault) -> Result<()> {
        self.write_encrypted(identity, vault, vault.master_password().clone())
            .await
    }

    /// Encrypt the whole vault under `password` and replace the blob.
    async fn write_encrypted(
        &self,
        identity: &str,
        vault: &Vault,
        password: MasterPassword,
    ) -> Result<()> {
        let plaintext = vault.to_blob()?;
        let cipher = self.cipher;
        let blob = tokio::task::spawn_blocking(move || cipher.encrypt(&plaintext, password.expose()))
            .await
            .map_err(|e| CredVaultError::TaskFailed(e.to_string()))??;
        self.blobs.write(identity, &blob)
    }
}

fn into_session_guard(state: OwnedMutexGuard<Option<Vault>>, identity: &str) -> Result<SessionGuard> {
    OwnedMutexGuard::try_map(state, Option::as_mut)
        .map_err(|_| CredVaultError::VaultNotFound(identity.to_string()))
}
