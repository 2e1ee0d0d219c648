//! Per-identity unlock policy scalars.
//!
//! These live next to the encrypted blob but outside it, so they can be
//! read without unlocking the vault:
//!
//! ```text
//! <data_dir>/<identity hash>/policy.json   {"unlock_mode": 0, "biometric_auth": false}
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CredVaultError, Result};
use crate::vault::blob::write_atomic;
use crate::vault::identity_dir;

/// File name of the policy document inside an identity directory.
const POLICY_FILE: &str = "policy.json";

/// How long an unlock lasts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnlockMode {
    /// Stay unlocked until locked, expired, or the process exits.
    #[default]
    UnlockForAWhile,
    /// Ask for the master password on every operation.
    UnlockEveryTime,
}

impl UnlockMode {
    /// Integer representation used on disk.
    pub fn as_i64(self) -> i64 {
        match self {
            Self::UnlockForAWhile => 0,
            Self::UnlockEveryTime => 1,
        }
    }

    /// Decode the on-disk integer; unknown values fall back to the default.
    pub fn from_i64(value: i64) -> Self {
        match value {
            1 => Self::UnlockEveryTime,
            _ => Self::UnlockForAWhile,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PolicyFile {
    #[serde(default)]
    unlock_mode: i64,
    #[serde(default)]
    biometric_auth: bool,
}

/// Small key/value store for unlock policy, one file per identity.
///
/// Updates are read-modify-write of the whole file, serialized by a lock
/// shared between clones so concurrent setters cannot drop each other's
/// change.
#[derive(Debug, Clone)]
pub struct PolicyStore {
    root: PathBuf,
    update_lock: Arc<Mutex<()>>,
}

impl PolicyStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            update_lock: Arc::new(Mutex::new(())),
        }
    }

    fn path_for(&self, identity: &str) -> PathBuf {
        identity_dir(&self.root, identity).join(POLICY_FILE)
    }

    pub fn unlock_mode(&self, identity: &str) -> Result<UnlockMode> {
        Ok(UnlockMode::from_i64(self.read(identity)?.unlock_mode))
    }

    pub fn set_unlock_mode(&self, identity: &str, mode: UnlockMode) -> Result<()> {
        self.update(identity, |p| p.unlock_mode = mode.as_i64())
    }

    pub fn biometric_auth_enabled(&self, identity: &str) -> Result<bool> {
        Ok(self.read(identity)?.biometric_auth)
    }

    pub fn set_biometric_auth_enabled(&self, identity: &str, enabled: bool) -> Result<()> {
        self.update(identity, |p| p.biometric_auth = enabled)
    }

    fn read(&self, identity: &str) -> Result<PolicyFile> {
        let path = self.path_for(identity);
        let contents = match fs::read(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(PolicyFile::default()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&contents)
            .map_err(|e| CredVaultError::PolicyError(format!("{}: {e}", path.display())))
    }

    fn update(&self, identity: &str, change: impl FnOnce(&mut PolicyFile)) -> Result<()> {
        let _guard = self
            .update_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut policy = self.read(identity)?;
        change(&mut policy);

        let bytes = serde_json::to_vec_pretty(&policy)
            .map_err(|e| CredVaultError::SerializationError(format!("policy: {e}")))?;
        write_atomic(&self.path_for(identity), &bytes)?;

        debug!(
            unlock_mode = policy.unlock_mode,
            biometric_auth = policy.biometric_auth,
            "policy updated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_a_file() {
        let dir = TempDir::new().unwrap();
        let store = PolicyStore::new(dir.path());
        assert_eq!(store.unlock_mode("me").unwrap(), UnlockMode::UnlockForAWhile);
        assert!(!store.biometric_auth_enabled("me").unwrap());
    }

    #[test]
    fn values_persist_independently() {
        let dir = TempDir::new().unwrap();
        let store = PolicyStore::new(dir.path());

        store.set_unlock_mode("me", UnlockMode::UnlockEveryTime).unwrap();
        store.set_biometric_auth_enabled("me", true).unwrap();

        let reopened = PolicyStore::new(dir.path());
        assert_eq!(reopened.unlock_mode("me").unwrap(), UnlockMode::UnlockEveryTime);
        assert!(reopened.biometric_auth_enabled("me").unwrap());
        assert_eq!(reopened.unlock_mode("you").unwrap(), UnlockMode::UnlockForAWhile);
    }

    #[test]
    fn unlock_mode_is_stored_as_integer() {
        let dir = TempDir::new().unwrap();
        let store = PolicyStore::new(dir.path());
        store.set_unlock_mode("me", UnlockMode::UnlockEveryTime).unwrap();

        let raw = fs::read_to_string(store.path_for("me")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["unlock_mode"], 1);
    }

    #[test]
    fn unknown_mode_integer_falls_back_to_default() {
        assert_eq!(UnlockMode::from_i64(42), UnlockMode::UnlockForAWhile);
    }

    #[test]
    fn concurrent_updates_keep_both_fields() {
        let dir = TempDir::new().unwrap();
        let store = PolicyStore::new(dir.path());

        for _ in 0..20 {
            store.set_unlock_mode("me", UnlockMode::UnlockForAWhile).unwrap();
            store.set_biometric_auth_enabled("me", false).unwrap();

            let modes = store.clone();
            let flags = store.clone();
            let a = std::thread::spawn(move || {
                modes.set_unlock_mode("me", UnlockMode::UnlockEveryTime).unwrap()
            });
            let b = std::thread::spawn(move || {
                flags.set_biometric_auth_enabled("me", true).unwrap()
            });
            a.join().unwrap();
            b.join().unwrap();

            assert_eq!(store.unlock_mode("me").unwrap(), UnlockMode::UnlockEveryTime);
            assert!(store.biometric_auth_enabled("me").unwrap());
        }
    }

    #[test]
    fn corrupted_file_is_a_policy_error() {
        let dir = TempDir::new().unwrap();
        let store = PolicyStore::new(dir.path());
        let path = store.path_for("me");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{{").unwrap();
        assert!(matches!(
            store.unlock_mode("me"),
            Err(CredVaultError::PolicyError(_))
        ));
    }
}
