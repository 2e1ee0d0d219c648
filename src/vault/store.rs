//! In-memory representation of one identity's unlocked vault.
//!
//! `Vault` owns the decrypted record set together with the master password
//! that unlocked it.  All operations here are synchronous and never touch
//! disk; the session layer encrypts `to_blob()` output and persists it.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use super::record::CredentialRecord;
use crate::crypto::MasterPassword;
use crate::errors::{CredVaultError, Result};

/// Version of the plaintext document inside the encrypted blob.
pub const DOCUMENT_VERSION: u32 = 1;

/// Maximum length of a record key.
const MAX_KEY_LEN: usize = 256;

/// The plaintext document, as serialized into the blob.
#[derive(Serialize, Deserialize)]
struct Document {
    version: u32,
    #[serde(default)]
    records: HashMap<String, CredentialRecord>,
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    version: u32,
    records: &'a HashMap<String, CredentialRecord>,
}

/// One identity's decrypted credential records.
///
/// Dropping a `Vault` zeroizes the master password and every record's
/// secret fields.
pub struct Vault {
    records: HashMap<String, CredentialRecord>,
    master_password: MasterPassword,
    opened_at: DateTime<Utc>,
}

impl Vault {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// A vault with no records, for a freshly created master password.
    pub fn empty(master_password: MasterPassword, opened_at: DateTime<Utc>) -> Self {
        Self {
            records: HashMap::new(),
            master_password,
            opened_at,
        }
    }

    /// Decode the plaintext document produced by `to_blob`.
    ///
    /// Fails with `CorruptStore` if the document is not valid JSON, has an
    /// unknown version or kind, or files a record under the wrong key.
    pub fn load_from_blob(
        plaintext: &[u8],
        master_password: MasterPassword,
        opened_at: DateTime<Utc>,
    ) -> Result<Self> {
        let document: Document = serde_json::from_slice(plaintext)
            .map_err(|e| CredVaultError::CorruptStore(format!("invalid document: {e}")))?;

        if document.version != DOCUMENT_VERSION {
            return Err(CredVaultError::CorruptStore(format!(
                "unsupported document version {}, expected {DOCUMENT_VERSION}",
                document.version
            )));
        }

        if let Some((key, record)) = document.records.iter().find(|(k, r)| **k != r.key) {
            return Err(CredVaultError::CorruptStore(format!(
                "record '{}' is filed under key '{key}'",
                record.key
            )));
        }

        Ok(Self {
            records: document.records,
            master_password,
            opened_at,
        })
    }

    /// Encode the record set as the plaintext document.
    ///
    /// The buffer is wiped when dropped since it holds every secret.
    pub fn to_blob(&self) -> Result<Zeroizing<Vec<u8>>> {
        let document = DocumentRef {
            version: DOCUMENT_VERSION,
            records: &self.records,
        };
        serde_json::to_vec(&document)
            .map(Zeroizing::new)
            .map_err(|e| CredVaultError::SerializationError(format!("vault document: {e}")))
    }

    // ------------------------------------------------------------------
    // Record operations
    // ------------------------------------------------------------------

    pub fn get(&self, key: &str) -> Option<&CredentialRecord> {
        self.records.get(key)
    }

    /// Insert or overwrite the record stored under `key`.
    ///
    /// The record's own `key` field is aligned with `key`.
    pub fn set(&mut self, key: &str, mut record: CredentialRecord) -> Result<()> {
        validate_key(key)?;
        record.key = key.to_string();
        if let Some(mut previous) = self.records.insert(key.to_string(), record) {
            previous.zeroize();
        }
        Ok(())
    }

    /// Remove a record. Returns whether one existed.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.records.remove(key) {
            Some(mut removed) => {
                removed.zeroize();
                true
            }
            None => false,
        }
    }

    /// Put back what `key` held before a change that could not be persisted.
    /// `None` removes whatever is stored there now.
    pub fn restore(&mut self, key: &str, previous: Option<CredentialRecord>) {
        let replaced = match previous {
            Some(record) => self.records.insert(key.to_string(), record),
            None => self.records.remove(key),
        };
        if let Some(mut replaced) = replaced {
            replaced.zeroize();
        }
    }

    /// All records, sorted by key.
    pub fn list_all(&self) -> Vec<&CredentialRecord> {
        let mut list: Vec<&CredentialRecord> = self.records.values().collect();
        list.sort_by(|a, b| a.key.cmp(&b.key));
        list
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // ------------------------------------------------------------------
    // Session data
    // ------------------------------------------------------------------

    pub fn master_password(&self) -> &MasterPassword {
        &self.master_password
    }

    /// Swap in a new master password, wiping the old one.
    pub fn replace_master_password(&mut self, password: MasterPassword) {
        self.master_password.wipe();
        self.master_password = password;
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }
}

impl Drop for Vault {
    fn drop(&mut self) {
        for record in self.records.values_mut() {
            record.zeroize();
        }
        self.master_password.wipe();
    }
}

impl fmt::Debug for Vault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vault")
            .field("records", &self.records.len())
            .field("master_password", &"[REDACTED]")
            .field("opened_at", &self.opened_at)
            .finish()
    }
}

/// Validate that a record key is usable.
///
/// Must be non-empty, at most 256 characters, and free of control
/// characters.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CredVaultError::InvalidKey("key cannot be empty".into()));
    }
    if key.chars().count() > MAX_KEY_LEN {
        return Err(CredVaultError::InvalidKey(format!(
            "key cannot exceed {MAX_KEY_LEN} characters"
        )));
    }
    if key.chars().any(char::is_control) {
        return Err(CredVaultError::InvalidKey(
            "key cannot contain control characters".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::record::CredentialData;

    fn vault() -> Vault {
        Vault::empty(MasterPassword::new("pw"), Utc::now())
    }

    #[test]
    fn set_then_get() {
        let mut v = vault();
        v.set("site1", CredentialRecord::new("site1", CredentialData::account("a", "b")))
            .unwrap();
        assert_eq!(
            v.get("site1").unwrap().data,
            CredentialData::account("a", "b")
        );
    }

    #[test]
    fn set_overwrites_and_aligns_key() {
        let mut v = vault();
        v.set("k", CredentialRecord::new("k", CredentialData::generic("one")))
            .unwrap();
        v.set("k", CredentialRecord::new("other", CredentialData::generic("two")))
            .unwrap();
        assert_eq!(v.len(), 1);
        let record = v.get("k").unwrap();
        assert_eq!(record.key, "k");
        assert_eq!(record.data.secret(), Some("two"));
    }

    #[test]
    fn delete_reports_presence() {
        let mut v = vault();
        v.set("k", CredentialRecord::new("k", CredentialData::generic("x")))
            .unwrap();
        assert!(v.delete("k"));
        assert!(!v.delete("k"));
        assert!(v.is_empty());
    }

    #[test]
    fn restore_undoes_set_and_delete() {
        let mut v = vault();
        v.set("k", CredentialRecord::new("k", CredentialData::generic("old")))
            .unwrap();

        let previous = v.get("k").cloned();
        v.set("k", CredentialRecord::new("k", CredentialData::generic("new")))
            .unwrap();
        v.restore("k", previous);
        assert_eq!(v.get("k").unwrap().data.secret(), Some("old"));

        v.set("fresh", CredentialRecord::new("fresh", CredentialData::generic("x")))
            .unwrap();
        v.restore("fresh", None);
        assert!(v.get("fresh").is_none());
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn list_all_is_sorted() {
        let mut v = vault();
        for key in ["b", "c", "a"] {
            v.set(key, CredentialRecord::new(key, CredentialData::generic(key)))
                .unwrap();
        }
        let keys: Vec<&str> = v.list_all().iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn blob_roundtrip_preserves_records() {
        let mut v = vault();
        v.set("k", CredentialRecord::new("k", CredentialData::account("me", "pw")))
            .unwrap();
        let blob = v.to_blob().unwrap();

        let loaded = Vault::load_from_blob(&blob, MasterPassword::new("pw"), Utc::now()).unwrap();
        assert_eq!(loaded.get("k"), v.get("k"));
    }

    #[test]
    fn invalid_json_is_corrupt_store() {
        let result = Vault::load_from_blob(b"not json", MasterPassword::new("pw"), Utc::now());
        assert!(matches!(result, Err(CredVaultError::CorruptStore(_))));
    }

    #[test]
    fn unknown_version_is_corrupt_store() {
        let result = Vault::load_from_blob(
            br#"{"version": 99, "records": {}}"#,
            MasterPassword::new("pw"),
            Utc::now(),
        );
        assert!(matches!(result, Err(CredVaultError::CorruptStore(_))));
    }

    #[test]
    fn misfiled_record_is_corrupt_store() {
        let doc = br#"{"version": 1, "records": {"a": {
            "key": "b",
            "created_at": "2024-01-01T00:00:00Z",
            "modified_at": "2024-01-01T00:00:00Z",
            "data": {"kind": "generic"}
        }}}"#;
        let result = Vault::load_from_blob(doc, MasterPassword::new("pw"), Utc::now());
        assert!(matches!(result, Err(CredVaultError::CorruptStore(_))));
    }

    #[test]
    fn key_validation() {
        assert!(validate_key("github.com").is_ok());
        assert!(validate_key("mon compte é").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("bad\nkey").is_err());
        assert!(validate_key(&"a".repeat(257)).is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let v = vault();
        assert!(!format!("{v:?}").contains("\"pw\""));
    }
}
