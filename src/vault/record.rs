//! Credential records stored inside a vault.
//!
//! A record carries the attributes every credential shares (key, owner,
//! timestamps) and a `CredentialData` payload tagged by its kind.  Every
//! payload field is optional: a field missing from the stored JSON comes
//! back as `None`, and fields we do not know are ignored.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Discriminant of a `CredentialData` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    Generic,
    Account,
    Identity,
    Wifi,
    BankCard,
    BankAccount,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Account => "account",
            Self::Identity => "identity",
            Self::Wifi => "wifi",
            Self::BankCard => "bank_card",
            Self::BankAccount => "bank_account",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific credential fields.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CredentialData {
    /// A bare secret.
    Generic {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },

    /// Login credentials for a website or service.
    Account {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        identifier: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        two_factor_secret: Option<String>,
    },

    /// Secret material bound to a decentralized identifier.
    Identity {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        did: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        store_password: Option<String>,
    },

    Wifi {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ssid: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        security: Option<String>,
    },

    BankCard {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        holder: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        number: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expiration: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cvv: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bank: Option<String>,
    },

    BankAccount {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        holder: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        iban: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        swift: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bank: Option<String>,
    },
}

impl CredentialData {
    pub fn kind(&self) -> CredentialKind {
        match self {
            Self::Generic { .. } => CredentialKind::Generic,
            Self::Account { .. } => CredentialKind::Account,
            Self::Identity { .. } => CredentialKind::Identity,
            Self::Wifi { .. } => CredentialKind::Wifi,
            Self::BankCard { .. } => CredentialKind::BankCard,
            Self::BankAccount { .. } => CredentialKind::BankAccount,
        }
    }

    /// Shorthand for the most common kind.
    pub fn account(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Account {
            identifier: Some(identifier.into()),
            password: Some(password.into()),
            two_factor_secret: None,
        }
    }

    pub fn generic(password: impl Into<String>) -> Self {
        Self::Generic {
            password: Some(password.into()),
        }
    }

    /// The field a user would call "the password", if this kind has one.
    pub fn secret(&self) -> Option<&str> {
        match self {
            Self::Generic { password }
            | Self::Account { password, .. }
            | Self::Wifi { password, .. } => password.as_deref(),
            Self::Identity { store_password, .. } => store_password.as_deref(),
            Self::BankCard { number, .. } => number.as_deref(),
            Self::BankAccount { iban, .. } => iban.as_deref(),
        }
    }

    /// Present fields as `(name, value)` pairs, in declaration order.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        let all: Vec<(&'static str, &Option<String>)> = match self {
            Self::Generic { password } => vec![("password", password)],
            Self::Account {
                identifier,
                password,
                two_factor_secret,
            } => vec![
                ("identifier", identifier),
                ("password", password),
                ("two_factor_secret", two_factor_secret),
            ],
            Self::Identity {
                did,
                store_password,
            } => vec![("did", did), ("store_password", store_password)],
            Self::Wifi {
                ssid,
                password,
                security,
            } => vec![("ssid", ssid), ("password", password), ("security", security)],
            Self::BankCard {
                holder,
                number,
                expiration,
                cvv,
                bank,
            } => vec![
                ("holder", holder),
                ("number", number),
                ("expiration", expiration),
                ("cvv", cvv),
                ("bank", bank),
            ],
            Self::BankAccount {
                holder,
                iban,
                swift,
                bank,
            } => vec![
                ("holder", holder),
                ("iban", iban),
                ("swift", swift),
                ("bank", bank),
            ],
        };
        all.into_iter()
            .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
            .collect()
    }
}

impl Zeroize for CredentialData {
    fn zeroize(&mut self) {
        match self {
            Self::Generic { password } => password.zeroize(),
            Self::Account {
                identifier,
                password,
                two_factor_secret,
            } => {
                identifier.zeroize();
                password.zeroize();
                two_factor_secret.zeroize();
            }
            Self::Identity {
                did,
                store_password,
            } => {
                did.zeroize();
                store_password.zeroize();
            }
            Self::Wifi {
                ssid,
                password,
                security,
            } => {
                ssid.zeroize();
                password.zeroize();
                security.zeroize();
            }
            Self::BankCard {
                holder,
                number,
                expiration,
                cvv,
                bank,
            } => {
                holder.zeroize();
                number.zeroize();
                expiration.zeroize();
                cvv.zeroize();
                bank.zeroize();
            }
            Self::BankAccount {
                holder,
                iban,
                swift,
                bank,
            } => {
                holder.zeroize();
                iban.zeroize();
                swift.zeroize();
                bank.zeroize();
            }
        }
    }
}

// Payloads are secrets; only the kind is printed.
impl fmt::Debug for CredentialData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialData::{}([REDACTED])", self.kind())
    }
}

/// A single credential stored in the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Unique key within the identity's vault (e.g. "github.com").
    pub key: String,

    /// The application that created this record.
    #[serde(default)]
    pub app_id: String,

    /// Optional human-readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// When this record was first stored.
    pub created_at: DateTime<Utc>,

    /// When this record was last overwritten.
    pub modified_at: DateTime<Utc>,

    /// Kind-specific fields.
    pub data: CredentialData,

    /// Free-form extra fields an application wants to keep with the record.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, String>,
}

impl CredentialRecord {
    /// Build a fresh record; ownership and timestamps are finalized when
    /// the vault manager stores it.
    pub fn new(key: impl Into<String>, data: CredentialData) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            app_id: String::new(),
            display_name: None,
            created_at: now,
            modified_at: now,
            data,
            custom: BTreeMap::new(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_custom(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom.insert(field.into(), value.into());
        self
    }

    pub fn kind(&self) -> CredentialKind {
        self.data.kind()
    }
}

impl Zeroize for CredentialRecord {
    fn zeroize(&mut self) {
        self.data.zeroize();
        for value in self.custom.values_mut() {
            value.zeroize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn account_roundtrips_all_declared_fields() {
        let record = CredentialRecord::new(
            "site1",
            CredentialData::Account {
                identifier: Some("a".into()),
                password: Some("b".into()),
                two_factor_secret: Some("JBSWY3DP".into()),
            },
        )
        .with_display_name("Site One")
        .with_custom("note", "work");

        let json = serde_json::to_string(&record).unwrap();
        let back: CredentialRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn missing_optional_fields_come_back_absent() {
        let value = json!({
            "key": "k",
            "created_at": "2024-01-01T00:00:00Z",
            "modified_at": "2024-01-01T00:00:00Z",
            "data": { "kind": "account", "identifier": "me" }
        });
        let record: CredentialRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.app_id, "");
        assert!(record.display_name.is_none());
        assert_eq!(
            record.data,
            CredentialData::Account {
                identifier: Some("me".into()),
                password: None,
                two_factor_secret: None,
            }
        );
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let value = json!({
            "key": "k",
            "created_at": "2024-01-01T00:00:00Z",
            "modified_at": "2024-01-01T00:00:00Z",
            "future_field": 42,
            "data": { "kind": "wifi", "ssid": "home", "band": "5GHz" }
        });
        let record: CredentialRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.kind(), CredentialKind::Wifi);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let value = json!({ "kind": "spaceship", "password": "x" });
        assert!(serde_json::from_value::<CredentialData>(value).is_err());
    }

    #[test]
    fn kind_tag_is_snake_case() {
        let data = CredentialData::BankAccount {
            holder: None,
            iban: Some("DE00".into()),
            swift: None,
            bank: None,
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["kind"], "bank_account");
        assert!(json.get("holder").is_none());
    }

    #[test]
    fn zeroize_clears_secrets() {
        let mut record = CredentialRecord::new("k", CredentialData::account("me", "pw"))
            .with_custom("pin", "1234");
        record.zeroize();
        assert_eq!(record.data.secret(), None);
        assert_eq!(record.custom["pin"], "");
    }

    #[test]
    fn fields_skip_absent_values() {
        let data = CredentialData::Wifi {
            ssid: Some("home".into()),
            password: None,
            security: Some("wpa2".into()),
        };
        assert_eq!(data.fields(), vec![("ssid", "home"), ("security", "wpa2")]);
    }

    #[test]
    fn debug_redacts_payload() {
        let data = CredentialData::generic("topsecret");
        assert!(!format!("{data:?}").contains("topsecret"));
    }
}
