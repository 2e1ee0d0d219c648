//! The master password, held in memory only while a session is unlocked.

use std::fmt;

use zeroize::{Zeroize, Zeroizing};

/// A master password that wipes its memory when dropped.
///
/// `Debug` is redacted so the value can never end up in logs.
#[derive(Clone)]
pub struct MasterPassword(Zeroizing<String>);

impl MasterPassword {
    pub fn new(password: impl Into<String>) -> Self {
        Self(Zeroizing::new(password.into()))
    }

    /// Access the raw password (e.g. to feed the KDF).
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Wipe the password now instead of waiting for drop.
    pub fn wipe(&mut self) {
        self.0.zeroize();
    }
}

impl From<String> for MasterPassword {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<Zeroizing<String>> for MasterPassword {
    fn from(value: Zeroizing<String>) -> Self {
        Self(value)
    }
}

impl PartialEq for MasterPassword {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for MasterPassword {}

impl fmt::Debug for MasterPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterPassword([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_does_not_leak() {
        let pw = MasterPassword::new("hunter22");
        assert!(!format!("{pw:?}").contains("hunter22"));
    }

    #[test]
    fn wipe_clears_the_value() {
        let mut pw = MasterPassword::new("hunter22");
        pw.wipe();
        assert!(pw.is_empty());
    }
}
