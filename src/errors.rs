use thiserror::Error;

/// All errors that can occur in CredVault.
#[derive(Debug, Error)]
pub enum CredVaultError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Wrong master password or corrupted vault data")]
    AuthenticationMismatch,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Vault errors ---
    #[error("No vault exists for identity '{0}'")]
    VaultNotFound(String),

    #[error("Vault content is corrupted: {0}")]
    CorruptStore(String),

    #[error("Invalid credential key: {0}")]
    InvalidKey(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    // --- Session errors ---
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Another master password prompt is already active for identity '{0}'")]
    Busy(String),

    #[error("Master password prompt failed: {0}")]
    PromptFailed(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    // --- Keyring errors ---
    #[error("Keyring error: {0}")]
    KeyringError(String),

    // --- Config / policy errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    #[error("Policy storage error: {0}")]
    PolicyError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl CredVaultError {
    /// `true` when the operation ended because a human or a policy declined
    /// to proceed. This is a normal outcome, not a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Busy(_))
    }
}

/// Convenience type alias for CredVault results.
pub type Result<T> = std::result::Result<T, CredVaultError>;

/// Caller-facing result of a fallible vault operation.
///
/// Collapses the error taxonomy into the three outcomes a host application
/// surfaces: a value, a silent cancellation, or a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    Cancelled,
    Error(String),
}

impl<T> Outcome<T> {
    pub fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(e) if e.is_cancelled() => Self::Cancelled,
            Err(e) => Self::Error(e.to_string()),
        }
    }
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        Self::from_result(result)
    }
}
