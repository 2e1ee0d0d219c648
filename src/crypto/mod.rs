//! Cryptographic primitives for CredVault.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption (`encryption`)
//! - Argon2id password-based key derivation (`kdf`)
//! - The password-based blob envelope used for vault files (`cipher`)
//! - A zeroizing master password wrapper (`password`)

pub mod cipher;
pub mod encryption;
pub mod kdf;
pub mod password;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{PasswordCipher, MasterPassword, ...};
pub use cipher::PasswordCipher;
pub use kdf::{derive_key, generate_salt, Argon2Params};
pub use password::MasterPassword;
