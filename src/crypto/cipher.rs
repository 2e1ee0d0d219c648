//! Password-based encryption of whole vault blobs.
//!
//! A blob is self-describing: everything needed to decrypt it except the
//! password travels inside it.
//!
//! ```text
//! [CVLT: 4][version: 1][memory_kib: 4 LE][iterations: 4 LE][parallelism: 4 LE][salt: 16][nonce: 12][ciphertext + tag]
//! ```
//!
//! Everything before the nonce is authenticated as associated data, so a
//! tampered KDF parameter is caught just like a wrong password.

use tracing::debug;

use super::encryption;
use super::kdf::{self, Argon2Params, SALT_LEN};
use crate::errors::{CredVaultError, Result};

/// Magic bytes at the start of every blob.
const MAGIC: &[u8; 4] = b"CVLT";

/// Current envelope version.
pub const CURRENT_VERSION: u8 = 1;

/// Magic + version + three u32 params.
const PARAMS_END: usize = 4 + 1 + 4 * 3;

/// Header length including the salt.
const HEADER_LEN: usize = PARAMS_END + SALT_LEN;

/// Encrypts and decrypts opaque buffers under a password.
///
/// Holds only the KDF cost used for *new* ciphertexts; nothing derived
/// from a password outlives a single call.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordCipher {
    params: Argon2Params,
}

impl PasswordCipher {
    pub fn new(params: Argon2Params) -> Self {
        Self { params }
    }

    pub fn params(&self) -> Argon2Params {
        self.params
    }

    /// Encrypt `plaintext` under `password` with a fresh salt and nonce.
    pub fn encrypt(&self, plaintext: &[u8], password: &str) -> Result<Vec<u8>> {
        let salt = kdf::generate_salt();

        let mut header = Vec::with_capacity(HEADER_LEN);
        header.extend_from_slice(MAGIC);
        header.push(CURRENT_VERSION);
        header.extend_from_slice(&self.params.memory_kib.to_le_bytes());
        header.extend_from_slice(&self.params.iterations.to_le_bytes());
        header.extend_from_slice(&self.params.parallelism.to_le_bytes());
        header.extend_from_slice(&salt);

        let key = kdf::derive_key(password.as_bytes(), &salt, &self.params)?;
        let sealed = encryption::encrypt(key.as_ref(), plaintext, &header)?;

        let mut out = header;
        out.extend_from_slice(&sealed);
        debug!(bytes = out.len(), "blob encrypted");
        Ok(out)
    }

    /// Decrypt a blob produced by `encrypt`.
    ///
    /// Uses the KDF parameters recorded in the blob, not `self.params`, so
    /// blobs written under older settings stay readable.
    pub fn decrypt(&self, ciphertext: &[u8], password: &str) -> Result<Vec<u8>> {
        if ciphertext.len() < HEADER_LEN {
            return Err(CredVaultError::AuthenticationMismatch);
        }
        if &ciphertext[0..4] != MAGIC || ciphertext[4] != CURRENT_VERSION {
            return Err(CredVaultError::AuthenticationMismatch);
        }

        let params = Argon2Params {
            memory_kib: read_u32(ciphertext, 5)?,
            iterations: read_u32(ciphertext, 9)?,
            parallelism: read_u32(ciphertext, 13)?,
        };
        // A corrupted header must not become a different error class.
        params
            .validate()
            .map_err(|_| CredVaultError::AuthenticationMismatch)?;

        let (header, sealed) = ciphertext.split_at(HEADER_LEN);
        let salt = &header[PARAMS_END..];

        let key = kdf::derive_key(password.as_bytes(), salt, &params)
            .map_err(|_| CredVaultError::AuthenticationMismatch)?;
        encryption::decrypt(key.as_ref(), sealed, header)
    }
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    let bytes: [u8; 4] = data
        .get(offset..offset + 4)
        .and_then(|s| s.try_into().ok())
        .ok_or(CredVaultError::AuthenticationMismatch)?;
    Ok(u32::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kdf::MIN_MEMORY_KIB;

    fn cipher() -> PasswordCipher {
        PasswordCipher::new(Argon2Params {
            memory_kib: MIN_MEMORY_KIB,
            iterations: 1,
            parallelism: 1,
        })
    }

    #[test]
    fn header_records_params() {
        let blob = cipher().encrypt(b"{}", "pw").unwrap();
        assert_eq!(&blob[0..4], MAGIC);
        assert_eq!(blob[4], CURRENT_VERSION);
        assert_eq!(read_u32(&blob, 5).unwrap(), MIN_MEMORY_KIB);
        assert_eq!(read_u32(&blob, 9).unwrap(), 1);
        assert_eq!(read_u32(&blob, 13).unwrap(), 1);
    }

    #[test]
    fn decrypt_uses_params_from_blob() {
        let blob = cipher().encrypt(b"hello", "pw").unwrap();
        // A cipher configured with other params still opens the blob.
        let other = PasswordCipher::new(Argon2Params {
            memory_kib: MIN_MEMORY_KIB * 2,
            iterations: 2,
            parallelism: 1,
        });
        assert_eq!(other.decrypt(&blob, "pw").unwrap(), b"hello");
    }

    #[test]
    fn tampered_params_are_an_authentication_mismatch() {
        let mut blob = cipher().encrypt(b"hello", "pw").unwrap();
        blob[9] = 2; // iterations 1 -> 2
        assert!(matches!(
            cipher().decrypt(&blob, "pw"),
            Err(CredVaultError::AuthenticationMismatch)
        ));
    }

    #[test]
    fn bad_magic_is_an_authentication_mismatch() {
        let mut blob = cipher().encrypt(b"hello", "pw").unwrap();
        blob[0] = b'X';
        assert!(matches!(
            cipher().decrypt(&blob, "pw"),
            Err(CredVaultError::AuthenticationMismatch)
        ));
    }

    #[test]
    fn too_many_lanes_is_an_authentication_mismatch() {
        let mut blob = cipher().encrypt(b"hello", "pw").unwrap();
        blob[13..17].copy_from_slice(&2000u32.to_le_bytes());
        assert!(matches!(
            cipher().decrypt(&blob, "pw"),
            Err(CredVaultError::AuthenticationMismatch)
        ));
    }

    #[test]
    fn huge_iteration_count_fails_fast() {
        let mut blob = cipher().encrypt(b"hello", "pw").unwrap();
        blob[9..13].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            cipher().decrypt(&blob, "pw"),
            Err(CredVaultError::AuthenticationMismatch)
        ));
    }

    #[test]
    fn absurd_memory_param_is_an_authentication_mismatch() {
        let mut blob = cipher().encrypt(b"hello", "pw").unwrap();
        blob[5..9].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            cipher().decrypt(&blob, "pw"),
            Err(CredVaultError::AuthenticationMismatch)
        ));
    }
}
