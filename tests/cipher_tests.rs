//! Integration tests for the password-based blob cipher.

use credvault::crypto::{Argon2Params, PasswordCipher};
use credvault::CredVaultError;

/// Cheapest parameters the KDF accepts, so tests stay fast.
fn cipher() -> PasswordCipher {
    PasswordCipher::new(Argon2Params {
        memory_kib: 8192,
        iterations: 1,
        parallelism: 1,
    })
}

#[test]
fn roundtrip_with_same_password() {
    let plaintext = br#"{"version":1,"records":{}}"#;
    let blob = cipher().encrypt(plaintext, "correct horse").unwrap();

    assert_ne!(&blob[..], &plaintext[..]);
    assert_eq!(cipher().decrypt(&blob, "correct horse").unwrap(), plaintext);
}

#[test]
fn roundtrip_empty_plaintext() {
    let blob = cipher().encrypt(b"", "pw").unwrap();
    assert!(cipher().decrypt(&blob, "pw").unwrap().is_empty());
}

#[test]
fn wrong_password_is_authentication_mismatch() {
    let blob = cipher().encrypt(b"secret records", "password-one").unwrap();
    let err = cipher().decrypt(&blob, "password-two").unwrap_err();
    assert!(matches!(err, CredVaultError::AuthenticationMismatch));
}

#[test]
fn same_input_encrypts_differently_each_time() {
    let a = cipher().encrypt(b"same", "pw").unwrap();
    let b = cipher().encrypt(b"same", "pw").unwrap();
    assert_ne!(a, b, "fresh salt and nonce per blob");
}

#[test]
fn blob_starts_with_magic() {
    let blob = cipher().encrypt(b"x", "pw").unwrap();
    assert_eq!(&blob[..4], b"CVLT");
}

#[test]
fn truncated_blob_is_authentication_mismatch() {
    let blob = cipher().encrypt(b"some data", "pw").unwrap();
    for len in [0, 3, 20, blob.len() - 1] {
        let err = cipher().decrypt(&blob[..len], "pw").unwrap_err();
        assert!(
            matches!(err, CredVaultError::AuthenticationMismatch),
            "length {len}"
        );
    }
}

#[test]
fn flipped_ciphertext_byte_is_detected() {
    let mut blob = cipher().encrypt(b"some data", "pw").unwrap();
    let last = blob.len() - 1;
    blob[last] ^= 0x01;
    assert!(matches!(
        cipher().decrypt(&blob, "pw"),
        Err(CredVaultError::AuthenticationMismatch)
    ));
}

#[test]
fn tampered_kdf_params_are_detected() {
    let mut blob = cipher().encrypt(b"some data", "pw").unwrap();
    // iterations field: 1 -> 2
    blob[9] = 2;
    assert!(matches!(
        cipher().decrypt(&blob, "pw"),
        Err(CredVaultError::AuthenticationMismatch)
    ));
}

#[test]
fn decrypt_uses_params_recorded_in_blob() {
    let stronger = PasswordCipher::new(Argon2Params {
        memory_kib: 16384,
        iterations: 2,
        parallelism: 1,
    });
    let blob = stronger.encrypt(b"written with other settings", "pw").unwrap();
    assert_eq!(
        cipher().decrypt(&blob, "pw").unwrap(),
        b"written with other settings"
    );
}
