//! Random password generation.

use rand::Rng;

/// Characters a generated password is drawn from.
const ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()_-+=<>?/{}~|";

/// Length used when the caller does not ask for one.
pub const DEFAULT_LENGTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordOptions {
    pub length: usize,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
        }
    }
}

/// Generate a password of `options.length` characters (at least one) using
/// the thread-local OS-seeded RNG.
pub fn generate_random_password(options: &PasswordOptions) -> String {
    let length = options.length.max(1);
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect()
}
