//! `credvault generate`: print a random password.

use crate::errors::Result;
use crate::generator::{generate_random_password, PasswordOptions};

pub fn execute(length: usize) -> Result<()> {
    println!("{}", generate_random_password(&PasswordOptions { length }));
    Ok(())
}
