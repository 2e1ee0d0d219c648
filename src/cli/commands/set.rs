//! `credvault set`: add or overwrite a credential.

use std::io::{self, IsTerminal, Read};

use crate::cli::output;
use crate::cli::{caller_app, Cli};
use crate::errors::{CredVaultError, Result};
use crate::generator::PasswordOptions;
use crate::manager::VaultManager;
use crate::vault::{CredentialData, CredentialRecord};

/// Arguments of the `set` command.
pub struct SetArgs<'a> {
    pub key: &'a str,
    pub identifier: Option<&'a str>,
    pub password: Option<&'a str>,
    pub generate: bool,
    pub length: usize,
    pub name: Option<&'a str>,
}

/// Execute the `set` command.
pub async fn execute(cli: &Cli, manager: &VaultManager, args: SetArgs<'_>) -> Result<()> {
    let key = args.key;

    // Determine the secret from one of four sources.
    let secret = if args.generate {
        manager.generate_random_password(&PasswordOptions {
            length: args.length,
        })
    } else if let Some(v) = args.password {
        output::warning("Value provided on command line; it may appear in shell history.");
        v.to_string()
    } else if !io::stdin().is_terminal() {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf.trim_end().to_string()
    } else {
        dialoguer::Password::new()
            .with_prompt(format!("Enter password for {key}"))
            .interact()
            .map_err(|e| CredVaultError::CommandFailed(format!("input prompt: {e}")))?
    };

    let data = match args.identifier {
        Some(identifier) => CredentialData::account(identifier, secret),
        None => CredentialData::generic(secret),
    };
    let mut record = CredentialRecord::new(key, data);
    if let Some(name) = args.name {
        record = record.with_display_name(name);
    }

    manager
        .set_credential(key, record, &cli.identity, caller_app(cli, manager))
        .await?;

    output::success(&format!("Credential '{key}' stored for {}", cli.identity));
    if args.generate {
        output::tip(&format!("Run `credvault get {key}` to see the generated password."));
    }

    Ok(())
}
