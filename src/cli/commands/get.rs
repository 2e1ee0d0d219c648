//! `credvault get`: show a single credential.

use crate::cli::output;
use crate::cli::{caller_app, Cli};
use crate::errors::Result;
use crate::manager::{GetOptions, VaultManager};

/// Execute the `get` command.
pub async fn execute(
    cli: &Cli,
    manager: &VaultManager,
    key: &str,
    no_prompt: bool,
    force_prompt: bool,
) -> Result<()> {
    let options = GetOptions {
        prompt_if_locked: !no_prompt,
        force_master_password_prompt: force_prompt,
    };

    match manager
        .get_credential(key, &cli.identity, caller_app(cli, manager), options)
        .await?
    {
        Some(record) => output::print_record(&record),
        None => output::info(&format!("No credential named '{key}'.")),
    }

    Ok(())
}
