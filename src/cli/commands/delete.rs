//! `credvault delete`: remove a credential from the vault.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{caller_app, Cli};
use crate::errors::{CredVaultError, Result};
use crate::manager::VaultManager;

/// Execute the `delete` command.
pub async fn execute(
    cli: &Cli,
    manager: &VaultManager,
    key: &str,
    target: Option<&str>,
    force: bool,
) -> Result<()> {
    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete credential '{key}'?"))
            .default(false)
            .interact()
            .map_err(|e| CredVaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let app = caller_app(cli, manager);
    let target = target.unwrap_or(app);

    if manager
        .delete_credential(key, &cli.identity, app, target)
        .await?
    {
        output::success(&format!("Deleted credential '{key}'"));
    } else {
        output::info(&format!("No credential named '{key}', nothing deleted."));
    }

    Ok(())
}
