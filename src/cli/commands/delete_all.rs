//! `credvault delete-all`: irrecoverably delete an identity's vault.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::Cli;
use crate::errors::{CredVaultError, Result};
use crate::manager::VaultManager;

pub async fn execute(cli: &Cli, manager: &VaultManager, force: bool) -> Result<()> {
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete ALL credentials of {}? This cannot be undone",
                cli.identity
            ))
            .default(false)
            .interact()
            .map_err(|e| CredVaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    if manager.delete_all_credentials(&cli.identity).await? {
        output::success(&format!("All credentials of {} deleted", cli.identity));
    } else {
        output::info(&format!("{} has no vault.", cli.identity));
    }
    Ok(())
}
