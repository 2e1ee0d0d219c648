//! `credvault lock`: drop the unlocked session.

use crate::cli::output;
use crate::cli::Cli;
use crate::errors::Result;
use crate::manager::VaultManager;

pub async fn execute(cli: &Cli, manager: &VaultManager) -> Result<()> {
    manager.lock_vault(&cli.identity).await;
    output::success(&format!("Vault of {} locked", cli.identity));
    Ok(())
}
