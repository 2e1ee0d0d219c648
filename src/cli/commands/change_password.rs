//! `credvault change-password`: re-encrypt the vault under a new master
//! password.

use crate::cli::output;
use crate::cli::{caller_app, Cli};
use crate::errors::Result;
use crate::manager::VaultManager;

pub async fn execute(cli: &Cli, manager: &VaultManager) -> Result<()> {
    manager
        .change_master_password(&cli.identity, caller_app(cli, manager))
        .await?;

    output::success(&format!("Master password of {} changed", cli.identity));
    output::tip("Biometric unlock was turned off; it is offered again at the next unlock.");
    Ok(())
}
