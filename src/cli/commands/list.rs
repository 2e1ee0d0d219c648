//! `credvault list`: show the credentials the calling app may see.

use crate::cli::output;
use crate::cli::{caller_app, Cli};
use crate::errors::Result;
use crate::manager::VaultManager;

/// Execute the `list` command.
pub async fn execute(cli: &Cli, manager: &VaultManager) -> Result<()> {
    let records = manager
        .list_credentials(&cli.identity, caller_app(cli, manager))
        .await?;
    output::print_records_table(&records);
    Ok(())
}
