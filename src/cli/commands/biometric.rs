//! `credvault biometric`: show or toggle secret-cache unlock.

use crate::cli::output;
use crate::cli::{Cli, Toggle};
use crate::errors::Result;
use crate::manager::VaultManager;

pub async fn execute(cli: &Cli, manager: &VaultManager, state: Option<Toggle>) -> Result<()> {
    let Some(state) = state else {
        let enabled = manager.is_biometric_auth_enabled(&cli.identity)?;
        println!("{}", if enabled { "on" } else { "off" });
        return Ok(());
    };

    let enabled = state == Toggle::On;
    manager
        .set_biometric_auth_enabled(&cli.identity, enabled)
        .await?;

    if enabled {
        output::success("Biometric unlock enabled");
        if cfg!(not(feature = "keyring-store")) {
            output::tip("This build has no OS keyring support; the master password is still prompted.");
        }
    } else {
        output::success("Biometric unlock disabled");
    }
    Ok(())
}
