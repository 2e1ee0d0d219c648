//! `credvault unlock-mode`: show or set how long an unlock lasts.

use crate::cli::output;
use crate::cli::{Cli, UnlockModeArg};
use crate::errors::Result;
use crate::manager::VaultManager;
use crate::policy::UnlockMode;

pub async fn execute(cli: &Cli, manager: &VaultManager, mode: Option<UnlockModeArg>) -> Result<()> {
    let Some(mode) = mode else {
        let current = match manager.unlock_mode(&cli.identity)? {
            UnlockMode::UnlockForAWhile => "for-a-while",
            UnlockMode::UnlockEveryTime => "every-time",
        };
        println!("{current}");
        return Ok(());
    };

    manager.set_unlock_mode(&cli.identity, mode.into()).await?;
    output::success("Unlock mode updated");
    Ok(())
}
