//! `credvault status`: show session and policy state of an identity.

use console::style;

use crate::cli::Cli;
use crate::errors::Result;
use crate::manager::VaultManager;
use crate::policy::UnlockMode;
use crate::session::SessionStatus;

/// Execute the `status` command.
pub async fn execute(cli: &Cli, manager: &VaultManager) -> Result<()> {
    let identity = &cli.identity;
    let exists = manager.vault_exists(identity);

    let session = match manager.session_status(identity).await? {
        SessionStatus::Locked => style("locked").yellow().to_string(),
        SessionStatus::PromptPending => style("waiting for master password").cyan().to_string(),
        SessionStatus::Unlocked { opened_at } => style(format!(
            "unlocked since {}",
            opened_at.format("%Y-%m-%d %H:%M:%S")
        ))
        .green()
        .to_string(),
    };
    let mode = match manager.unlock_mode(identity)? {
        UnlockMode::UnlockForAWhile => format!(
            "for a while ({} min)",
            manager.settings().session_timeout_secs / 60
        ),
        UnlockMode::UnlockEveryTime => "every time".to_string(),
    };
    let biometric = if manager.is_biometric_auth_enabled(identity)? {
        "on"
    } else {
        "off"
    };

    println!("{:<12} {}", style("Identity").bold(), identity);
    println!("{:<12} {}", style("Data dir").bold(), manager.settings().data_dir);
    println!("{:<12} {}", style("Vault").bold(), if exists { "present" } else { "none" });
    println!("{:<12} {}", style("Session").bold(), session);
    println!("{:<12} {}", style("Unlock").bold(), mode);
    println!("{:<12} {}", style("Biometric").bold(), biometric);

    Ok(())
}
