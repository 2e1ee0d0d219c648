//! CLI module: Clap argument parser, output helpers, the terminal prompter,
//! and command implementations.

pub mod commands;
pub mod output;
pub mod prompter;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use crate::config::Settings;
use crate::errors::Result;
use crate::manager::VaultManager;
use crate::policy::UnlockMode;
use crate::session::SecretCache;

use self::prompter::DialoguerPrompter;

/// CredVault CLI: per-identity encrypted credential vault.
#[derive(Parser)]
#[command(
    name = "credvault",
    about = "Per-identity encrypted credential vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Identity that owns the vault (e.g. a DID)
    #[arg(short, long, default_value = "default", env = "CREDVAULT_IDENTITY", global = true)]
    pub identity: String,

    /// Application id to act as (default: the privileged manager app)
    #[arg(short, long, global = true)]
    pub app: Option<String>,

    /// Data directory (overrides `data_dir` in .credvault.toml)
    #[arg(long, global = true)]
    pub data_dir: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Store a credential (add or overwrite)
    Set {
        /// Credential key (e.g. github.com)
        key: String,
        /// Login name; stores an account credential instead of a bare secret
        #[arg(short = 'u', long)]
        identifier: Option<String>,
        /// Secret value (omit for interactive prompt)
        #[arg(short, long)]
        password: Option<String>,
        /// Generate a random password instead of asking for one
        #[arg(short, long, conflicts_with = "password")]
        generate: bool,
        /// Length of the generated password
        #[arg(long, default_value = "16", requires = "generate")]
        length: usize,
        /// Human-readable label
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Show a credential
    Get {
        /// Credential key
        key: String,
        /// Fail instead of prompting when the vault is locked
        #[arg(long)]
        no_prompt: bool,
        /// Ask for the master password even if unlocked
        #[arg(long, conflicts_with = "no_prompt")]
        force_prompt: bool,
    },

    /// List credentials visible to the calling app
    List,

    /// Delete a credential
    Delete {
        /// Credential key
        key: String,
        /// Application whose record to delete (privileged app only)
        #[arg(long)]
        target: Option<String>,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Change the master password
    ChangePassword,

    /// Lock the vault
    Lock,

    /// Irrecoverably delete every credential of the identity
    DeleteAll {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Show or set how long an unlock lasts
    UnlockMode {
        /// New mode (omit to show the current one)
        #[arg(value_enum)]
        mode: Option<UnlockModeArg>,
    },

    /// Show or toggle biometric (secret cache) unlock
    Biometric {
        /// New state (omit to show the current one)
        #[arg(value_enum)]
        state: Option<Toggle>,
    },

    /// Generate a random password
    Generate {
        /// Password length
        #[arg(short, long, default_value = "8")]
        length: usize,
    },

    /// Show the session state of the identity
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum UnlockModeArg {
    /// Stay unlocked for the session timeout
    ForAWhile,
    /// Ask for the master password on every operation
    EveryTime,
}

impl From<UnlockModeArg> for UnlockMode {
    fn from(arg: UnlockModeArg) -> Self {
        match arg {
            UnlockModeArg::ForAWhile => UnlockMode::UnlockForAWhile,
            UnlockModeArg::EveryTime => UnlockMode::UnlockEveryTime,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load `.credvault.toml` from the working directory and apply CLI
/// overrides. The data directory is resolved to an absolute path.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    let mut settings = Settings::load(&cwd)?;
    if let Some(dir) = &cli.data_dir {
        settings.data_dir.clone_from(dir);
    }
    let data_path: PathBuf = settings.data_path(&cwd);
    settings.data_dir = data_path.to_string_lossy().into_owned();
    Ok(settings)
}

/// Build the vault manager with the terminal prompter and, when compiled
/// with `keyring-store`, the OS keyring as secret cache.
pub fn build_manager(cli: &Cli) -> Result<VaultManager> {
    let settings = load_settings(cli)?;
    Ok(VaultManager::new(
        settings,
        Arc::new(DialoguerPrompter::from_env()),
        secret_cache(),
    ))
}

#[cfg(feature = "keyring-store")]
fn secret_cache() -> Arc<dyn SecretCache> {
    Arc::new(crate::keyring::KeyringSecretCache)
}

#[cfg(not(feature = "keyring-store"))]
fn secret_cache() -> Arc<dyn SecretCache> {
    Arc::new(crate::session::NoSecretCache)
}

/// The application id to act as.
pub fn caller_app<'a>(cli: &'a Cli, manager: &'a VaultManager) -> &'a str {
    cli.app
        .as_deref()
        .unwrap_or(&manager.settings().privileged_app)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "credvault", "get", "site1", "--identity", "did:example:1", "--app", "app1",
        ])
        .unwrap();
        assert_eq!(cli.identity, "did:example:1");
        assert_eq!(cli.app.as_deref(), Some("app1"));
        assert!(matches!(cli.command, Commands::Get { ref key, .. } if key == "site1"));
    }

    #[test]
    fn unlock_mode_values_map_to_policy() {
        let cli = Cli::try_parse_from(["credvault", "unlock-mode", "every-time"]).unwrap();
        match cli.command {
            Commands::UnlockMode { mode: Some(mode) } => {
                assert_eq!(UnlockMode::from(mode), UnlockMode::UnlockEveryTime);
            }
            _ => panic!("expected unlock-mode"),
        }
    }

    #[test]
    fn generate_and_password_conflict() {
        let result =
            Cli::try_parse_from(["credvault", "set", "k", "--password", "x", "--generate"]);
        assert!(result.is_err());
    }
}
