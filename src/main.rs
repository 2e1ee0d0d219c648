use clap::Parser;
use tracing_subscriber::EnvFilter;

use credvault::cli::commands::set::SetArgs;
use credvault::cli::{build_manager, commands, output, Cli, Commands};
use credvault::errors::Result;
use credvault::Outcome;

/// Env var holding the log filter (e.g. `credvault=debug`).
const LOG_ENV: &str = "CREDVAULT_LOG";

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    match Outcome::from(run(&cli).await) {
        Outcome::Success(()) => {}
        Outcome::Cancelled => output::info("Operation cancelled"),
        Outcome::Error(message) => {
            output::error(&message);
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: &Cli) -> Result<()> {
    // Needs no vault, so no settings either.
    if let Commands::Generate { length } = cli.command {
        return commands::generate::execute(length);
    }

    let manager = build_manager(cli)?;

    match cli.command {
        Commands::Set {
            ref key,
            ref identifier,
            ref password,
            generate,
            length,
            ref name,
        } => {
            let args = SetArgs {
                key,
                identifier: identifier.as_deref(),
                password: password.as_deref(),
                generate,
                length,
                name: name.as_deref(),
            };
            commands::set::execute(cli, &manager, args).await
        }
        Commands::Get {
            ref key,
            no_prompt,
            force_prompt,
        } => commands::get::execute(cli, &manager, key, no_prompt, force_prompt).await,
        Commands::List => commands::list::execute(cli, &manager).await,
        Commands::Delete {
            ref key,
            ref target,
            force,
        } => commands::delete::execute(cli, &manager, key, target.as_deref(), force).await,
        Commands::ChangePassword => commands::change_password::execute(cli, &manager).await,
        Commands::Lock => commands::lock::execute(cli, &manager).await,
        Commands::DeleteAll { force } => commands::delete_all::execute(cli, &manager, force).await,
        Commands::UnlockMode { mode } => commands::unlock_mode::execute(cli, &manager, mode).await,
        Commands::Biometric { state } => commands::biometric::execute(cli, &manager, state).await,
        Commands::Status => commands::status::execute(cli, &manager).await,
        Commands::Generate { .. } => Ok(()),
    }
}
