//! Terminal master password prompter.
//!
//! Passwords come from, in order:
//! 1. `CREDVAULT_PASSWORD` env var (CI/CD), tried once and never retried
//! 2. Interactive `dialoguer` prompt
//!
//! For `change-password`, the new password may come from
//! `CREDVAULT_NEW_PASSWORD`.

use async_trait::async_trait;
use dialoguer::{Confirm, Password};
use tracing::warn;

use crate::cli::output;
use crate::crypto::MasterPassword;
use crate::session::{
    CreationPurpose, CreationRequest, MasterPasswordPrompter, PromptRequest, PromptResponse,
};

/// Minimum password length to prevent trivially weak passwords.
const MIN_PASSWORD_LEN: usize = 8;

/// Env var holding the current master password.
pub const PASSWORD_ENV: &str = "CREDVAULT_PASSWORD";

/// Env var holding the replacement master password for `change-password`.
pub const NEW_PASSWORD_ENV: &str = "CREDVAULT_NEW_PASSWORD";

#[derive(Debug, Default)]
pub struct DialoguerPrompter {
    env_password: Option<MasterPassword>,
    env_new_password: Option<MasterPassword>,
}

impl DialoguerPrompter {
    pub fn from_env() -> Self {
        Self {
            env_password: non_empty_env(PASSWORD_ENV),
            env_new_password: non_empty_env(NEW_PASSWORD_ENV),
        }
    }
}

fn non_empty_env(name: &str) -> Option<MasterPassword> {
    std::env::var(name)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(MasterPassword::from)
}

#[async_trait]
impl MasterPasswordPrompter for DialoguerPrompter {
    async fn prompt_master_password(&self, request: PromptRequest) -> PromptResponse {
        if let Some(password) = &self.env_password {
            if request.is_retry {
                return PromptResponse::Failed(format!(
                    "{PASSWORD_ENV} does not unlock the vault"
                ));
            }
            return PromptResponse::Password {
                password: password.clone(),
                save_to_secret_cache: false,
            };
        }

        tokio::task::spawn_blocking(move || ask_master_password(&request))
            .await
            .unwrap_or_else(|e| PromptResponse::Failed(e.to_string()))
    }

    async fn create_master_password(&self, request: CreationRequest) -> Option<MasterPassword> {
        let from_env = match request.purpose {
            CreationPurpose::Create => self.env_password.clone(),
            CreationPurpose::Change => self.env_new_password.clone(),
        };
        if let Some(password) = from_env {
            if password.expose().chars().count() < MIN_PASSWORD_LEN {
                output::warning(&format!(
                    "Master password must be at least {MIN_PASSWORD_LEN} characters."
                ));
                return None;
            }
            return Some(password);
        }

        match tokio::task::spawn_blocking(move || ask_new_password(&request)).await {
            Ok(password) => password,
            Err(e) => {
                warn!(error = %e, "password prompt task failed");
                None
            }
        }
    }
}

/// An empty answer cancels.
fn ask_master_password(request: &PromptRequest) -> PromptResponse {
    if request.is_retry {
        output::warning("Wrong master password, try again.");
    }

    let password = match Password::new()
        .with_prompt(format!("Master password for {}", request.identity))
        .allow_empty_password(true)
        .interact()
    {
        Ok(p) if p.is_empty() => return PromptResponse::Cancelled,
        Ok(p) => MasterPassword::from(p),
        Err(e) => return PromptResponse::Failed(format!("password prompt: {e}")),
    };

    let save_to_secret_cache = request.secret_cache_available
        && !request.biometric_enabled
        && Confirm::new()
            .with_prompt("Remember the master password in the OS keyring?")
            .default(false)
            .interact()
            .unwrap_or(false);

    PromptResponse::Password {
        password,
        save_to_secret_cache,
    }
}

fn ask_new_password(request: &CreationRequest) -> Option<MasterPassword> {
    let prompt = match request.purpose {
        CreationPurpose::Create => {
            output::info(&format!("Creating a vault for {}.", request.identity));
            "Choose master password"
        }
        CreationPurpose::Change => "New master password",
    };

    loop {
        let password = match Password::new()
            .with_prompt(prompt)
            .with_confirmation("Confirm master password", "Passwords do not match, try again")
            .allow_empty_password(true)
            .interact()
        {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "password prompt failed");
                return None;
            }
        };

        if password.is_empty() {
            return None;
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Some(MasterPassword::from(password));
    }
}
