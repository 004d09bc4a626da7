use crate::auth::CACHE_KEY;
use crate::binding::constraint::{Constraint, ConstraintSet, PatternRule};
use crate::binding::missing_arguments;
use crate::cli::ProcessCommand;
use crate::context::{Context, CredentialsConfig};
use crate::error::{Error, ExitStatus, Result};
use crate::prompt::ask_until_valid;
use async_trait::async_trait;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::fmt::Debug;

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub subcommand: AuthCommands,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommands {
    /// Register an API key and secret.
    Login(LoginArgs),
    /// Remove stored credentials and the cached token.
    Logout,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// API key.
    #[arg(long)]
    pub key: Option<String>,

    /// API secret.
    #[arg(long)]
    pub secret: Option<String>,
}

fn credential_constraints() -> Result<ConstraintSet> {
    Ok(ConstraintSet::new()
        .with(Constraint::NotBlank)
        .with(Constraint::Length {
            min: Some(10),
            max: None,
        })
        .with(Constraint::Pattern(PatternRule::new(
            r"^\S+$",
            "The value may not contain spaces",
        )?)))
}

fn obtain(context: &Context, label: &str, given: Option<&str>) -> Result<String> {
    let constraints = credential_constraints()?;
    match given {
        Some(value) => {
            constraints
                .validate(value)
                .map_err(|message| Error::ValidationError(format!("{}: {}", label, message)))?;
            Ok(value.to_string())
        }
        None if context.is_interactive() => ask_until_valid(
            context.prompter(),
            &format!("Please enter your API {}", label),
            None,
            &constraints,
        ),
        None => Err(missing_arguments(&[label.to_lowercase()])),
    }
}

#[async_trait]
impl ProcessCommand for AuthCommands {
    async fn process_command(&self, context: &Context) -> Result<ExitStatus> {
        let config_path = context.config_path();
        let mut config = context.config().clone();

        match self {
            AuthCommands::Login(args) => {
                let key = obtain(context, "Key", args.key.as_deref())?;
                let secret = obtain(context, "Secret", args.secret.as_deref())?;
                config.credentials = CredentialsConfig {
                    key: Some(key),
                    secret: Some(secret),
                    refresh_token: None,
                };
                config.save(&config_path)?;
                context.token_cache().clear(CACHE_KEY).await?;
                tracing::info!(path = %config_path.display(), "Saved credentials");

                println!(
                    "{} Saved credentials to {}",
                    "[OK]".green().bold(),
                    config_path.display()
                );
            }
            AuthCommands::Logout => {
                config.credentials = CredentialsConfig::default();
                config.save(&config_path)?;
                context.token_cache().clear(CACHE_KEY).await?;
                tracing::info!(path = %config_path.display(), "Removed credentials");

                println!("{} Removed stored credentials.", "[OK]".green().bold());
            }
        }

        Ok(ExitStatus::Success)
    }
}
