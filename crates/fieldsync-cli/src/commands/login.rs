//! Login command.

use clap::Args;

use crate::output;
use fieldsync_core::error::AppError;

/// Arguments for the login command
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email
    pub email: String,

    /// Password (prompted interactively when omitted)
    #[arg(long)]
    pub password: Option<String>,
}

/// Execute the login command
pub async fn execute(args: &LoginArgs, env: &str) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let pool = super::create_db_pool(&config).await?;
    let gateway = super::build_gateway(&config, pool)?;

    let password = match &args.password {
        Some(password) => password.clone(),
        None => dialoguer::Password::new()
            .with_prompt("Password")
            .interact()
            .map_err(|e| AppError::validation(format!("Password prompt failed: {e}")))?,
    };

    let pair = gateway.login(&args.email, &password).await?;

    output::print_success(&format!("Logged in as {}", pair.email));
    output::print_kv("Name", &pair.name);
    output::print_kv("Role", &pair.role);
    Ok(())
}
