//! Logout command.

use crate::output;
use fieldsync_core::error::AppError;

/// Execute the logout command
pub async fn execute(env: &str) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let pool = super::create_db_pool(&config).await?;
    let gateway = super::build_gateway(&config, pool)?;

    gateway.logout().await?;
    output::print_success("Logged out");
    Ok(())
}
