//! Abort command.

use clap::Args;

use crate::output;
use fieldsync_core::error::AppError;

/// Arguments for the abort command
#[derive(Debug, Args)]
pub struct AbortArgs {
    /// Destination folder of the interrupted upload
    #[arg(short = 'd', long)]
    pub folder: String,

    /// File name of the interrupted upload
    pub file_name: String,
}

/// Execute the abort command
pub async fn execute(args: &AbortArgs, env: &str) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let pool = super::create_db_pool(&config).await?;
    let stack = super::build_uploaders(&config, pool)?;

    stack.chunked.abort(&args.file_name, &args.folder).await?;
    output::print_success(&format!(
        "Aborted upload of '{}/{}'",
        args.folder, args.file_name
    ));
    Ok(())
}
