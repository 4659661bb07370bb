//! Upload command.

use std::path::{Path, PathBuf};

use clap::Args;

use crate::output;
use fieldsync_core::error::AppError;
use fieldsync_core::types::job::CreateJob;
use fieldsync_store::JobStore;

/// Arguments for the upload command
#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Destination folder on the backend (e.g. "scouting/2026-08")
    #[arg(short = 'd', long)]
    pub folder: String,

    /// Files to upload
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Upload immediately instead of enqueuing a background job
    #[arg(long)]
    pub now: bool,
}

fn is_image(path: &Path) -> bool {
    mime_guess::from_path(path)
        .first()
        .is_some_and(|mime| mime.type_() == mime_guess::mime::IMAGE)
}

/// Execute the upload command
pub async fn execute(args: &UploadArgs, env: &str) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let pool = super::create_db_pool(&config).await?;

    for path in &args.files {
        if !path.exists() {
            return Err(AppError::not_found(format!(
                "File not found: {}",
                path.display()
            )));
        }
    }

    if !args.now {
        let store = JobStore::new(pool);
        let job = store
            .create(&CreateJob {
                job_type: "media_upload".to_string(),
                payload: serde_json::json!({
                    "folder": args.folder,
                    "files": args.files,
                }),
                max_attempts: config.worker.max_attempts,
            })
            .await?;
        output::print_success(&format!(
            "Enqueued upload of {} file(s) (job id: {})",
            args.files.len(),
            job.id
        ));
        return Ok(());
    }

    let stack = super::build_uploaders(&config, pool)?;
    let (images, media): (Vec<_>, Vec<_>) =
        args.files.iter().cloned().partition(|p| is_image(p));

    if !images.is_empty() {
        let urls = stack.simple.upload_images(&images, &args.folder).await?;
        for url in urls {
            output::print_success(&format!("Uploaded {}", url));
        }
    }
    for path in &media {
        let url = stack.chunked.upload(path, &args.folder).await?;
        output::print_success(&format!("Uploaded {}", url));
    }
    Ok(())
}
