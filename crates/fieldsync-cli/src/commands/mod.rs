//! CLI command definitions and dispatch.

pub mod abort;
pub mod jobs;
pub mod login;
pub mod logout;
pub mod migrate;
pub mod upload;
pub mod worker;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use sqlx::SqlitePool;

use crate::output::OutputFormat;
use fieldsync_auth::{AuthGateway, AuthedClient};
use fieldsync_core::config::AppConfig;
use fieldsync_core::error::AppError;
use fieldsync_store::{DatabasePool, SqlitePartStore, SqliteTokenStore};
use fieldsync_upload::{
    ChunkedUploader, HttpObjectTransport, PresignedUrlClient, SimpleUploader,
};

/// FieldSync — field-operations media upload agent
#[derive(Debug, Parser)]
#[command(name = "fieldsync", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment (merges config/default.toml with
    /// config/<env>.toml)
    #[arg(short, long, default_value = "default")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Log in to the FieldSync backend
    Login(login::LoginArgs),
    /// Log out and discard stored credentials
    Logout,
    /// Upload media files (enqueue, or run immediately with --now)
    Upload(upload::UploadArgs),
    /// Abandon an in-progress chunked upload
    Abort(abort::AbortArgs),
    /// Inspect and manage background jobs
    Jobs(jobs::JobsArgs),
    /// Run the background worker loop
    Worker(worker::WorkerArgs),
    /// Database migration management
    Migrate(migrate::MigrateArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Login(args) => login::execute(args, &self.env).await,
            Commands::Logout => logout::execute(&self.env).await,
            Commands::Upload(args) => upload::execute(args, &self.env).await,
            Commands::Abort(args) => abort::execute(args, &self.env).await,
            Commands::Jobs(args) => jobs::execute(args, &self.env, self.format).await,
            Commands::Worker(args) => worker::execute(args, &self.env).await,
            Commands::Migrate(args) => migrate::execute(args, &self.env).await,
        }
    }
}

/// Helper: load configuration for the selected environment
pub fn load_config(env: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(env)
}

/// Helper: open the sqlite pool from config
pub async fn create_db_pool(config: &AppConfig) -> Result<SqlitePool, AppError> {
    let pool = DatabasePool::connect(&config.database).await?;
    Ok(pool.into_pool())
}

/// Helper: HTTP client with the configured uniform timeout
pub fn http_client(config: &AppConfig) -> Result<reqwest::Client, AppError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(config.api.timeout_seconds))
        .build()?)
}

/// Helper: auth gateway over the durable token store
pub fn build_gateway(config: &AppConfig, pool: SqlitePool) -> Result<Arc<AuthGateway>, AppError> {
    let store = Arc::new(SqliteTokenStore::new(pool));
    Ok(Arc::new(AuthGateway::new(
        http_client(config)?,
        config.api.clone(),
        store,
    )))
}

/// The fully wired upload pipeline.
pub struct UploadStack {
    pub chunked: Arc<ChunkedUploader>,
    pub simple: Arc<SimpleUploader>,
    pub gateway: Arc<AuthGateway>,
}

/// Helper: build both uploaders over one authenticated client
pub fn build_uploaders(config: &AppConfig, pool: SqlitePool) -> Result<UploadStack, AppError> {
    let gateway = build_gateway(config, pool.clone())?;
    let authed = AuthedClient::new(http_client(config)?, Arc::clone(&gateway));
    let api = Arc::new(PresignedUrlClient::new(authed, config.api.clone()));
    let transport = Arc::new(HttpObjectTransport::new(http_client(config)?));
    let parts = Arc::new(SqlitePartStore::new(pool));

    Ok(UploadStack {
        chunked: Arc::new(ChunkedUploader::new(
            api.clone(),
            transport.clone(),
            parts,
            &config.upload,
        )),
        simple: Arc::new(SimpleUploader::new(api, transport, &config.upload)),
        gateway,
    })
}
