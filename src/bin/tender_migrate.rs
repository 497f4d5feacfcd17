//! Applies pending schema migrations and prepares the upload directory.
//!
//! Usage:
//!
//! ```text
//! TENDER_DATABASE_URL=postgres://... tender-migrate
//! ```
//!
//! Variables are read from the environment, after loading a `.env` file when
//! one is present. See [`tender::config::Config::from_env`] for the full list.

use std::process::ExitCode;
use tender::config::Config;
use tender::marketplace::{
    adapters::{
        fs::CapStdBlobStore,
        postgres::{DatabasePool, apply_migrations},
    },
    ports::RepositoryError,
};
use tracing::{error, info};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    let env_file = dotenvy::dotenv().ok();
    if let Err(err) = tender::telemetry::init_tracing() {
        error!(error = %err, "tracing already initialised");
    }
    if let Some(path) = env_file {
        info!(path = %path.display(), "loaded environment file");
    }
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "migration failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), BoxError> {
    let config = Config::from_env()?;
    info!(
        upload_root = %config.upload_root,
        pool_size = config.db_pool_size,
        "configuration loaded"
    );

    let store = CapStdBlobStore::open(config.upload_root.clone())?;
    info!(root = %store.root(), "upload directory ready");

    let pool = DatabasePool::open(&config.database_url, config.db_pool_size)?;
    let applied = pool
        .run(|connection| apply_migrations(connection).map_err(RepositoryError::persistence))
        .await;
    pool.close();
    let versions = applied?;
    if versions.is_empty() {
        info!("schema is up to date");
    } else {
        info!(count = versions.len(), "migrations applied");
    }
    Ok(())
}
