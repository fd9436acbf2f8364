//! Database migration commands.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string for the
//!   storefront session store (falls back to `DATABASE_URL`)

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn database_url() -> Result<SecretString, MigrationError> {
    std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("STOREFRONT_DATABASE_URL"))
}

/// Create the `tower_sessions` schema and table used for carts.
///
/// Safe to run repeatedly.
pub async fn sessions() -> Result<(), MigrationError> {
    let _ = dotenvy::dotenv();
    let database_url = database_url()?;

    tracing::info!("Connecting to storefront database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Creating session table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Session migration complete");
    Ok(())
}
