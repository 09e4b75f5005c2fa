use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to load environment variables for database connection: {0}")]
    ConnectionConfigError(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}

#[derive(Error, Debug)]
pub enum FingerprintError {
    #[error("Input cannot be serialized for fingerprinting: {0}")]
    Serialization(#[from] serde_json::Error),
}
