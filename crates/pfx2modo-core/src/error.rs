use thiserror::Error;

/// Core error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown connection '{0}', declare it under [connections] in the settings file")]
    UnknownConnection(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Creator account '{0}' does not exist in the destination, create it first")]
    CreatorNotFound(String),

    #[error("Group '{0}' does not exist in the destination, create it first")]
    GroupNotFound(String),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

/// Result type alias using MigrateError.
pub type Result<T> = std::result::Result<T, MigrateError>;
