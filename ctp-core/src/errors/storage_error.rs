//! Relational-store errors.

use super::error_code::{self, CtpErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sqlite error: {message}")]
    Sqlite { message: String },

    #[error("migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("database busy (another operation in progress)")]
    DbBusy,

    #[error("database corrupt: {details}")]
    DbCorrupt { details: String },

    #[error("disk full")]
    DiskFull,

    #[error("connection pool exhausted: {active} active connections")]
    ConnectionPoolExhausted { active: usize },

    #[error("row not found: {what}")]
    NotFound { what: String },

    #[error("constraint violated: {0}")]
    Constraint(String),
}

impl CtpErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DbBusy => error_code::DB_BUSY,
            Self::DbCorrupt { .. } => error_code::DB_CORRUPT,
            Self::DiskFull => error_code::DISK_FULL,
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            _ => error_code::STORAGE_ERROR,
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::DatabaseBusy =>
            {
                Self::DbBusy
            }
            rusqlite::Error::QueryReturnedNoRows => Self::NotFound {
                what: "query returned no rows".to_string(),
            },
            other => Self::Sqlite {
                message: other.to_string(),
            },
        }
    }
}
