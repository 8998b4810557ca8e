/// Storage-layer errors for SQLite operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("migration failed at version {version}: {reason}")]
    MigrationFailed { version: u32, reason: String },

    #[error("unknown cache table: {table}")]
    UnknownTable { table: String },

    #[error("record for table '{table}' is missing key field '{key_field}'")]
    MissingKey { table: String, key_field: String },
}
