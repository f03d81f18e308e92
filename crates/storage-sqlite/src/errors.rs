//! Error types for the storage crate.

use thiserror::Error;

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur while opening the cache database.
///
/// Reads and writes after a successful open never surface errors; they are
/// logged and swallowed so the engine degrades to in-memory behavior.
#[derive(Debug, Error)]
pub enum StorageError {
    /// SQLite error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
