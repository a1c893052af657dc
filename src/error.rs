use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures raised by the persistence layer. The engine never recovers from
/// these: it hands them to the caller and leaves session state untouched.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored data is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported schema version {found} in {file} (expected {expected})")]
    SchemaVersion {
        file: String,
        found: u32,
        expected: u32,
    },

    #[error("book not found: {0}")]
    BookNotFound(String),

    #[error("word {rank} not found in book {book}")]
    WordNotFound { book: String, rank: u32 },

    #[error("unknown achievement: {0}")]
    UnknownAchievement(String),
}
