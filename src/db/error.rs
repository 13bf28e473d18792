//! Errors raised by the metadata store.

use rusqlite::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("an image named {0:?} already exists")]
    DuplicateFilename(String),

    #[error("tag name is empty")]
    EmptyTagName,

    #[error("image {image_id} or tag {tag_id} does not exist")]
    MissingEndpoint { image_id: i64, tag_id: i64 },

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to prepare database location: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// True when the error is a UNIQUE / PRIMARY KEY / FOREIGN KEY violation.
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}
