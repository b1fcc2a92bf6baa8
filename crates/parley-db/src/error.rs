use thiserror::Error;

/// Failures surfaced by the storage core.
///
/// `NotFound` deliberately covers both "no such row" and "row exists but
/// the caller is not a participant/owner", so a non-participant can never
/// confirm that a conversation exists.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("validation: {0}")]
    Validation(String),

    #[error(transparent)]
    Db(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Db(e.into())
    }
}
