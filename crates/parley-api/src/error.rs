use axum::http::StatusCode;
use parley_db::StoreError;
use tracing::error;

/// Map store failures onto HTTP statuses. `NotFound` already folds
/// "exists but not yours" into "missing", so 404 leaks nothing.
pub fn store_status(e: StoreError) -> StatusCode {
    match e {
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::Validation(_) => StatusCode::BAD_REQUEST,
        StoreError::Db(e) => {
            error!("store error: {e:#}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Map a `spawn_blocking` join failure.
pub fn join_status(e: tokio::task::JoinError) -> StatusCode {
    error!("spawn_blocking join error: {}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}
