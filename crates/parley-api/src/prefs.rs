use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use parley_types::api::Claims;
use parley_types::prefs::PreferencesPatch;

use crate::error::{join_status, store_status};
use crate::state::AppState;

pub async fn get_prefs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let user_id = claims.sub.to_string();

    let prefs = tokio::task::spawn_blocking(move || db.get_prefs(&user_id))
        .await
        .map_err(join_status)?
        .map_err(store_status)?;

    Ok(Json(prefs))
}

/// Partial update: flags absent from the body keep their stored value.
/// Responds with the full post-update preference set.
pub async fn update_prefs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(patch): Json<PreferencesPatch>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let user_id = claims.sub.to_string();

    let prefs = tokio::task::spawn_blocking(move || {
        db.upsert_prefs(&user_id, &patch)?;
        db.get_prefs(&user_id)
    })
    .await
    .map_err(join_status)?
    .map_err(store_status)?;

    Ok(Json(prefs))
}
