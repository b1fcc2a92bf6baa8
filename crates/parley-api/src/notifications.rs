use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use parley_types::api::{Claims, UnreadCountResponse};

use crate::convert::notification_response;
use crate::error::{join_status, store_status};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    100
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let user_id = claims.sub.to_string();
    let limit = query.limit.clamp(1, 500);

    let rows = tokio::task::spawn_blocking(move || db.list_notifications_for_user(&user_id, limit))
        .await
        .map_err(join_status)?
        .map_err(store_status)?;

    let notifications: Vec<_> = rows.iter().map(notification_response).collect();
    Ok(Json(notifications))
}

/// Lenient: marking a missing or foreign notification returns 200 with
/// nothing done, keeping retry-happy UIs simple.
pub async fn mark_read(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let nid = notification_id.to_string();
    let user_id = claims.sub.to_string();

    tokio::task::spawn_blocking(move || db.mark_notification_read(&nid, &user_id))
        .await
        .map_err(join_status)?
        .map_err(store_status)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let user_id = claims.sub.to_string();

    let marked = tokio::task::spawn_blocking(move || db.mark_all_notifications_read(&user_id))
        .await
        .map_err(join_status)?
        .map_err(store_status)?;

    Ok(Json(serde_json::json!({ "marked": marked })))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let user_id = claims.sub.to_string();

    let count = tokio::task::spawn_blocking(move || db.unread_notification_count(&user_id))
        .await
        .map_err(join_status)?
        .map_err(store_status)?;

    Ok(Json(UnreadCountResponse { count }))
}
