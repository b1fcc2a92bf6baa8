use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use parley_db::messages::AppendMessage;
use parley_db::notifications::NewNotification;
use parley_types::api::{Claims, SendMessageRequest, UnreadCountResponse};
use parley_types::kinds::NotificationKind;

use crate::convert::message_response;
use crate::error::{join_status, store_status};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    50
}

/// Longest message excerpt carried into the recipient's notification.
const NOTIFICATION_PREVIEW_LEN: usize = 120;

/// Send a message. With only a `recipient_id`, the conversation is
/// created in the same transaction as the message. Not idempotent under
/// client retry — no request-id deduplication exists yet.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let sender_id = claims.sub.to_string();
    let conversation_id = req.conversation_id.map(|id| id.to_string());
    let recipient_id = req.recipient_id.map(|id| id.to_string());
    let content = req.content;

    // Run blocking DB work off the async runtime
    let appended = tokio::task::spawn_blocking(move || {
        db.append_message(AppendMessage {
            conversation_id: conversation_id.as_deref(),
            recipient_id: recipient_id.as_deref(),
            sender_id: &sender_id,
            content: &content,
        })
    })
    .await
    .map_err(join_status)?
    .map_err(store_status)?;

    // The message is committed. Notify the other participant; failures
    // here must not turn a successful send into an error.
    let db = state.db.clone();
    let message = &appended.message;
    let recipient = appended.other_participant.clone();
    let title = format!("New message from {}", claims.display_name);
    let preview: String = message.content.chars().take(NOTIFICATION_PREVIEW_LEN).collect();
    let link = format!("/messages/{}", message.conversation_id);
    let data = serde_json::json!({
        "conversation_id": message.conversation_id,
        "message_id": message.id,
    });

    let created = tokio::task::spawn_blocking(move || {
        db.create_notification(NewNotification {
            user_id: &recipient,
            kind: NotificationKind::Message,
            title: &title,
            body: Some(&preview),
            link: Some(&link),
            data: Some(&data),
        })
    })
    .await;

    match created {
        Ok(Ok(notification)) => state.dispatcher.maybe_dispatch_email(notification),
        Ok(Err(e)) => warn!("message notification insert failed: {}", e),
        Err(e) => warn!("spawn_blocking join error: {}", e),
    }

    Ok((StatusCode::CREATED, Json(message_response(&appended.message))))
}

/// One page of a conversation, oldest-first. Requires the caller to be a
/// participant; anyone else sees 404.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let cid = conversation_id.to_string();
    let requester = claims.sub.to_string();
    let page = query.page;
    let page_size = query.page_size.clamp(1, 200);

    let rows = tokio::task::spawn_blocking(move || {
        db.page_messages(&cid, &requester, page, page_size)
    })
    .await
    .map_err(join_status)?
    .map_err(store_status)?;

    let messages: Vec<_> = rows.iter().map(message_response).collect();
    Ok(Json(messages))
}

/// Mark everything the other participant sent as read. Idempotent.
pub async fn mark_read(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let cid = conversation_id.to_string();
    let reader = claims.sub.to_string();

    let marked = tokio::task::spawn_blocking(move || db.mark_conversation_read(&cid, &reader))
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

    let count = tokio::task::spawn_blocking(move || db.unread_message_count(&user_id))
        .await
        .map_err(join_status)?
        .map_err(store_status)?;

    Ok(Json(UnreadCountResponse { count }))
}
