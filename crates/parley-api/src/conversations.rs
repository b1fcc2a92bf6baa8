use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use parley_types::api::{Claims, ConversationSummary};

use crate::convert::{parse_ts, parse_uuid};
use crate::error::{join_status, store_status};
use crate::state::AppState;

/// The caller's inbox: conversations ordered by most recent activity,
/// each annotated with the other participant and their unread count.
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let user_id = claims.sub.to_string();

    let rows = tokio::task::spawn_blocking(move || db.list_conversations_for_user(&user_id))
        .await
        .map_err(join_status)?
        .map_err(store_status)?;

    let summaries: Vec<ConversationSummary> = rows
        .into_iter()
        .map(|row| ConversationSummary {
            id: parse_uuid(&row.conversation_id, "conversation id"),
            other_user_id: parse_uuid(&row.other_user_id, "other_user_id"),
            other_display_name: row.other_display_name,
            other_org_id: row
                .other_org_id
                .as_deref()
                .map(|s| parse_uuid(s, "other_org_id")),
            last_message_body: row.last_message_body,
            last_message_at: parse_ts(&row.last_message_at, "last_message_at"),
            unread_count: row.unread_count,
        })
        .collect();

    Ok(Json(summaries))
}
