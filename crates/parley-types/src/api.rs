use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kinds::NotificationKind;

// -- JWT Claims --

/// JWT claims minted by the directory app's auth service. The messaging
/// core never issues tokens; it only decodes these. Canonical definition
/// lives here in parley-types so the middleware and any future consumers
/// agree on the shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub org_id: Option<Uuid>,
    pub exp: usize,
}

// -- Messages --

/// Send a message. Either an existing `conversation_id` or a
/// `recipient_id` (first contact — the conversation is created in the
/// same transaction as the message) must be present.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub conversation_id: Option<Uuid>,
    pub recipient_id: Option<Uuid>,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub read_at: Option<chrono::DateTime<chrono::Utc>>,
}

// -- Conversations --

/// One entry in the caller's inbox: the other participant, the most
/// recent message body and how many of their messages are still unread.
#[derive(Debug, Serialize)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub other_user_id: Uuid,
    pub other_display_name: String,
    pub other_org_id: Option<Uuid>,
    pub last_message_body: Option<String>,
    pub last_message_at: chrono::DateTime<chrono::Utc>,
    pub unread_count: i64,
}

// -- Notifications --

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: Option<String>,
    pub link: Option<String>,
    /// Opaque payload set by whichever subsystem created the notification.
    pub data: Option<serde_json::Value>,
    pub read_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// -- Counts --

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}
