/// Database row types — these map directly to SQLite rows.
/// Distinct from the parley-types API models to keep the DB layer
/// independent.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub org_id: Option<String>,
    pub created_at: String,
}

pub struct ConversationRow {
    pub id: String,
    pub participant_a: String,
    pub participant_b: String,
    pub last_message_at: String,
    pub created_at: String,
}

impl ConversationRow {
    /// The participant that is not `user_id`. Callers must have already
    /// verified membership.
    pub fn other_participant(&self, user_id: &str) -> &str {
        if self.participant_a == user_id {
            &self.participant_b
        } else {
            &self.participant_a
        }
    }
}

pub struct MessageRow {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub created_at: String,
    pub read_at: Option<String>,
}

pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub title: String,
    pub body: Option<String>,
    pub link: Option<String>,
    pub data: Option<String>,
    pub read_at: Option<String>,
    pub created_at: String,
}

/// One inbox entry as produced by the conversation list query.
pub struct ConversationSummaryRow {
    pub conversation_id: String,
    pub other_user_id: String,
    pub other_display_name: String,
    pub other_org_id: Option<String>,
    pub last_message_body: Option<String>,
    pub last_message_at: String,
    pub unread_count: i64,
}
