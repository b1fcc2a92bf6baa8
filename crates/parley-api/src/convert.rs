use parley_db::models::{MessageRow, NotificationRow};
use parley_types::api::{MessageResponse, NotificationResponse};
use parley_types::kinds::NotificationKind;
use tracing::warn;
use uuid::Uuid;

/// Parse a stored UUID column, falling back to the nil UUID with a log
/// line rather than failing the whole response over one corrupt row.
pub fn parse_uuid(s: &str, ctx: &str) -> Uuid {
    s.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", ctx, s, e);
        Uuid::default()
    })
}

/// Parse a stored timestamp. Rows written by this core are RFC 3339;
/// rows seeded with SQLite's `datetime('now')` default come back as
/// "YYYY-MM-DD HH:MM:SS" without a timezone, so fall back to naive UTC.
pub fn parse_ts(s: &str, ctx: &str) -> chrono::DateTime<chrono::Utc> {
    s.parse::<chrono::DateTime<chrono::Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt {} '{}': {}", ctx, s, e);
            chrono::DateTime::default()
        })
}

pub fn message_response(row: &MessageRow) -> MessageResponse {
    MessageResponse {
        id: parse_uuid(&row.id, "message id"),
        conversation_id: parse_uuid(&row.conversation_id, "conversation_id"),
        sender_id: parse_uuid(&row.sender_id, "sender_id"),
        content: row.content.clone(),
        created_at: parse_ts(&row.created_at, "message created_at"),
        read_at: row.read_at.as_deref().map(|s| parse_ts(s, "message read_at")),
    }
}

pub fn notification_response(row: &NotificationRow) -> NotificationResponse {
    NotificationResponse {
        id: parse_uuid(&row.id, "notification id"),
        user_id: parse_uuid(&row.user_id, "notification user_id"),
        kind: NotificationKind::parse(&row.kind).unwrap_or_else(|| {
            warn!("Corrupt notification kind '{}' on '{}'", row.kind, row.id);
            NotificationKind::System
        }),
        title: row.title.clone(),
        body: row.body.clone(),
        link: row.link.clone(),
        data: row
            .data
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok()),
        read_at: row
            .read_at
            .as_deref()
            .map(|s| parse_ts(s, "notification read_at")),
        created_at: parse_ts(&row.created_at, "notification created_at"),
    }
}
