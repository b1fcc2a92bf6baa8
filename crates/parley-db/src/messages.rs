use rusqlite::Connection;
use uuid::Uuid;

use crate::Database;
use crate::conversations;
use crate::error::StoreError;
use crate::models::MessageRow;

/// Input for `append_message`. Exactly one of `conversation_id` /
/// `recipient_id` drives conversation resolution: an explicit id is
/// membership-checked, a bare recipient resolves (or creates) the pair's
/// conversation inside the same transaction.
pub struct AppendMessage<'a> {
    pub conversation_id: Option<&'a str>,
    pub recipient_id: Option<&'a str>,
    pub sender_id: &'a str,
    pub content: &'a str,
}

/// Result of an append: the stored message plus the other participant,
/// which the caller needs for notification fan-out.
pub struct AppendedMessage {
    pub message: MessageRow,
    pub other_participant: String,
}

impl Database {
    /// Append a message to a conversation. "Resolve conversation, insert
    /// message, bump last_message_at" is one transaction, so first contact
    /// never leaves a conversation observable without its first message.
    ///
    /// Not idempotent: a caller retrying after a timeout may produce a
    /// duplicate message. Request-id deduplication is an open extension.
    pub fn append_message(&self, req: AppendMessage<'_>) -> Result<AppendedMessage, StoreError> {
        let content = req.content.trim();
        if content.is_empty() {
            return Err(StoreError::Validation(
                "message content must not be empty".into(),
            ));
        }

        self.with_writer(|conn| {
            let tx = conn.transaction()?;

            let (conversation_id, other_participant) = match req.conversation_id {
                Some(id) => {
                    let conv = conversations::get_for_participant(&tx, id, req.sender_id)?;
                    let other = conv.other_participant(req.sender_id).to_string();
                    (conv.id, other)
                }
                None => {
                    let recipient = req.recipient_id.ok_or_else(|| {
                        StoreError::Validation(
                            "recipient_id is required when no conversation_id is given".into(),
                        )
                    })?;
                    let id = conversations::resolve_or_create(&tx, req.sender_id, recipient)?;
                    (id, recipient.to_string())
                }
            };

            let message_id = Uuid::new_v4().to_string();
            let now = crate::now_ts();

            tx.execute(
                "INSERT INTO messages (id, conversation_id, sender_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![message_id, conversation_id, req.sender_id, content, now],
            )?;

            conversations::touch(&tx, &conversation_id, &now)?;

            tx.commit()?;

            Ok(AppendedMessage {
                message: MessageRow {
                    id: message_id,
                    conversation_id,
                    sender_id: req.sender_id.to_string(),
                    content: content.to_string(),
                    created_at: now,
                    read_at: None,
                },
                other_participant,
            })
        })
    }

    /// One page of messages, oldest-first for display. Page 1 holds the
    /// most recent `page_size` messages; page n skips `(n-1)*page_size`
    /// of the most recent. No dedup guarantee across pages if new
    /// messages land between fetches.
    pub fn page_messages(
        &self,
        conversation_id: &str,
        requester_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<MessageRow>, StoreError> {
        self.with_conn(|conn| {
            conversations::get_for_participant(conn, conversation_id, requester_id)?;

            let page = page.max(1);
            let offset = (page as i64 - 1) * page_size as i64;

            let mut rows = query_page(conn, conversation_id, page_size, offset)?;
            // Fetched newest-first for the LIMIT/OFFSET window; display
            // order is oldest-first.
            rows.reverse();
            Ok(rows)
        })
    }

    /// Mark every message in the conversation that was sent by the other
    /// participant as read. Idempotent; a reader can never mark their own
    /// messages, and `read_at` is never cleared.
    pub fn mark_conversation_read(
        &self,
        conversation_id: &str,
        reader_id: &str,
    ) -> Result<usize, StoreError> {
        self.with_writer(|conn| {
            conversations::get_for_participant(conn, conversation_id, reader_id)?;

            let now = crate::now_ts();
            let marked = conn.execute(
                "UPDATE messages SET read_at = ?1
                 WHERE conversation_id = ?2 AND sender_id != ?3 AND read_at IS NULL",
                rusqlite::params![now, conversation_id, reader_id],
            )?;
            Ok(marked)
        })
    }

    /// Unread messages across all of the user's conversations: sent by
    /// someone else, not yet read.
    pub fn unread_message_count(&self, user_id: &str) -> Result<i64, StoreError> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*)
                 FROM messages m
                 JOIN conversations c ON c.id = m.conversation_id
                 WHERE (c.participant_a = ?1 OR c.participant_b = ?1)
                   AND m.sender_id != ?1 AND m.read_at IS NULL",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}

fn query_page(
    conn: &Connection,
    conversation_id: &str,
    limit: u32,
    offset: i64,
) -> Result<Vec<MessageRow>, StoreError> {
    // rowid breaks created_at ties in insertion order, keeping pagination
    // stable for messages written within the same microsecond.
    let mut stmt = conn.prepare(
        "SELECT id, conversation_id, sender_id, content, created_at, read_at
         FROM messages
         WHERE conversation_id = ?1
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?2 OFFSET ?3",
    )?;

    let rows = stmt
        .query_map(rusqlite::params![conversation_id, limit, offset], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                conversation_id: row.get(1)?,
                sender_id: row.get(2)?,
                content: row.get(3)?,
                created_at: row.get(4)?,
                read_at: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}
