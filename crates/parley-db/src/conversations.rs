use rusqlite::{Connection, OptionalExtension};

use crate::Database;
use crate::error::StoreError;
use crate::models::{ConversationRow, ConversationSummaryRow};

/// Order-independent participant pair: the smaller id always lands in
/// slot A, so one row represents {u, v} no matter who messaged first.
pub fn normalize_pair<'a>(u: &'a str, v: &'a str) -> (&'a str, &'a str) {
    if u <= v { (u, v) } else { (v, u) }
}

/// Find or create the conversation for an unordered user pair. Runs
/// against the caller's connection so it can share a transaction with the
/// first message insert.
///
/// Safe under concurrent first contact: `INSERT OR IGNORE` against the
/// UNIQUE(participant_a, participant_b) constraint means a lost race
/// falls through to the re-read instead of failing the caller.
pub fn resolve_or_create(
    conn: &Connection,
    user_a: &str,
    user_b: &str,
) -> Result<String, StoreError> {
    if user_a == user_b {
        return Err(StoreError::Validation(
            "cannot open a conversation with yourself".into(),
        ));
    }

    let (a, b) = normalize_pair(user_a, user_b);
    let candidate_id = uuid::Uuid::new_v4().to_string();
    let now = crate::now_ts();

    conn.execute(
        "INSERT OR IGNORE INTO conversations
             (id, participant_a, participant_b, last_message_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        rusqlite::params![candidate_id, a, b, now],
    )?;

    let id = conn.query_row(
        "SELECT id FROM conversations WHERE participant_a = ?1 AND participant_b = ?2",
        [a, b],
        |row| row.get(0),
    )?;

    Ok(id)
}

/// Load a conversation, requiring `user_id` to be a participant.
/// A non-participant gets `NotFound` — indistinguishable from a missing
/// row on purpose.
pub fn get_for_participant(
    conn: &Connection,
    conversation_id: &str,
    user_id: &str,
) -> Result<ConversationRow, StoreError> {
    conn.query_row(
        "SELECT id, participant_a, participant_b, last_message_at, created_at
         FROM conversations
         WHERE id = ?1 AND (participant_a = ?2 OR participant_b = ?2)",
        [conversation_id, user_id],
        |row| {
            Ok(ConversationRow {
                id: row.get(0)?,
                participant_a: row.get(1)?,
                participant_b: row.get(2)?,
                last_message_at: row.get(3)?,
                created_at: row.get(4)?,
            })
        },
    )
    .optional()?
    .ok_or(StoreError::NotFound)
}

/// Bump `last_message_at`; called inside the message-append transaction.
pub fn touch(conn: &Connection, conversation_id: &str, now: &str) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE conversations SET last_message_at = ?1 WHERE id = ?2",
        [now, conversation_id],
    )?;
    Ok(())
}

impl Database {
    /// Return the existing conversation for the unordered pair, creating
    /// it if this is first contact.
    pub fn resolve_or_create_conversation(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> Result<String, StoreError> {
        self.with_writer(|conn| {
            let tx = conn.transaction()?;
            let id = resolve_or_create(&tx, user_a, user_b)?;
            tx.commit()?;
            Ok(id)
        })
    }

    /// Inbox view: every conversation the user participates in, annotated
    /// with the other participant, the latest message body and the count
    /// of their unread messages. Ordered by `last_message_at` descending.
    pub fn list_conversations_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<ConversationSummaryRow>, StoreError> {
        self.with_conn(|conn| query_summaries(conn, user_id))
    }
}

fn query_summaries(
    conn: &Connection,
    user_id: &str,
) -> Result<Vec<ConversationSummaryRow>, StoreError> {
    // JOIN users for the other participant and pull the latest body and
    // unread count via correlated subqueries — one round trip, no N+1.
    let mut stmt = conn.prepare(
        "SELECT c.id,
                u.id,
                u.display_name,
                u.org_id,
                (SELECT m.content FROM messages m
                 WHERE m.conversation_id = c.id
                 ORDER BY m.created_at DESC, m.rowid DESC LIMIT 1),
                c.last_message_at,
                (SELECT COUNT(*) FROM messages m
                 WHERE m.conversation_id = c.id
                   AND m.sender_id != ?1 AND m.read_at IS NULL)
         FROM conversations c
         JOIN users u
           ON u.id = CASE WHEN c.participant_a = ?1
                          THEN c.participant_b ELSE c.participant_a END
         WHERE c.participant_a = ?1 OR c.participant_b = ?1
         ORDER BY c.last_message_at DESC",
    )?;

    let rows = stmt
        .query_map([user_id], |row| {
            Ok(ConversationSummaryRow {
                conversation_id: row.get(0)?,
                other_user_id: row.get(1)?,
                other_display_name: row.get(2)?,
                other_org_id: row.get(3)?,
                last_message_body: row.get(4)?,
                last_message_at: row.get(5)?,
                unread_count: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_pair_is_order_independent() {
        assert_eq!(normalize_pair("aaa", "bbb"), ("aaa", "bbb"));
        assert_eq!(normalize_pair("bbb", "aaa"), ("aaa", "bbb"));
    }

    #[test]
    fn normalize_pair_keeps_smaller_first() {
        let (a, b) = normalize_pair(
            "f47ac10b-58cc-4372-a567-0e02b2c3d479",
            "16fd2706-8baf-433b-82eb-8c7fada847da",
        );
        assert!(a < b);
    }
}
