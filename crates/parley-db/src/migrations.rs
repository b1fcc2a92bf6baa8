use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Versioned migrations keyed by a `schema_version` table. The server
/// runs pending migrations on the writer connection at startup; a
/// deployment can also run them out-of-band before rollout.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("running migration v1 (messaging core schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id           TEXT PRIMARY KEY,
                email        TEXT NOT NULL,
                display_name TEXT NOT NULL,
                org_id       TEXT,
                created_at   TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- Two-party conversations. The pair is stored normalized
            -- (participant_a < participant_b) so the UNIQUE constraint
            -- covers the unordered pair: {u, v} and {v, u} hit the same row.
            CREATE TABLE conversations (
                id              TEXT PRIMARY KEY,
                participant_a   TEXT NOT NULL REFERENCES users(id),
                participant_b   TEXT NOT NULL REFERENCES users(id),
                last_message_at TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                UNIQUE(participant_a, participant_b),
                CHECK(participant_a < participant_b)
            );

            CREATE INDEX idx_conversations_a
                ON conversations(participant_a, last_message_at);
            CREATE INDEX idx_conversations_b
                ON conversations(participant_b, last_message_at);

            CREATE TABLE messages (
                id              TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL REFERENCES conversations(id),
                sender_id       TEXT NOT NULL REFERENCES users(id),
                content         TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                read_at         TEXT
            );

            CREATE INDEX idx_messages_conversation
                ON messages(conversation_id, created_at);
            CREATE INDEX idx_messages_unread
                ON messages(conversation_id, read_at) WHERE read_at IS NULL;

            CREATE TABLE notifications (
                id         TEXT PRIMARY KEY,
                user_id    TEXT NOT NULL REFERENCES users(id),
                kind       TEXT NOT NULL,
                title      TEXT NOT NULL,
                body       TEXT,
                link       TEXT,
                data       TEXT,
                read_at    TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX idx_notifications_user
                ON notifications(user_id, created_at);

            CREATE TABLE notification_prefs (
                user_id           TEXT PRIMARY KEY REFERENCES users(id),
                email_connections INTEGER NOT NULL DEFAULT 1,
                email_messages    INTEGER NOT NULL DEFAULT 1,
                email_rfq         INTEGER NOT NULL DEFAULT 1,
                push_enabled      INTEGER NOT NULL DEFAULT 1
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
