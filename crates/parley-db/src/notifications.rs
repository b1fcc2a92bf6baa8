use parley_types::kinds::NotificationKind;
use rusqlite::Connection;
use uuid::Uuid;

use crate::Database;
use crate::error::StoreError;
use crate::models::NotificationRow;

/// Input for `create_notification`. `data` is an opaque payload owned by
/// whichever subsystem raised the notification; the core stores it as-is.
pub struct NewNotification<'a> {
    pub user_id: &'a str,
    pub kind: NotificationKind,
    pub title: &'a str,
    pub body: Option<&'a str>,
    pub link: Option<&'a str>,
    pub data: Option<&'a serde_json::Value>,
}

impl Database {
    /// Plain insert into the recipient's feed. Whether the notification
    /// also goes out as an email is the dispatcher's business — this row
    /// commits regardless of any later delivery outcome.
    pub fn create_notification(
        &self,
        n: NewNotification<'_>,
    ) -> Result<NotificationRow, StoreError> {
        let id = Uuid::new_v4().to_string();
        let now = crate::now_ts();
        let data = n.data.map(|v| v.to_string());

        self.with_writer(|conn| {
            conn.execute(
                "INSERT INTO notifications
                     (id, user_id, kind, title, body, link, data, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    id,
                    n.user_id,
                    n.kind.as_str(),
                    n.title,
                    n.body,
                    n.link,
                    data,
                    now
                ],
            )?;
            Ok(())
        })?;

        Ok(NotificationRow {
            id,
            user_id: n.user_id.to_string(),
            kind: n.kind.as_str().to_string(),
            title: n.title.to_string(),
            body: n.body.map(str::to_string),
            link: n.link.map(str::to_string),
            data,
            read_at: None,
            created_at: now,
        })
    }

    pub fn list_notifications_for_user(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<NotificationRow>, StoreError> {
        self.with_conn(|conn| query_notifications(conn, user_id, limit))
    }

    /// Lenient by contract: marking a missing or foreign notification is
    /// a silent no-op, never an error.
    pub fn mark_notification_read(&self, id: &str, user_id: &str) -> Result<(), StoreError> {
        self.with_writer(|conn| {
            let now = crate::now_ts();
            conn.execute(
                "UPDATE notifications SET read_at = ?1
                 WHERE id = ?2 AND user_id = ?3 AND read_at IS NULL",
                rusqlite::params![now, id, user_id],
            )?;
            Ok(())
        })
    }

    pub fn mark_all_notifications_read(&self, user_id: &str) -> Result<usize, StoreError> {
        self.with_writer(|conn| {
            let now = crate::now_ts();
            let marked = conn.execute(
                "UPDATE notifications SET read_at = ?1
                 WHERE user_id = ?2 AND read_at IS NULL",
                rusqlite::params![now, user_id],
            )?;
            Ok(marked)
        })
    }

    pub fn unread_notification_count(&self, user_id: &str) -> Result<i64, StoreError> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM notifications
                 WHERE user_id = ?1 AND read_at IS NULL",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}

fn query_notifications(
    conn: &Connection,
    user_id: &str,
    limit: u32,
) -> Result<Vec<NotificationRow>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, kind, title, body, link, data, read_at, created_at
         FROM notifications
         WHERE user_id = ?1
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?2",
    )?;

    let rows = stmt
        .query_map(rusqlite::params![user_id, limit], |row| {
            Ok(NotificationRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                kind: row.get(2)?,
                title: row.get(3)?,
                body: row.get(4)?,
                link: row.get(5)?,
                data: row.get(6)?,
                read_at: row.get(7)?,
                created_at: row.get(8)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}
