use parley_types::prefs::{Preferences, PreferencesPatch};
use rusqlite::OptionalExtension;

use crate::Database;
use crate::error::StoreError;

impl Database {
    /// Preference flags for a user; all-true defaults when no row exists.
    pub fn get_prefs(&self, user_id: &str) -> Result<Preferences, StoreError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT email_connections, email_messages, email_rfq, push_enabled
                     FROM notification_prefs WHERE user_id = ?1",
                    [user_id],
                    |row| {
                        Ok(Preferences {
                            email_connections: row.get(0)?,
                            email_messages: row.get(1)?,
                            email_rfq: row.get(2)?,
                            push_enabled: row.get(3)?,
                        })
                    },
                )
                .optional()?;

            Ok(row.unwrap_or_default())
        })
    }

    /// Partial upsert in one statement: flags present in the patch are
    /// set, absent flags keep their stored value (or the default `true`
    /// on first write). No read-then-write window.
    pub fn upsert_prefs(
        &self,
        user_id: &str,
        patch: &PreferencesPatch,
    ) -> Result<(), StoreError> {
        self.with_writer(|conn| {
            conn.execute(
                "INSERT INTO notification_prefs
                     (user_id, email_connections, email_messages, email_rfq, push_enabled)
                 VALUES (?1, COALESCE(?2, 1), COALESCE(?3, 1), COALESCE(?4, 1), COALESCE(?5, 1))
                 ON CONFLICT(user_id) DO UPDATE SET
                     email_connections = COALESCE(?2, email_connections),
                     email_messages    = COALESCE(?3, email_messages),
                     email_rfq         = COALESCE(?4, email_rfq),
                     push_enabled      = COALESCE(?5, push_enabled)",
                rusqlite::params![
                    user_id,
                    patch.email_connections,
                    patch.email_messages,
                    patch.email_rfq,
                    patch.push_enabled
                ],
            )?;
            Ok(())
        })
    }
}
