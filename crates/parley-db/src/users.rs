use rusqlite::OptionalExtension;

use crate::Database;
use crate::error::StoreError;
use crate::models::UserRow;

/// The users table is owned by the directory app's CRUD layer; the
/// messaging core only reads it (display names for summaries, addresses
/// for mail). `insert_user` exists for provisioning and test fixtures.
impl Database {
    pub fn get_user(&self, id: &str) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, email, display_name, org_id, created_at
                     FROM users WHERE id = ?1",
                    [id],
                    |row| {
                        Ok(UserRow {
                            id: row.get(0)?,
                            email: row.get(1)?,
                            display_name: row.get(2)?,
                            org_id: row.get(3)?,
                            created_at: row.get(4)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn insert_user(
        &self,
        id: &str,
        email: &str,
        display_name: &str,
        org_id: Option<&str>,
    ) -> Result<(), StoreError> {
        self.with_writer(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, display_name, org_id) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, email, display_name, org_id],
            )?;
            Ok(())
        })
    }
}
