use anyhow::Result;
use rusqlite::Connection;

use crate::Database;
use crate::models::{MessageRow, SubscriptionRow, UserRow};

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, password: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, password, created_at FROM users ORDER BY created_at, rowid",
            )?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        id: &str,
        sender: &str,
        receiver: &str,
        body: &str,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, sender, receiver, body, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, sender, receiver, body, created_at),
            )?;
            Ok(())
        })
    }

    /// History for an unordered pair: messages in either direction between
    /// the two users, oldest first. rowid breaks created_at ties so bursts
    /// within one millisecond keep submission order.
    pub fn get_messages_between(&self, user1: &str, user2: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, sender, receiver, body, created_at FROM messages
                 WHERE (sender = ?1 AND receiver = ?2)
                    OR (sender = ?2 AND receiver = ?1)
                 ORDER BY created_at ASC, rowid ASC",
            )?;

            let rows = stmt
                .query_map([user1, user2], |row| {
                    Ok(MessageRow {
                        id: row.get(0)?,
                        sender: row.get(1)?,
                        receiver: row.get(2)?,
                        body: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Push subscriptions --

    pub fn upsert_subscription(&self, username: &str, subscription: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO push_subscriptions (username, subscription, updated_at)
                 VALUES (?1, ?2, datetime('now'))
                 ON CONFLICT(username) DO UPDATE SET
                     subscription = excluded.subscription,
                     updated_at = excluded.updated_at",
                (username, subscription),
            )?;
            Ok(())
        })
    }

    pub fn get_subscription(&self, username: &str) -> Result<Option<SubscriptionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT username, subscription, updated_at FROM push_subscriptions
                 WHERE username = ?1",
            )?;

            let row = stmt
                .query_row([username], |row| {
                    Ok(SubscriptionRow {
                        username: row.get(0)?,
                        subscription: row.get(1)?,
                        updated_at: row.get(2)?,
                    })
                })
                .optional()?;

            Ok(row)
        })
    }

    pub fn delete_subscription(&self, username: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM push_subscriptions WHERE username = ?1",
                [username],
            )?;
            Ok(())
        })
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE username = ?1")?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
