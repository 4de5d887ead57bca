use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::models::{LikeRow, ToggleOutcome, db_time, time_at, uuid_at};
use crate::{Database, Result};

const LIKE_SELECT: &str = "SELECT id, user_id, news_id, is_liked, timestamp FROM likes";

impl Database {
    /// Toggle `user_id`'s like on an article: insert if absent, delete if
    /// present. The UNIQUE(user_id, news_id) index decides which branch runs,
    /// and the whole exchange is one immediate transaction, so two concurrent
    /// toggles for the same pair always observe each other.
    pub fn toggle_like(&self, news_id: Uuid, user_id: i64) -> Result<ToggleOutcome> {
        let now = db_time(&Utc::now());
        let news_id = news_id.to_string();
        self.with_tx(|tx| {
            let inserted = tx.execute(
                "INSERT INTO likes (user_id, news_id, is_liked, timestamp) VALUES (?1, ?2, 1, ?3)
                 ON CONFLICT(user_id, news_id) DO NOTHING",
                rusqlite::params![user_id, news_id, now],
            )?;

            let liked = inserted > 0;
            if !liked {
                tx.execute(
                    "DELETE FROM likes WHERE user_id = ?1 AND news_id = ?2",
                    rusqlite::params![user_id, news_id],
                )?;
            }

            let likes_count = tx.query_row(
                "SELECT COUNT(*) FROM likes WHERE news_id = ?1",
                [&news_id],
                |row| row.get(0),
            )?;

            Ok(ToggleOutcome { liked, likes_count })
        })
    }

    pub fn list_likes(&self) -> Result<Vec<LikeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{LIKE_SELECT} ORDER BY id"))?;
            let rows = stmt
                .query_map([], map_like)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_like(&self, id: i64) -> Result<Option<LikeRow>> {
        self.with_conn(|conn| query_like(conn, id))
    }

    pub fn insert_like(&self, user_id: i64, news_id: Uuid, is_liked: bool) -> Result<LikeRow> {
        let now = db_time(&Utc::now());
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO likes (user_id, news_id, is_liked, timestamp) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![user_id, news_id.to_string(), is_liked, now],
            )?;
            let id = tx.last_insert_rowid();
            query_like(tx, id)?
                .ok_or_else(|| crate::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
        })
    }

    /// The owning user is never changed by an update.
    pub fn update_like(&self, id: i64, news_id: Uuid, is_liked: bool) -> Result<Option<LikeRow>> {
        self.with_tx(|tx| {
            let changed = tx.execute(
                "UPDATE likes SET news_id = ?1, is_liked = ?2 WHERE id = ?3",
                rusqlite::params![news_id.to_string(), is_liked, id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_like(tx, id)
        })
    }

    pub fn delete_like(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM likes WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}

fn query_like(conn: &Connection, id: i64) -> Result<Option<LikeRow>> {
    let row = conn
        .query_row(&format!("{LIKE_SELECT} WHERE id = ?1"), [id], map_like)
        .optional()?;
    Ok(row)
}

fn map_like(row: &Row<'_>) -> rusqlite::Result<LikeRow> {
    Ok(LikeRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        news_id: uuid_at(row, 2)?,
        is_liked: row.get(3)?,
        timestamp: time_at(row, 4)?,
    })
}
