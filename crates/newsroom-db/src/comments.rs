use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::models::{CommentFields, CommentRow, db_time, time_at, uuid_at};
use crate::{Database, Result};

const COMMENT_SELECT: &str = "
    SELECT cm.id, cm.news_id, cm.user_id, u.username, cm.name, cm.email, cm.comment, cm.timestamp
    FROM comments cm
    LEFT JOIN users u ON u.id = cm.user_id";

impl Database {
    pub fn list_comments(&self) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{COMMENT_SELECT} ORDER BY cm.id"))?;
            let rows = stmt
                .query_map([], map_comment)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Comments on one article, newest first.
    pub fn list_comments_for_news(&self, news_id: Uuid) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{COMMENT_SELECT} WHERE cm.news_id = ?1 ORDER BY cm.timestamp DESC, cm.id DESC"
            ))?;
            let rows = stmt
                .query_map([news_id.to_string()], map_comment)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_comment(&self, id: i64) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| query_comment(conn, id))
    }

    pub fn insert_comment(&self, user_id: Option<i64>, fields: &CommentFields) -> Result<CommentRow> {
        let now = db_time(&Utc::now());
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO comments (news_id, user_id, name, email, comment, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    fields.news_id.to_string(),
                    user_id,
                    fields.name,
                    fields.email,
                    fields.comment,
                    now,
                ],
            )?;
            let id = tx.last_insert_rowid();
            query_comment(tx, id)?
                .ok_or_else(|| crate::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
        })
    }

    /// The owning user is never changed by an update.
    pub fn update_comment(&self, id: i64, fields: &CommentFields) -> Result<Option<CommentRow>> {
        self.with_tx(|tx| {
            let changed = tx.execute(
                "UPDATE comments SET news_id = ?1, name = ?2, email = ?3, comment = ?4 WHERE id = ?5",
                rusqlite::params![
                    fields.news_id.to_string(),
                    fields.name,
                    fields.email,
                    fields.comment,
                    id,
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_comment(tx, id)
        })
    }

    pub fn delete_comment(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM comments WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}

fn query_comment(conn: &Connection, id: i64) -> Result<Option<CommentRow>> {
    let row = conn
        .query_row(&format!("{COMMENT_SELECT} WHERE cm.id = ?1"), [id], map_comment)
        .optional()?;
    Ok(row)
}

fn map_comment(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        news_id: uuid_at(row, 1)?,
        user_id: row.get(2)?,
        username: row.get(3)?,
        name: row.get(4)?,
        email: row.get(5)?,
        comment: row.get(6)?,
        timestamp: time_at(row, 7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbError;
    use crate::models::NewsFields;

    fn article(db: &Database) -> Uuid {
        let author = db.create_user("editor", "editor@example.com", "hash").unwrap();
        db.insert_news(
            author.id,
            &NewsFields {
                category_id: None,
                title: "Launch".into(),
                slug: "launch".into(),
                image: "news_images/launch.png".into(),
                body: "Liftoff".into(),
                is_breaking: false,
            },
        )
        .unwrap()
        .id
    }

    fn comment_on(news_id: Uuid, text: &str) -> CommentFields {
        CommentFields {
            news_id,
            name: "Guest".into(),
            email: "guest@example.com".into(),
            comment: text.into(),
        }
    }

    #[test]
    fn lists_article_comments_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let news_id = article(&db);

        db.insert_comment(None, &comment_on(news_id, "first")).unwrap();
        db.insert_comment(None, &comment_on(news_id, "second")).unwrap();

        let texts: Vec<_> = db
            .list_comments_for_news(news_id)
            .unwrap()
            .into_iter()
            .map(|c| c.comment)
            .collect();
        assert_eq!(texts, vec!["second", "first"]);
    }

    #[test]
    fn anonymous_comment_has_no_user() {
        let db = Database::open_in_memory().unwrap();
        let news_id = article(&db);

        let stored = db.insert_comment(None, &comment_on(news_id, "hi")).unwrap();
        assert!(stored.user_id.is_none());
        assert!(stored.username.is_none());
        assert_eq!(stored.name, "Guest");
    }

    #[test]
    fn update_keeps_owner() {
        let db = Database::open_in_memory().unwrap();
        let news_id = article(&db);
        let reader = db.create_user("reader", "", "hash").unwrap();

        let stored = db.insert_comment(Some(reader.id), &comment_on(news_id, "hi")).unwrap();
        let updated = db
            .update_comment(stored.id, &comment_on(news_id, "edited"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.user_id, Some(reader.id));
        assert_eq!(updated.username.as_deref(), Some("reader"));
        assert_eq!(updated.comment, "edited");
    }

    #[test]
    fn rejects_comment_on_missing_article() {
        let db = Database::open_in_memory().unwrap();
        let err = db.insert_comment(None, &comment_on(Uuid::new_v4(), "hi")).unwrap_err();
        assert!(matches!(err, DbError::MissingReference));
    }
}
