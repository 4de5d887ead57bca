use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params_from_iter};
use uuid::Uuid;

use crate::models::{CategoryRow, NewsFields, NewsFilter, NewsRow, db_time, time_at, uuid_at};
use crate::{Database, Result};

// Author and category are joined in, and both counters computed, in a single
// query per page.
const NEWS_SELECT: &str = "
    SELECT n.id, n.category_id, c.name, c.slug, n.author_id, u.username,
           n.title, n.slug, n.image, n.body, n.date_posted, n.updated_at, n.is_breaking,
           (SELECT COUNT(*) FROM likes l WHERE l.news_id = n.id AND l.is_liked = 1),
           (SELECT COUNT(*) FROM comments cm WHERE cm.news_id = n.id)
    FROM news n
    JOIN users u ON u.id = n.author_id
    LEFT JOIN categories c ON c.id = n.category_id";

const NEWS_ORDER: &str = "ORDER BY n.date_posted DESC, n.rowid DESC";

impl Database {
    /// Articles newest first, narrowed by whichever filters are set.
    pub fn list_news(&self, filter: &NewsFilter) -> Result<Vec<NewsRow>> {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        if let Some(slug) = &filter.category_slug {
            clauses.push("c.slug = ?");
            params.push(Value::Text(slug.clone()));
        }
        if let Some(breaking) = filter.is_breaking {
            clauses.push("n.is_breaking = ?");
            params.push(Value::Integer(breaking.into()));
        }
        if let Some(term) = &filter.search {
            let pattern = format!("%{}%", escape_like(term));
            clauses.push(r"(n.title LIKE ? ESCAPE '\' OR n.body LIKE ? ESCAPE '\')");
            params.push(Value::Text(pattern.clone()));
            params.push(Value::Text(pattern));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let sql = format!("{NEWS_SELECT} {where_sql} {NEWS_ORDER}");

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(params.iter()), map_news)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_news_by_slug(&self, slug: &str) -> Result<Option<NewsRow>> {
        self.with_conn(|conn| query_news(conn, "n.slug", slug))
    }

    pub fn get_news(&self, id: Uuid) -> Result<Option<NewsRow>> {
        self.with_conn(|conn| query_news(conn, "n.id", &id.to_string()))
    }

    pub fn insert_news(&self, author_id: i64, fields: &NewsFields) -> Result<NewsRow> {
        let id = Uuid::new_v4();
        let now = db_time(&Utc::now());
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO news
                    (id, category_id, author_id, title, slug, image, body, date_posted, updated_at, is_breaking)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8, ?9)",
                rusqlite::params![
                    id.to_string(),
                    fields.category_id,
                    author_id,
                    fields.title,
                    fields.slug,
                    fields.image,
                    fields.body,
                    now,
                    fields.is_breaking,
                ],
            )?;
            query_news(tx, "n.id", &id.to_string())?.ok_or_else(|| {
                crate::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
            })
        })
    }

    /// Overwrite every client-writable column and bump `updated_at`.
    /// Returns `None` when the article no longer exists.
    pub fn update_news(&self, id: Uuid, fields: &NewsFields) -> Result<Option<NewsRow>> {
        let now = db_time(&Utc::now());
        self.with_tx(|tx| {
            let changed = tx.execute(
                "UPDATE news
                 SET category_id = ?1, title = ?2, slug = ?3, image = ?4, body = ?5,
                     is_breaking = ?6, updated_at = ?7
                 WHERE id = ?8",
                rusqlite::params![
                    fields.category_id,
                    fields.title,
                    fields.slug,
                    fields.image,
                    fields.body,
                    fields.is_breaking,
                    now,
                    id.to_string(),
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_news(tx, "n.id", &id.to_string())
        })
    }

    /// Comments and likes on the article go with it.
    pub fn delete_news(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM news WHERE id = ?1", [id.to_string()])?;
            Ok(changed > 0)
        })
    }
}

fn query_news(conn: &Connection, column: &str, value: &str) -> Result<Option<NewsRow>> {
    let sql = format!("{NEWS_SELECT} WHERE {column} = ?1");
    let row = conn.query_row(&sql, [value], map_news).optional()?;
    Ok(row)
}

fn map_news(row: &Row<'_>) -> rusqlite::Result<NewsRow> {
    let category = match row.get::<_, Option<i64>>(1)? {
        Some(id) => Some(CategoryRow {
            id,
            name: row.get(2)?,
            slug: row.get(3)?,
        }),
        None => None,
    };

    Ok(NewsRow {
        id: uuid_at(row, 0)?,
        category,
        author_id: row.get(4)?,
        author_username: row.get(5)?,
        title: row.get(6)?,
        slug: row.get(7)?,
        image: row.get(8)?,
        body: row.get(9)?,
        date_posted: time_at(row, 10)?,
        updated_at: time_at(row, 11)?,
        is_breaking: row.get(12)?,
        likes_count: row.get(13)?,
        comments_count: row.get(14)?,
    })
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
