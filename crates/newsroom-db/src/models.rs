//! Database row types, mapped directly from SQLite rows.
//! Distinct from newsroom-types wire models to keep the DB layer independent.
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub date_joined: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone)]
pub struct NewsRow {
    pub id: Uuid,
    pub category: Option<CategoryRow>,
    pub author_id: i64,
    pub author_username: String,
    pub title: String,
    pub slug: String,
    pub image: String,
    pub body: String,
    pub date_posted: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_breaking: bool,
    /// Likes with `is_liked` set.
    pub likes_count: i64,
    pub comments_count: i64,
}

/// Client-writable article columns, used for both insert and full update.
#[derive(Debug, Clone)]
pub struct NewsFields {
    pub category_id: Option<i64>,
    pub title: String,
    pub slug: String,
    pub image: String,
    pub body: String,
    pub is_breaking: bool,
}

#[derive(Debug, Default, Clone)]
pub struct NewsFilter {
    pub category_slug: Option<String>,
    pub is_breaking: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: i64,
    pub news_id: Uuid,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub name: String,
    pub email: String,
    pub comment: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CommentFields {
    pub news_id: Uuid,
    pub name: String,
    pub email: String,
    pub comment: String,
}

#[derive(Debug, Clone)]
pub struct LikeRow {
    pub id: i64,
    pub user_id: i64,
    pub news_id: Uuid,
    pub is_liked: bool,
    pub timestamp: DateTime<Utc>,
}

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub liked: bool,
    /// Every Like row for the article after the toggle.
    pub likes_count: i64,
}

// Timestamps are stored as fixed-width RFC 3339 text so that lexical order
// matches chronological order.

pub(crate) fn db_time(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn time_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
