use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                username     TEXT NOT NULL UNIQUE,
                email        TEXT NOT NULL DEFAULT '',
                password     TEXT NOT NULL,
                date_joined  TEXT NOT NULL
            );

            CREATE TABLE categories (
                id    INTEGER PRIMARY KEY AUTOINCREMENT,
                name  TEXT NOT NULL UNIQUE,
                slug  TEXT NOT NULL UNIQUE
            );

            CREATE TABLE news (
                id           TEXT PRIMARY KEY,
                category_id  INTEGER REFERENCES categories(id) ON DELETE SET NULL,
                author_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title        TEXT NOT NULL,
                slug         TEXT NOT NULL UNIQUE,
                image        TEXT NOT NULL,
                body         TEXT NOT NULL,
                date_posted  TEXT NOT NULL,
                updated_at   TEXT NOT NULL,
                is_breaking  INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_news_date_posted ON news(date_posted);
            CREATE INDEX idx_news_category ON news(category_id);

            CREATE TABLE comments (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                news_id    TEXT NOT NULL REFERENCES news(id) ON DELETE CASCADE,
                user_id    INTEGER REFERENCES users(id) ON DELETE CASCADE,
                name       TEXT NOT NULL,
                email      TEXT NOT NULL,
                comment    TEXT NOT NULL,
                timestamp  TEXT NOT NULL
            );

            CREATE INDEX idx_comments_news ON comments(news_id, timestamp);

            CREATE TABLE likes (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                news_id    TEXT NOT NULL REFERENCES news(id) ON DELETE CASCADE,
                is_liked   INTEGER NOT NULL DEFAULT 1,
                timestamp  TEXT NOT NULL,
                UNIQUE(user_id, news_id)
            );

            CREATE INDEX idx_likes_news ON likes(news_id);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
