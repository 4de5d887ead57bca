use rusqlite::ffi;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    /// A UNIQUE constraint rejected the write.
    #[error("unique constraint failed on {table}: {columns:?}")]
    Duplicate { table: String, columns: Vec<String> },

    /// A FOREIGN KEY constraint rejected the write.
    #[error("referenced row does not exist")]
    MissingReference,

    #[error("database lock poisoned")]
    Poisoned,

    #[error(transparent)]
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, msg) = &err {
            match code.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    if let Some((table, columns)) = msg.as_deref().and_then(parse_unique_violation) {
                        return DbError::Duplicate { table, columns };
                    }
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return DbError::MissingReference,
                _ => {}
            }
        }
        DbError::Sqlite(err)
    }
}

/// Parse SQLite's "UNIQUE constraint failed: likes.user_id, likes.news_id".
fn parse_unique_violation(msg: &str) -> Option<(String, Vec<String>)> {
    let cols = msg.strip_prefix("UNIQUE constraint failed: ")?;
    let mut table = None;
    let mut columns = Vec::new();
    for qualified in cols.split(", ") {
        let (t, c) = qualified.split_once('.')?;
        table.get_or_insert_with(|| t.to_string());
        columns.push(c.to_string());
    }
    Some((table?, columns))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_column_violation() {
        let (table, columns) =
            parse_unique_violation("UNIQUE constraint failed: categories.slug").unwrap();
        assert_eq!(table, "categories");
        assert_eq!(columns, vec!["slug"]);
    }

    #[test]
    fn parses_composite_violation() {
        let (table, columns) =
            parse_unique_violation("UNIQUE constraint failed: likes.user_id, likes.news_id")
                .unwrap();
        assert_eq!(table, "likes");
        assert_eq!(columns, vec!["user_id", "news_id"]);
    }

    #[test]
    fn ignores_other_messages() {
        assert!(parse_unique_violation("NOT NULL constraint failed: news.title").is_none());
    }
}
