use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Params, Row};

use crate::models::{UserRow, db_time, time_at};
use crate::{Database, Result};

const USER_COLUMNS: &str = "id, username, email, password, date_joined";

impl Database {
    pub fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<UserRow> {
        let now = Utc::now();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password, date_joined) VALUES (?1, ?2, ?3, ?4)",
                (username, email, password_hash, db_time(&now)),
            )?;
            Ok(UserRow {
                id: conn.last_insert_rowid(),
                username: username.to_string(),
                email: email.to_string(),
                password: password_hash.to_string(),
                date_joined: now,
            })
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", [username]))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", [id]))
    }
}

fn query_user<P: Params>(conn: &Connection, column: &str, params: P) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    let row = conn.query_row(&sql, params, map_user).optional()?;
    Ok(row)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        date_joined: time_at(row, 4)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbError};

    #[test]
    fn usernames_are_unique() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("alice", "alice@example.com", "hash").unwrap();

        let err = db.create_user("alice", "", "hash").unwrap_err();
        match err {
            DbError::Duplicate { table, columns } => {
                assert_eq!(table, "users");
                assert_eq!(columns, vec!["username"]);
            }
            other => panic!("expected duplicate, got {other:?}"),
        }
    }

    #[test]
    fn looks_up_by_name_and_id() {
        let db = Database::open_in_memory().unwrap();
        let alice = db.create_user("alice", "alice@example.com", "hash").unwrap();

        let by_name = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(by_name.id, alice.id);
        assert_eq!(by_name.email, "alice@example.com");

        let by_id = db.get_user_by_id(alice.id).unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        assert!(db.get_user_by_username("bob").unwrap().is_none());
    }
}
