use rusqlite::{OptionalExtension, Row};

use crate::models::CategoryRow;
use crate::{Database, Result};

impl Database {
    pub fn list_categories(&self) -> Result<Vec<CategoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name, slug FROM categories ORDER BY id")?;
            let rows = stmt
                .query_map([], map_category)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_category(&self, id: i64) -> Result<Option<CategoryRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, name, slug FROM categories WHERE id = ?1",
                    [id],
                    map_category,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn insert_category(&self, name: &str, slug: &str) -> Result<CategoryRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO categories (name, slug) VALUES (?1, ?2)",
                (name, slug),
            )?;
            Ok(CategoryRow {
                id: conn.last_insert_rowid(),
                name: name.to_string(),
                slug: slug.to_string(),
            })
        })
    }

    /// Returns `None` when no category has this id.
    pub fn update_category(&self, id: i64, name: &str, slug: &str) -> Result<Option<CategoryRow>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE categories SET name = ?1, slug = ?2 WHERE id = ?3",
                (name, slug, id),
            )?;
            Ok((changed > 0).then(|| CategoryRow {
                id,
                name: name.to_string(),
                slug: slug.to_string(),
            }))
        })
    }

    /// Dependent articles keep existing with their category cleared.
    pub fn delete_category(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM categories WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}

fn map_category(row: &Row<'_>) -> rusqlite::Result<CategoryRow> {
    Ok(CategoryRow {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
    })
}
