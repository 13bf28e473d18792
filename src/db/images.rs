//! Image records and the queries that return them.

use rusqlite::{params, OptionalExtension, Row};

use super::error::{is_constraint_violation, StoreError, StoreResult};
use super::{now_timestamp, Database};

const IMAGE_COLUMNS: &str = "i.id, i.filename, i.original_name, i.path, i.created_date, i.updated_date";

/// A stored image as recorded in the `images` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub id: i64,
    /// Unique name of the file inside the library.
    pub filename: String,
    /// Name the user imported the file under; shown in the UI.
    pub original_name: String,
    /// Location of the stored bytes.
    pub path: String,
    pub created_date: String,
    pub updated_date: String,
}

impl ImageRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            filename: row.get(1)?,
            original_name: row.get(2)?,
            path: row.get(3)?,
            created_date: row.get(4)?,
            updated_date: row.get(5)?,
        })
    }
}

/// Escape `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'` pattern.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Treat empty strings the same as "not given".
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl Database {
    // ========================================================================
    // Image CRUD
    // ========================================================================

    pub fn create_image(&self, filename: &str, original_name: &str, path: &str) -> StoreResult<i64> {
        let now = now_timestamp();
        let result = self.conn.execute(
            r#"
            INSERT INTO images (filename, original_name, path, created_date, updated_date)
            VALUES (?1, ?2, ?3, ?4, ?4)
            "#,
            params![filename, original_name, path, now],
        );
        match result {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(e) if is_constraint_violation(&e) => {
                Err(StoreError::DuplicateFilename(filename.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Rename an image. Returns false when neither field is given or the id
    /// does not exist. `updated_date` never moves backwards.
    pub fn update_image(
        &self,
        id: i64,
        filename: Option<&str>,
        original_name: Option<&str>,
    ) -> StoreResult<bool> {
        let filename = non_empty(filename);
        let original_name = non_empty(original_name);
        if filename.is_none() && original_name.is_none() {
            return Ok(false);
        }

        let result = self.conn.execute(
            r#"
            UPDATE images
            SET filename = COALESCE(?1, filename),
                original_name = COALESCE(?2, original_name),
                updated_date = MAX(updated_date, ?3)
            WHERE id = ?4
            "#,
            params![filename, original_name, now_timestamp(), id],
        );
        match result {
            Ok(changed) => Ok(changed > 0),
            Err(e) if is_constraint_violation(&e) => Err(StoreError::DuplicateFilename(
                filename.unwrap_or_default().to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete an image; its tag associations go with it.
    pub fn delete_image(&self, id: i64) -> StoreResult<bool> {
        let removed = self.conn.execute("DELETE FROM images WHERE id = ?", [id])?;
        Ok(removed > 0)
    }

    pub fn get_image(&self, id: i64) -> StoreResult<Option<ImageRecord>> {
        let sql = format!("SELECT {} FROM images i WHERE i.id = ?", IMAGE_COLUMNS);
        let record = self
            .conn
            .query_row(&sql, [id], ImageRecord::from_row)
            .optional()?;
        Ok(record)
    }

    /// All images, newest first.
    pub fn list_images(&self) -> StoreResult<Vec<ImageRecord>> {
        let sql = format!(
            "SELECT {} FROM images i ORDER BY i.created_date DESC, i.id DESC",
            IMAGE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let images = stmt
            .query_map([], ImageRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(images)
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Images whose filename, original name or any tag contains `query`
    /// (case-insensitive, unanchored), newest first. Each image appears once.
    pub fn search(&self, query: &str) -> StoreResult<Vec<ImageRecord>> {
        let pattern = format!("%{}%", escape_like(query));
        let sql = format!(
            r#"
            SELECT {}
            FROM images i
            WHERE i.filename LIKE ?1 ESCAPE '\'
               OR i.original_name LIKE ?1 ESCAPE '\'
               OR EXISTS (
                    SELECT 1
                    FROM image_tags it
                    JOIN tags t ON t.id = it.tag_id
                    WHERE it.image_id = i.id AND t.name LIKE ?1 ESCAPE '\'
               )
            ORDER BY i.created_date DESC, i.id DESC
            "#,
            IMAGE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let images = stmt
            .query_map([pattern], ImageRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(images)
    }

    /// Images carrying the tag with exactly this name (after trimming),
    /// newest first.
    pub fn images_for_tag(&self, tag_name: &str) -> StoreResult<Vec<ImageRecord>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM images i
            JOIN image_tags it ON it.image_id = i.id
            JOIN tags t ON t.id = it.tag_id
            WHERE t.name = ?
            ORDER BY i.created_date DESC, i.id DESC
            "#,
            IMAGE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let images = stmt
            .query_map([tag_name.trim()], ImageRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(images)
    }
}
