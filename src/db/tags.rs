//! Tags and image/tag associations.

use rusqlite::{params, OptionalExtension, Row};

use super::error::{is_constraint_violation, StoreError, StoreResult};
use super::Database;

/// A tag name from the shared vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

impl Tag {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }
}

impl Database {
    // ========================================================================
    // Tag vocabulary
    // ========================================================================

    /// Return the id of the tag called `name`, creating it if needed.
    /// Names are compared exactly (case-sensitive) after trimming.
    pub fn create_or_get_tag(&self, name: &str) -> StoreResult<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyTagName);
        }

        match self.conn.execute("INSERT INTO tags (name) VALUES (?)", [name]) {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(e) if is_constraint_violation(&e) => {
                let id = self
                    .conn
                    .query_row("SELECT id FROM tags WHERE name = ?", [name], |row| row.get(0))?;
                Ok(id)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_tag_by_name(&self, name: &str) -> StoreResult<Option<Tag>> {
        let tag = self
            .conn
            .query_row("SELECT id, name FROM tags WHERE name = ?", [name.trim()], Tag::from_row)
            .optional()?;
        Ok(tag)
    }

    pub fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM tags ORDER BY name")?;
        let tags = stmt
            .query_map([], Tag::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    // ========================================================================
    // Associations
    // ========================================================================

    /// Attach a tag to an image. Returns false if the pair already exists.
    pub fn link_tag(&self, image_id: i64, tag_id: i64) -> StoreResult<bool> {
        // OR IGNORE covers the primary key only; a missing endpoint still
        // fails the foreign key check.
        let result = self.conn.execute(
            "INSERT OR IGNORE INTO image_tags (image_id, tag_id) VALUES (?, ?)",
            params![image_id, tag_id],
        );
        match result {
            Ok(inserted) => Ok(inserted > 0),
            Err(e) if is_constraint_violation(&e) => {
                Err(StoreError::MissingEndpoint { image_id, tag_id })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn unlink_tag(&self, image_id: i64, tag_id: i64) -> StoreResult<bool> {
        let removed = self.conn.execute(
            "DELETE FROM image_tags WHERE image_id = ? AND tag_id = ?",
            params![image_id, tag_id],
        )?;
        Ok(removed > 0)
    }

    /// Tags on one image, by name.
    pub fn tags_for_image(&self, image_id: i64) -> StoreResult<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT t.id, t.name
            FROM tags t
            JOIN image_tags it ON it.tag_id = t.id
            WHERE it.image_id = ?
            ORDER BY t.name
            "#,
        )?;
        let tags = stmt
            .query_map([image_id], Tag::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    /// Get-or-create the tag `name` and attach it to the image.
    pub fn tag_image(&self, image_id: i64, name: &str) -> StoreResult<bool> {
        let tag_id = self.create_or_get_tag(name)?;
        self.link_tag(image_id, tag_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    #[test]
    fn test_create_tag_twice_returns_same_id() {
        let db = test_db();
        let first = db.create_or_get_tag("funny").unwrap();
        let second = db.create_or_get_tag("funny").unwrap();
        assert_eq!(first, second);

        let tags = db.list_tags().unwrap();
        assert_eq!(tags, vec![Tag { id: first, name: "funny".to_string() }]);
    }

    #[test]
    fn test_tag_names_are_case_sensitive_and_trimmed() {
        let db = test_db();
        let lower = db.create_or_get_tag("cats").unwrap();
        let upper = db.create_or_get_tag("Cats").unwrap();
        let padded = db.create_or_get_tag("  cats ").unwrap();

        assert_ne!(lower, upper);
        assert_eq!(lower, padded);
        assert_eq!(db.list_tags().unwrap().len(), 2);
    }

    #[test]
    fn test_empty_tag_name_is_rejected() {
        let db = test_db();
        assert!(matches!(db.create_or_get_tag("   "), Err(StoreError::EmptyTagName)));
        assert!(db.list_tags().unwrap().is_empty());
    }

    #[test]
    fn test_get_tag_by_name() {
        let db = test_db();
        let id = db.create_or_get_tag("funny").unwrap();

        let tag = db.get_tag_by_name("funny").unwrap().unwrap();
        assert_eq!(tag.id, id);
        assert_eq!(tag.name, "funny");
        assert!(db.get_tag_by_name("Funny").unwrap().is_none());
    }

    #[test]
    fn test_lookup_trims_like_create() {
        let db = test_db();
        let image = db.create_image("a.jpg", "a.jpg", "/a").unwrap();
        db.tag_image(image, " funny ").unwrap();

        let tag = db.get_tag_by_name(" funny ").unwrap().unwrap();
        assert_eq!(tag.name, "funny");
        assert_eq!(db.get_tag_by_name("funny").unwrap(), Some(tag));
    }

    #[test]
    fn test_list_tags_sorted_by_name() {
        let db = test_db();
        for name in ["zebra", "apple", "mango"] {
            db.create_or_get_tag(name).unwrap();
        }
        let names: Vec<String> = db.list_tags().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["apple", "mango", "zebra"]);
    }

    #[test]
    fn test_link_twice_reports_existing() {
        let db = test_db();
        let image = db.create_image("a.jpg", "a.jpg", "/a").unwrap();
        let tag = db.create_or_get_tag("funny").unwrap();

        assert!(db.link_tag(image, tag).unwrap());
        assert!(!db.link_tag(image, tag).unwrap());
        assert_eq!(db.stats().unwrap().association_count, 1);
    }

    #[test]
    fn test_link_missing_endpoint() {
        let db = test_db();
        let tag = db.create_or_get_tag("funny").unwrap();

        let err = db.link_tag(404, tag).unwrap_err();
        assert!(matches!(err, StoreError::MissingEndpoint { image_id: 404, .. }));
    }

    #[test]
    fn test_unlink() {
        let db = test_db();
        let image = db.create_image("a.jpg", "a.jpg", "/a").unwrap();
        let tag = db.create_or_get_tag("funny").unwrap();
        db.link_tag(image, tag).unwrap();

        assert!(db.unlink_tag(image, tag).unwrap());
        assert!(!db.unlink_tag(image, tag).unwrap());
        assert!(db.tags_for_image(image).unwrap().is_empty());
        // The tag stays in the vocabulary
        assert!(db.get_tag_by_name("funny").unwrap().is_some());
    }

    #[test]
    fn test_tags_for_image_sorted() {
        let db = test_db();
        let image = db.create_image("a.jpg", "a.jpg", "/a").unwrap();
        let other = db.create_image("b.jpg", "b.jpg", "/b").unwrap();
        db.tag_image(image, "reaction").unwrap();
        db.tag_image(image, "cats").unwrap();
        db.tag_image(other, "dogs").unwrap();

        let names: Vec<String> = db
            .tags_for_image(image)
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["cats", "reaction"]);
    }

    #[test]
    fn test_deleting_tag_cascades() {
        let db = test_db();
        let image = db.create_image("a.jpg", "a.jpg", "/a").unwrap();
        let tag = db.create_or_get_tag("funny").unwrap();
        db.link_tag(image, tag).unwrap();

        db.conn.execute("DELETE FROM tags WHERE id = ?", [tag]).unwrap();
        assert_eq!(db.stats().unwrap().association_count, 0);
    }
}
