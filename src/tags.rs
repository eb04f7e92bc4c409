use std::collections::HashMap;

use rusqlite::Connection;
use serde::Serialize;

use crate::app::AppError;
use crate::clock::{to_rfc3339, Clock};
use crate::db::{self, TagRecord};
use crate::ids::new_entity_id;
use crate::projection::decode_tag_ids;

/// A tag reference as supplied by callers: an existing id, a name+slug pair
/// for a possibly-new tag, or both (bundle entries carry all three).
#[derive(Debug, Clone, Default)]
pub struct TagInput<'a> {
    pub id: Option<&'a str>,
    pub name: Option<&'a str>,
    pub slug: Option<&'a str>,
}

pub struct TagRegistry<'a> {
    conn: &'a Connection,
    clock: &'a dyn Clock,
}

impl<'a> TagRegistry<'a> {
    pub fn new(conn: &'a Connection, clock: &'a dyn Clock) -> Self {
        Self { conn, clock }
    }

    /// Resolves a reference to the canonical stored tag, inserting at most
    /// one new row. An existing tag found by slug wins over any supplied id,
    /// which is what keeps slugs unique across imports.
    pub fn resolve(&self, input: &TagInput<'_>) -> Result<TagRecord, AppError> {
        // Slug is the de-duplication key, so a slug hit outranks whatever id
        // the caller supplied.
        let slug = trimmed(input.slug);
        if let Some(slug) = slug {
            if let Some(tag) = db::find_tag_by_slug(self.conn, slug)? {
                return Ok(tag);
            }
        }

        if let Some(id) = trimmed(input.id) {
            if let Some(tag) = db::get_tag(self.conn, id)? {
                return Ok(tag);
            }
        }

        let (name, slug) = match (trimmed(input.name), slug) {
            (Some(name), Some(slug)) => (name, slug),
            _ => {
                return Err(AppError::Validation(
                    "tag reference requires an existing id or a name and slug".to_string(),
                ))
            }
        };

        let tag = TagRecord {
            id: new_entity_id(),
            name: name.to_string(),
            slug: slug.to_string(),
            created_at: to_rfc3339(self.clock.now()),
        };
        match db::insert_tag(self.conn, &tag) {
            Ok(()) => Ok(tag),
            // A concurrent writer may have claimed the slug between the
            // lookup and the insert; the UNIQUE constraint rejects the
            // second insert and the re-read returns the winner.
            Err(err) if is_constraint_violation(&err) => db::find_tag_by_slug(self.conn, slug)?
                .ok_or(AppError::Db(err)),
            Err(err) => Err(AppError::Db(err)),
        }
    }
}

fn trimmed(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _)
            if code.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TagUsage {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub article_count: u64,
}

/// Per-tag referencing-article counts. Tags with zero articles stay listed;
/// dangling ids inside articles simply count toward nothing.
pub fn usage_counts(conn: &Connection) -> Result<Vec<TagUsage>, AppError> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for article in db::list_articles(conn)? {
        for tag_id in decode_tag_ids(&article.tag_ids) {
            *counts.entry(tag_id).or_insert(0) += 1;
        }
    }
    Ok(db::list_tags(conn)?
        .into_iter()
        .map(|tag| {
            let article_count = counts.get(&tag.id).copied().unwrap_or(0);
            TagUsage {
                id: tag.id,
                name: tag.name,
                slug: tag.slug,
                article_count,
            }
        })
        .collect())
}
