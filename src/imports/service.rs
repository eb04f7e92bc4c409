use std::collections::HashMap;

use rusqlite::Connection;
use serde::Serialize;

use crate::app::AppError;
use crate::bundle::{Bundle, BundleArticle};
use crate::clock::{to_rfc3339, Clock};
use crate::db::{self, ArticleInsert};
use crate::ids::new_entity_id;
use crate::projection::encode_tag_ids;
use crate::tags::{TagInput, TagRegistry};

pub struct ImportService<'a> {
    conn: &'a Connection,
    clock: &'a dyn Clock,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub status: String,
    pub imported_count: u64,
    pub skipped_count: u64,
    pub errors: Vec<String>,
}

enum Outcome {
    Imported,
    Skipped(String),
}

impl<'a> ImportService<'a> {
    pub fn new(conn: &'a Connection, clock: &'a dyn Clock) -> Self {
        Self { conn, clock }
    }

    /// Merges a bundle into the store. Articles are processed in supplied
    /// order and fail independently; nothing done for an earlier article is
    /// undone by a later failure.
    pub fn import(&self, bundle: &Bundle) -> Result<ImportReport, AppError> {
        let registry = TagRegistry::new(self.conn, self.clock);
        let mut imported: u64 = 0;
        let mut skipped: u64 = 0;
        let mut errors = Vec::new();

        // Bundle-local tag id -> canonical stored id. Lives only for the
        // duration of this call.
        let mut mapping: HashMap<String, String> = HashMap::new();
        if let Some(tags) = &bundle.tags {
            for entry in tags {
                let input = TagInput {
                    id: None,
                    name: Some(&entry.name),
                    slug: Some(&entry.slug),
                };
                match registry.resolve(&input) {
                    Ok(tag) => {
                        if !entry.id.trim().is_empty() {
                            mapping.insert(entry.id.clone(), tag.id);
                        }
                    }
                    Err(err) => errors.push(format!("tag '{}': {}", entry.slug, err)),
                }
            }
        }

        for (index, article) in bundle.articles.iter().enumerate() {
            match self.import_article(&registry, &mapping, index, article) {
                Ok(Outcome::Imported) => imported += 1,
                Ok(Outcome::Skipped(message)) => {
                    skipped += 1;
                    errors.push(message);
                }
                Err(err) => {
                    skipped += 1;
                    errors.push(format!("article '{}': {}", article.title.trim(), err));
                }
            }
        }

        let status = if imported > 0 { "success" } else { "partial" };
        Ok(ImportReport {
            status: status.to_string(),
            imported_count: imported,
            skipped_count: skipped,
            errors,
        })
    }

    fn import_article(
        &self,
        registry: &TagRegistry<'_>,
        mapping: &HashMap<String, String>,
        index: usize,
        entry: &BundleArticle,
    ) -> Result<Outcome, AppError> {
        let title = entry.title.trim();
        let content = entry.content.trim();
        if title.is_empty() || content.is_empty() {
            return Ok(Outcome::Skipped(format!(
                "article #{index}: title and content are required"
            )));
        }
        if title.chars().count() > 255 {
            return Ok(Outcome::Skipped(format!(
                "article '{title}': title exceeds 255 characters"
            )));
        }

        // Ids are immutable and imports never overwrite; an id collision is
        // an accidental double-import, not an update.
        let supplied_id = entry.id.trim();
        if !supplied_id.is_empty() && db::article_exists(self.conn, supplied_id)? {
            return Ok(Outcome::Skipped(format!(
                "article '{title}': id already exists, skipped"
            )));
        }

        let mut tag_ids = Vec::new();
        for tag in &entry.tags {
            if let Some(canonical) = mapping.get(tag.id.as_str()) {
                tag_ids.push(canonical.clone());
                continue;
            }
            if tag.slug.trim().is_empty() {
                // Not covered by the tag pass and nothing to resolve by.
                continue;
            }
            match registry.resolve(&TagInput {
                id: None,
                name: Some(&tag.name),
                slug: Some(&tag.slug),
            }) {
                Ok(resolved) => tag_ids.push(resolved.id),
                Err(AppError::Validation(_)) => {}
                Err(err) => return Err(err),
            }
        }

        let now = to_rfc3339(self.clock.now());
        let id = if supplied_id.is_empty() {
            new_entity_id()
        } else {
            supplied_id.to_string()
        };
        let created_at = non_empty(entry.created_at.as_deref()).unwrap_or(&now);
        let updated_at = non_empty(entry.updated_at.as_deref()).unwrap_or(&now);

        db::insert_article(
            self.conn,
            &ArticleInsert {
                id: &id,
                title,
                content,
                tag_ids: &encode_tag_ids(&tag_ids),
                seo_title: entry.seo_title.trim(),
                seo_description: entry.seo_description.trim(),
                seo_keywords: entry.seo_keywords.trim(),
                created_at,
                updated_at,
            },
        )?;
        Ok(Outcome::Imported)
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}
