use std::error::Error;
use std::fmt;
use std::path::Path;

use rusqlite::Connection;

use crate::bundle::Bundle;
use crate::clock::{to_rfc3339, Clock, SystemClock};
use crate::db::{self, ArticleInsert, ArticleUpdate, CommentRecord, TagRecord, ViewLogRecord};
use crate::export::export_bundle;
use crate::ids::new_entity_id;
use crate::imports::{ImportReport, ImportService};
use crate::projection::{self, decode_tag_ids, encode_tag_ids, ArticleDetail, ArticleSummary};
use crate::tags::{self, TagInput, TagRegistry, TagUsage};
use crate::views::{ViewService, ViewStats};

pub struct App {
    conn: Connection,
    clock: Box<dyn Clock>,
}

#[derive(Debug, Clone, Default)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub tag_ids: Vec<String>,
    pub seo_title: String,
    pub seo_description: String,
    pub seo_keywords: String,
}

#[derive(Debug, Clone, Default)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tag_ids: Option<Vec<String>>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_keywords: Option<String>,
}

impl ArticlePatch {
    fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.content.is_some()
            || self.tag_ids.is_some()
            || self.seo_title.is_some()
            || self.seo_description.is_some()
            || self.seo_keywords.is_some()
    }
}

impl App {
    pub fn open(db_path: &str) -> Result<Self, AppError> {
        Self::open_with_clock(db_path, Box::new(SystemClock))
    }

    pub fn open_with_clock(db_path: &str, clock: Box<dyn Clock>) -> Result<Self, AppError> {
        ensure_parent_dir(db_path)?;
        let conn = db::open_connection(db_path)?;
        Ok(Self { conn, clock })
    }

    pub fn create_article(&self, article: NewArticle) -> Result<ArticleDetail, AppError> {
        let title = validated_title(&article.title)?;
        let content = article.content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("content is required".to_string()));
        }

        let tag_ids = self.resolve_tag_ids(&article.tag_ids)?;
        let now = to_rfc3339(self.clock.now());
        let id = new_entity_id();
        db::insert_article(
            &self.conn,
            &ArticleInsert {
                id: &id,
                title: &title,
                content,
                tag_ids: &encode_tag_ids(&tag_ids),
                seo_title: article.seo_title.trim(),
                seo_description: article.seo_description.trim(),
                seo_keywords: article.seo_keywords.trim(),
                created_at: &now,
                updated_at: &now,
            },
        )?;
        self.require_detail(&id)
    }

    pub fn update_article(&self, id: &str, patch: ArticlePatch) -> Result<ArticleDetail, AppError> {
        if !patch.has_changes() {
            return Err(AppError::Validation(
                "update requires at least one field change".to_string(),
            ));
        }
        let current = db::get_article(&self.conn, id)?
            .ok_or_else(|| AppError::NotFound(format!("article '{id}'")))?;

        let title = match patch.title.as_deref() {
            Some(raw) => validated_title(raw)?,
            None => current.title,
        };
        let content = match patch.content.as_deref() {
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(AppError::Validation("content is required".to_string()));
                }
                trimmed.to_string()
            }
            None => current.content,
        };
        let tag_ids = match &patch.tag_ids {
            Some(raw) => encode_tag_ids(&self.resolve_tag_ids(raw)?),
            None => current.tag_ids,
        };
        let seo_title = patch
            .seo_title
            .map_or(current.seo_title, |raw| raw.trim().to_string());
        let seo_description = patch
            .seo_description
            .map_or(current.seo_description, |raw| raw.trim().to_string());
        let seo_keywords = patch
            .seo_keywords
            .map_or(current.seo_keywords, |raw| raw.trim().to_string());

        db::update_article(
            &self.conn,
            id,
            &ArticleUpdate {
                title: &title,
                content: &content,
                tag_ids: &tag_ids,
                seo_title: &seo_title,
                seo_description: &seo_description,
                seo_keywords: &seo_keywords,
                updated_at: &to_rfc3339(self.clock.now()),
            },
        )?;
        self.require_detail(id)
    }

    pub fn delete_article(&self, id: &str) -> Result<(), AppError> {
        if !db::delete_article(&self.conn, id)? {
            return Err(AppError::NotFound(format!("article '{id}'")));
        }
        Ok(())
    }

    pub fn show_article(&self, id: &str) -> Result<Option<ArticleDetail>, AppError> {
        Ok(db::get_article(&self.conn, id)?
            .as_ref()
            .map(projection::detail))
    }

    pub fn list_articles(&self) -> Result<Vec<ArticleDetail>, AppError> {
        Ok(db::list_articles(&self.conn)?
            .iter()
            .map(projection::detail)
            .collect())
    }

    /// Summary views, newest first, optionally restricted to articles that
    /// reference `tag_id`.
    pub fn list_summaries(&self, tag_id: Option<&str>) -> Result<Vec<ArticleSummary>, AppError> {
        let lookup = projection::tag_lookup(&db::list_tags(&self.conn)?);
        Ok(db::list_articles(&self.conn)?
            .iter()
            .filter(|article| match tag_id {
                Some(wanted) => decode_tag_ids(&article.tag_ids).iter().any(|id| id == wanted),
                None => true,
            })
            .map(|article| projection::summary(article, &lookup))
            .collect())
    }

    pub fn create_tag(&self, name: &str, slug: &str) -> Result<TagRecord, AppError> {
        let name = name.trim();
        let slug = slug.trim();
        if name.is_empty() || slug.is_empty() {
            return Err(AppError::Validation(
                "tag name and slug are required".to_string(),
            ));
        }
        if let Some(existing) = db::find_tag_by_slug(&self.conn, slug)? {
            return Err(AppError::Conflict(format!(
                "tag slug '{}' already exists as '{}'",
                slug, existing.id
            )));
        }
        let registry = TagRegistry::new(&self.conn, self.clock.as_ref());
        registry.resolve(&TagInput {
            id: None,
            name: Some(name),
            slug: Some(slug),
        })
    }

    pub fn delete_tag(&self, id: &str) -> Result<(), AppError> {
        // Weak references: articles keep their tag_ids and drop the id on
        // render.
        if !db::delete_tag(&self.conn, id)? {
            return Err(AppError::NotFound(format!("tag '{id}'")));
        }
        Ok(())
    }

    pub fn list_tags(&self) -> Result<Vec<TagRecord>, AppError> {
        Ok(db::list_tags(&self.conn)?)
    }

    pub fn tag_stats(&self) -> Result<Vec<TagUsage>, AppError> {
        tags::usage_counts(&self.conn)
    }

    pub fn add_comment(
        &self,
        article_id: &str,
        user_name: &str,
        user_email: Option<&str>,
        content: &str,
    ) -> Result<CommentRecord, AppError> {
        let user_name = user_name.trim();
        let content = content.trim();
        if user_name.is_empty() || content.is_empty() {
            return Err(AppError::Validation(
                "comment requires a user name and content".to_string(),
            ));
        }
        if !db::article_exists(&self.conn, article_id)? {
            return Err(AppError::NotFound(format!("article '{article_id}'")));
        }
        let id = db::insert_comment(
            &self.conn,
            article_id,
            user_name,
            user_email.map(str::trim).filter(|value| !value.is_empty()),
            content,
            &to_rfc3339(self.clock.now()),
        )?;
        db::get_comment(&self.conn, id)?
            .ok_or_else(|| AppError::NotFound(format!("comment '{id}'")))
    }

    pub fn list_comments(&self, article_id: &str) -> Result<Vec<CommentRecord>, AppError> {
        Ok(db::list_comments(&self.conn, article_id)?)
    }

    pub fn record_view(
        &self,
        article_id: &str,
        ip_address: &str,
        user_agent: Option<&str>,
    ) -> Result<(), AppError> {
        ViewService::new(&self.conn, self.clock.as_ref()).record(article_id, ip_address, user_agent)
    }

    pub fn view_stats(&self) -> Result<ViewStats, AppError> {
        ViewService::new(&self.conn, self.clock.as_ref()).stats()
    }

    pub fn view_logs(
        &self,
        article_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<ViewLogRecord>, AppError> {
        ViewService::new(&self.conn, self.clock.as_ref()).logs(article_id, limit)
    }

    pub fn import_file(&self, path: &str) -> Result<ImportReport, AppError> {
        let payload = std::fs::read_to_string(path)?;
        self.import_json(&payload)
    }

    /// Malformed payloads (unparseable JSON, missing `articles`) fail the
    /// whole call before any store write; per-article problems end up in the
    /// report instead.
    pub fn import_json(&self, payload: &str) -> Result<ImportReport, AppError> {
        let bundle: Bundle = serde_json::from_str(payload)?;
        ImportService::new(&self.conn, self.clock.as_ref()).import(&bundle)
    }

    pub fn export(&self) -> Result<Bundle, AppError> {
        export_bundle(&self.conn, self.clock.as_ref())
    }

    fn resolve_tag_ids(&self, tag_ids: &[String]) -> Result<Vec<String>, AppError> {
        let registry = TagRegistry::new(&self.conn, self.clock.as_ref());
        let mut resolved = Vec::with_capacity(tag_ids.len());
        for id in tag_ids {
            let tag = registry
                .resolve(&TagInput {
                    id: Some(id),
                    name: None,
                    slug: None,
                })
                .map_err(|err| match err {
                    AppError::Validation(_) => {
                        AppError::Validation(format!("unknown tag id '{id}'"))
                    }
                    other => other,
                })?;
            resolved.push(tag.id);
        }
        Ok(resolved)
    }

    fn require_detail(&self, id: &str) -> Result<ArticleDetail, AppError> {
        db::get_article(&self.conn, id)?
            .as_ref()
            .map(projection::detail)
            .ok_or_else(|| AppError::NotFound(format!("article '{id}'")))
    }
}

fn validated_title(raw: &str) -> Result<String, AppError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    if title.chars().count() > 255 {
        return Err(AppError::Validation(
            "title must not exceed 255 characters".to_string(),
        ));
    }
    Ok(title.to_string())
}

fn ensure_parent_dir(path: &str) -> Result<(), AppError> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    Conflict(String),
    Db(rusqlite::Error),
    Json(serde_json::Error),
    Io(std::io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(message) => write!(f, "{}", message),
            AppError::NotFound(what) => write!(f, "{} not found", what),
            AppError::Conflict(message) => write!(f, "{}", message),
            AppError::Db(err) => write!(f, "database error: {}", err),
            AppError::Json(err) => write!(f, "JSON parse error: {}", err),
            AppError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Validation(_) | AppError::NotFound(_) | AppError::Conflict(_) => None,
            AppError::Db(err) => Some(err),
            AppError::Json(err) => Some(err),
            AppError::Io(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(value: rusqlite::Error) -> Self {
        AppError::Db(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        AppError::Json(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Io(value)
    }
}

#[cfg(test)]
mod tests;
