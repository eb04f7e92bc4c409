use std::collections::HashMap;

use serde::Serialize;

use crate::db::{ArticleRecord, TagRecord};

/// Excerpt length in Unicode scalar values, not bytes.
const EXCERPT_LIMIT: usize = 200;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDetail {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tag_ids: Vec<String>,
    pub seo_title: String,
    pub seo_description: String,
    pub seo_keywords: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub created_at: String,
    pub tags: Vec<ResolvedTag>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResolvedTag {
    pub id: String,
    pub name: String,
    pub slug: String,
}

/// Full client-facing view of a stored article. Total: malformed `tag_ids`
/// decode to an empty sequence instead of failing.
pub fn detail(record: &ArticleRecord) -> ArticleDetail {
    ArticleDetail {
        id: record.id.clone(),
        title: record.title.clone(),
        content: record.content.clone(),
        tag_ids: decode_tag_ids(&record.tag_ids),
        seo_title: record.seo_title.clone(),
        seo_description: record.seo_description.clone(),
        seo_keywords: record.seo_keywords.clone(),
        created_at: record.created_at.clone(),
        updated_at: record.updated_at.clone(),
    }
}

/// Summary view with excerpt and resolved tags. Ids missing from `lookup`
/// (deleted or legacy tags) are silently omitted.
pub fn summary(record: &ArticleRecord, lookup: &HashMap<String, TagRecord>) -> ArticleSummary {
    let tags = decode_tag_ids(&record.tag_ids)
        .into_iter()
        .filter_map(|tag_id| lookup.get(&tag_id))
        .map(|tag| ResolvedTag {
            id: tag.id.clone(),
            name: tag.name.clone(),
            slug: tag.slug.clone(),
        })
        .collect();
    ArticleSummary {
        id: record.id.clone(),
        title: record.title.clone(),
        excerpt: excerpt(&record.content),
        created_at: record.created_at.clone(),
        tags,
    }
}

pub fn tag_lookup(tags: &[TagRecord]) -> HashMap<String, TagRecord> {
    tags.iter()
        .map(|tag| (tag.id.clone(), tag.clone()))
        .collect()
}

pub fn decode_tag_ids(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

pub fn encode_tag_ids(tag_ids: &[String]) -> String {
    serde_json::to_string(tag_ids).expect("string sequences always serialize")
}

/// Markup-stripped preview of `content`, truncated to 200 code points with
/// an ellipsis marker only when the stripped text actually exceeded that.
pub fn excerpt(content: &str) -> String {
    let stripped = strip_markup(content);
    let mut chars = stripped.chars();
    let head: String = chars.by_ref().take(EXCERPT_LIMIT).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn strip_markup(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut in_tag = false;
    for ch in content.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            _ => out.push(ch),
        }
    }
    out
}
