use serde::{Deserialize, Serialize};

pub const BUNDLE_VERSION: &str = "1.0";

/// Self-contained export payload; also the accepted import shape.
///
/// On import only `articles` is required. Tag ids inside a bundle are local
/// to it: the import pass matches tags by slug, never by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    #[serde(default)]
    pub exported_at: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub total_articles: u64,
    #[serde(default)]
    pub total_tags: u64,
    #[serde(default)]
    pub tags: Option<Vec<BundleTag>>,
    pub articles: Vec<BundleArticle>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BundleTag {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BundleArticle {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<BundleTag>,
    #[serde(default)]
    pub seo_title: String,
    #[serde(default)]
    pub seo_description: String,
    #[serde(default)]
    pub seo_keywords: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::Bundle;

    #[test]
    fn minimal_import_shape_parses() {
        let bundle: Bundle =
            serde_json::from_str(r#"{"articles":[{"title":"A","content":"B"}]}"#)
                .expect("minimal bundle should parse");
        assert_eq!(bundle.articles.len(), 1);
        assert!(bundle.tags.is_none());
        assert!(bundle.articles[0].id.is_empty());
        assert!(bundle.articles[0].created_at.is_none());
    }

    #[test]
    fn missing_articles_sequence_is_a_parse_error() {
        let result: Result<Bundle, _> = serde_json::from_str(r#"{"tags":[]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn field_names_round_trip_as_camel_case() {
        let bundle: Bundle = serde_json::from_str(
            r#"{
                "exportedAt": "2026-01-01T00:00:00Z",
                "version": "1.0",
                "totalArticles": 1,
                "totalTags": 1,
                "tags": [{"id": "t-1", "name": "Rust", "slug": "rust"}],
                "articles": [{
                    "id": "a-1",
                    "title": "A",
                    "content": "B",
                    "tags": [{"id": "t-1", "name": "Rust", "slug": "rust"}],
                    "seoTitle": "s",
                    "createdAt": "2025-12-01T00:00:00Z"
                }]
            }"#,
        )
        .expect("full bundle should parse");
        assert_eq!(bundle.articles[0].seo_title, "s");

        let rendered = serde_json::to_string(&bundle).expect("bundle should serialize");
        assert!(rendered.contains("\"exportedAt\""));
        assert!(rendered.contains("\"seoTitle\""));
        assert!(rendered.contains("\"createdAt\""));
        assert!(!rendered.contains("\"updatedAt\""));
    }
}
