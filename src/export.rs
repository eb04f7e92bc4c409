use rusqlite::Connection;

use crate::app::AppError;
use crate::bundle::{Bundle, BundleArticle, BundleTag, BUNDLE_VERSION};
use crate::clock::{to_rfc3339, Clock};
use crate::db;
use crate::projection::{decode_tag_ids, tag_lookup};

/// Gathers every article and tag into a self-contained, re-importable
/// snapshot. Embedded tag objects carry id, name, and slug so the receiving
/// side can reconcile by slug without knowing this store's ids. Dangling tag
/// ids on articles are dropped by the join, never an error.
pub fn export_bundle(conn: &Connection, clock: &dyn Clock) -> Result<Bundle, AppError> {
    let articles = db::list_articles(conn)?;
    let tags = db::list_tags(conn)?;
    let lookup = tag_lookup(&tags);

    let bundle_articles: Vec<BundleArticle> = articles
        .iter()
        .map(|article| {
            let resolved = decode_tag_ids(&article.tag_ids)
                .into_iter()
                .filter_map(|tag_id| lookup.get(&tag_id))
                .map(|tag| BundleTag {
                    id: tag.id.clone(),
                    name: tag.name.clone(),
                    slug: tag.slug.clone(),
                })
                .collect();
            BundleArticle {
                id: article.id.clone(),
                title: article.title.clone(),
                content: article.content.clone(),
                tags: resolved,
                seo_title: article.seo_title.clone(),
                seo_description: article.seo_description.clone(),
                seo_keywords: article.seo_keywords.clone(),
                created_at: Some(article.created_at.clone()),
                updated_at: Some(article.updated_at.clone()),
            }
        })
        .collect();

    Ok(Bundle {
        exported_at: to_rfc3339(clock.now()),
        version: BUNDLE_VERSION.to_string(),
        total_articles: bundle_articles.len() as u64,
        total_tags: tags.len() as u64,
        tags: Some(
            tags.iter()
                .map(|tag| BundleTag {
                    id: tag.id.clone(),
                    name: tag.name.clone(),
                    slug: tag.slug.clone(),
                })
                .collect(),
        ),
        articles: bundle_articles,
    })
}
