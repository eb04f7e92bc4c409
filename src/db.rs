use std::collections::HashMap;
use std::time::Duration;

use rusqlite::{params, Connection, DatabaseName, OptionalExtension, Result};
use serde::Serialize;

pub const CURRENT_SCHEMA_VERSION: i64 = 2;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 2] = [
    Migration {
        version: 1,
        name: "baseline_content_schema_v1",
        sql: r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS articles (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    tag_ids TEXT NOT NULL DEFAULT '[]',
    seo_title TEXT NOT NULL DEFAULT '',
    seo_description TEXT NOT NULL DEFAULT '',
    seo_keywords TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tags (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_articles_created_at ON articles(created_at);
"#,
    },
    Migration {
        version: 2,
        name: "engagement_v1",
        sql: r#"
CREATE TABLE IF NOT EXISTS article_views (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    article_id TEXT NOT NULL,
    ip_address TEXT NOT NULL,
    user_agent TEXT,
    viewed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS comments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    article_id TEXT NOT NULL,
    user_name TEXT NOT NULL,
    user_email TEXT,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_article_views_article_id ON article_views(article_id);
CREATE INDEX IF NOT EXISTS idx_article_views_viewed_at ON article_views(viewed_at);
CREATE INDEX IF NOT EXISTS idx_comments_article_id ON comments(article_id);
"#,
    },
];

pub fn open_connection(path: &str) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    configure_for_speed(&conn)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

fn configure_for_speed(conn: &Connection) -> Result<()> {
    conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
    conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")?;
    conn.pragma_update(None::<DatabaseName>, "temp_store", "MEMORY")?;
    conn.pragma_update(None::<DatabaseName>, "busy_timeout", 5000i64)?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
"#,
    )?;

    for migration in MIGRATIONS {
        let already_applied: Option<i64> = tx
            .query_row(
                "SELECT version FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |row| row.get(0),
            )
            .optional()?;

        if already_applied.is_some() {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![
                migration.version,
                migration.name,
                crate::clock::to_rfc3339(time::OffsetDateTime::now_utc())
            ],
        )?;
    }

    tx.execute(
        r#"
INSERT INTO meta (key, value)
VALUES ('schema_version', ?1)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
        params![CURRENT_SCHEMA_VERSION.to_string()],
    )?;

    tx.commit()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    /// JSON array of tag ids as stored. Weak references; decode at read time.
    pub tag_ids: String,
    pub seo_title: String,
    pub seo_description: String,
    pub seo_keywords: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct ArticleInsert<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub content: &'a str,
    pub tag_ids: &'a str,
    pub seo_title: &'a str,
    pub seo_description: &'a str,
    pub seo_keywords: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

pub fn insert_article(conn: &Connection, args: &ArticleInsert<'_>) -> Result<()> {
    conn.execute(
        r#"
INSERT INTO articles (
    id, title, content, tag_ids, seo_title, seo_description, seo_keywords,
    created_at, updated_at
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
"#,
        params![
            args.id,
            args.title,
            args.content,
            args.tag_ids,
            args.seo_title,
            args.seo_description,
            args.seo_keywords,
            args.created_at,
            args.updated_at
        ],
    )?;
    Ok(())
}

pub struct ArticleUpdate<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub tag_ids: &'a str,
    pub seo_title: &'a str,
    pub seo_description: &'a str,
    pub seo_keywords: &'a str,
    pub updated_at: &'a str,
}

pub fn update_article(conn: &Connection, id: &str, args: &ArticleUpdate<'_>) -> Result<bool> {
    let changed = conn.execute(
        r#"
UPDATE articles SET
    title = ?2,
    content = ?3,
    tag_ids = ?4,
    seo_title = ?5,
    seo_description = ?6,
    seo_keywords = ?7,
    updated_at = ?8
WHERE id = ?1
"#,
        params![
            id,
            args.title,
            args.content,
            args.tag_ids,
            args.seo_title,
            args.seo_description,
            args.seo_keywords,
            args.updated_at
        ],
    )?;
    Ok(changed > 0)
}

fn article_from_row(row: &rusqlite::Row<'_>) -> Result<ArticleRecord> {
    Ok(ArticleRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        tag_ids: row.get(3)?,
        seo_title: row.get(4)?,
        seo_description: row.get(5)?,
        seo_keywords: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

const ARTICLE_COLUMNS: &str =
    "id, title, content, tag_ids, seo_title, seo_description, seo_keywords, created_at, updated_at";

pub fn get_article(conn: &Connection, id: &str) -> Result<Option<ArticleRecord>> {
    conn.query_row(
        &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1"),
        params![id],
        article_from_row,
    )
    .optional()
}

pub fn article_exists(conn: &Connection, id: &str) -> Result<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT id FROM articles WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn list_articles(conn: &Connection) -> Result<Vec<ArticleRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY created_at DESC, id ASC"
    ))?;
    let mut rows = stmt.query([])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(article_from_row(row)?);
    }
    Ok(result)
}

pub fn delete_article(conn: &Connection, id: &str) -> Result<bool> {
    let changed = conn.execute("DELETE FROM articles WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TagRecord {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub created_at: String,
}

fn tag_from_row(row: &rusqlite::Row<'_>) -> Result<TagRecord> {
    Ok(TagRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        created_at: row.get(3)?,
    })
}

pub fn insert_tag(conn: &Connection, tag: &TagRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO tags (id, name, slug, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![tag.id, tag.name, tag.slug, tag.created_at],
    )?;
    Ok(())
}

pub fn get_tag(conn: &Connection, id: &str) -> Result<Option<TagRecord>> {
    conn.query_row(
        "SELECT id, name, slug, created_at FROM tags WHERE id = ?1",
        params![id],
        tag_from_row,
    )
    .optional()
}

pub fn find_tag_by_slug(conn: &Connection, slug: &str) -> Result<Option<TagRecord>> {
    conn.query_row(
        "SELECT id, name, slug, created_at FROM tags WHERE slug = ?1",
        params![slug],
        tag_from_row,
    )
    .optional()
}

pub fn list_tags(conn: &Connection) -> Result<Vec<TagRecord>> {
    let mut stmt =
        conn.prepare("SELECT id, name, slug, created_at FROM tags ORDER BY name ASC, id ASC")?;
    let mut rows = stmt.query([])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(tag_from_row(row)?);
    }
    Ok(result)
}

pub fn delete_tag(conn: &Connection, id: &str) -> Result<bool> {
    let changed = conn.execute("DELETE FROM tags WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

pub fn append_view(
    conn: &Connection,
    article_id: &str,
    ip_address: &str,
    user_agent: Option<&str>,
    viewed_at: &str,
) -> Result<()> {
    conn.execute(
        r#"
INSERT INTO article_views (article_id, ip_address, user_agent, viewed_at)
VALUES (?1, ?2, ?3, ?4)
"#,
        params![article_id, ip_address, user_agent, viewed_at],
    )?;
    Ok(())
}

pub fn count_views(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM article_views", [], |row| row.get(0))
}

pub fn count_views_on(conn: &Connection, day_key: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM article_views WHERE substr(viewed_at, 1, 10) = ?1",
        params![day_key],
        |row| row.get(0),
    )
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PopularArticleRow {
    pub id: String,
    pub title: String,
    pub views: i64,
}

/// Top articles by view count since `cutoff`. The inner join drops events
/// whose article has been deleted.
pub fn popular_since(conn: &Connection, cutoff: &str, limit: i64) -> Result<Vec<PopularArticleRow>> {
    let mut stmt = conn.prepare(
        r#"
SELECT av.article_id, a.title, COUNT(*) AS views
FROM article_views av
JOIN articles a ON a.id = av.article_id
WHERE av.viewed_at >= ?1
GROUP BY av.article_id, a.title
ORDER BY views DESC, av.article_id ASC
LIMIT ?2
"#,
    )?;
    let mut rows = stmt.query(params![cutoff, limit])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(PopularArticleRow {
            id: row.get(0)?,
            title: row.get(1)?,
            views: row.get(2)?,
        });
    }
    Ok(result)
}

pub fn daily_counts_between(
    conn: &Connection,
    from_key: &str,
    to_key: &str,
) -> Result<HashMap<String, i64>> {
    let mut stmt = conn.prepare(
        r#"
SELECT substr(viewed_at, 1, 10) AS day, COUNT(*)
FROM article_views
WHERE substr(viewed_at, 1, 10) BETWEEN ?1 AND ?2
GROUP BY day
"#,
    )?;
    let mut rows = stmt.query(params![from_key, to_key])?;
    let mut result = HashMap::new();
    while let Some(row) = rows.next()? {
        result.insert(row.get::<_, String>(0)?, row.get::<_, i64>(1)?);
    }
    Ok(result)
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ViewLogRecord {
    pub id: i64,
    pub article_id: String,
    pub article_title: Option<String>,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub viewed_at: String,
}

pub fn list_view_logs(
    conn: &Connection,
    article_id: Option<&str>,
    limit: i64,
) -> Result<Vec<ViewLogRecord>> {
    let sql_all = r#"
SELECT av.id, av.article_id, a.title, av.ip_address, av.user_agent, av.viewed_at
FROM article_views av
LEFT JOIN articles a ON a.id = av.article_id
ORDER BY av.viewed_at DESC, av.id DESC
LIMIT ?1
"#;
    let sql_filtered = r#"
SELECT av.id, av.article_id, a.title, av.ip_address, av.user_agent, av.viewed_at
FROM article_views av
LEFT JOIN articles a ON a.id = av.article_id
WHERE av.article_id = ?2
ORDER BY av.viewed_at DESC, av.id DESC
LIMIT ?1
"#;
    let mut stmt = conn.prepare(if article_id.is_some() {
        sql_filtered
    } else {
        sql_all
    })?;
    let mut rows = match article_id {
        Some(filter) => stmt.query(params![limit, filter])?,
        None => stmt.query(params![limit])?,
    };
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(ViewLogRecord {
            id: row.get(0)?,
            article_id: row.get(1)?,
            article_title: row.get(2)?,
            ip_address: row.get(3)?,
            user_agent: row.get(4)?,
            viewed_at: row.get(5)?,
        });
    }
    Ok(result)
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CommentRecord {
    pub id: i64,
    pub article_id: String,
    pub user_name: String,
    pub user_email: Option<String>,
    pub content: String,
    pub created_at: String,
}

pub fn insert_comment(
    conn: &Connection,
    article_id: &str,
    user_name: &str,
    user_email: Option<&str>,
    content: &str,
    created_at: &str,
) -> Result<i64> {
    conn.execute(
        r#"
INSERT INTO comments (article_id, user_name, user_email, content, created_at)
VALUES (?1, ?2, ?3, ?4, ?5)
"#,
        params![article_id, user_name, user_email, content, created_at],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_comment(conn: &Connection, id: i64) -> Result<Option<CommentRecord>> {
    conn.query_row(
        r#"
SELECT id, article_id, user_name, user_email, content, created_at
FROM comments
WHERE id = ?1
"#,
        params![id],
        comment_from_row,
    )
    .optional()
}

pub fn list_comments(conn: &Connection, article_id: &str) -> Result<Vec<CommentRecord>> {
    let mut stmt = conn.prepare(
        r#"
SELECT id, article_id, user_name, user_email, content, created_at
FROM comments
WHERE article_id = ?1
ORDER BY created_at DESC, id DESC
"#,
    )?;
    let mut rows = stmt.query(params![article_id])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(comment_from_row(row)?);
    }
    Ok(result)
}

fn comment_from_row(row: &rusqlite::Row<'_>) -> Result<CommentRecord> {
    Ok(CommentRecord {
        id: row.get(0)?,
        article_id: row.get(1)?,
        user_name: row.get(2)?,
        user_email: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
    })
}
