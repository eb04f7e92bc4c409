use std::path::PathBuf;

use crate::clock::{parse_rfc3339, FixedClock};

use super::{App, AppError, ArticlePatch, NewArticle};

fn unique_workspace() -> PathBuf {
    let root = std::env::temp_dir().join(format!("inkroll-app-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&root).expect("workspace should be creatable");
    root
}

fn open_app(root: &PathBuf) -> App {
    let db_path = root.join("data/state.sqlite");
    App::open_with_clock(
        db_path.to_str().expect("utf8 path"),
        Box::new(FixedClock(parse_rfc3339("2026-04-01T12:00:00Z"))),
    )
    .expect("app should open")
}

fn plain_article(title: &str) -> NewArticle {
    NewArticle {
        title: title.to_string(),
        content: "Body text".to_string(),
        ..NewArticle::default()
    }
}

#[test]
fn article_lifecycle_create_update_delete() {
    let root = unique_workspace();
    let app = open_app(&root);

    let created = app
        .create_article(plain_article("  Hello  "))
        .expect("create should succeed");
    assert_eq!(created.title, "Hello");
    assert_eq!(created.created_at, "2026-04-01T12:00:00Z");

    let shown = app
        .show_article(&created.id)
        .expect("show should succeed")
        .expect("article should exist");
    assert_eq!(shown, created);

    let updated = app
        .update_article(
            &created.id,
            ArticlePatch {
                title: Some("Renamed".to_string()),
                seo_title: Some("seo".to_string()),
                ..ArticlePatch::default()
            },
        )
        .expect("update should succeed");
    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.content, "Body text");
    assert_eq!(updated.seo_title, "seo");
    assert_eq!(updated.created_at, created.created_at);

    app.delete_article(&created.id).expect("delete should succeed");
    let err = app
        .delete_article(&created.id)
        .expect_err("second delete must fail");
    assert!(matches!(err, AppError::NotFound(_)));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn create_rejects_blank_and_oversized_fields() {
    let root = unique_workspace();
    let app = open_app(&root);

    let blank_title = app
        .create_article(plain_article("   "))
        .expect_err("blank title must be rejected");
    assert!(matches!(blank_title, AppError::Validation(_)));

    let mut no_content = plain_article("Title");
    no_content.content = "  ".to_string();
    assert!(matches!(
        app.create_article(no_content),
        Err(AppError::Validation(_))
    ));

    let long_title = app
        .create_article(plain_article(&"x".repeat(256)))
        .expect_err("oversized title must be rejected");
    assert!(matches!(long_title, AppError::Validation(_)));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn unknown_tag_id_on_create_is_a_validation_error() {
    let root = unique_workspace();
    let app = open_app(&root);

    let mut article = plain_article("Tagged");
    article.tag_ids = vec!["t-missing".to_string()];
    let err = app
        .create_article(article)
        .expect_err("unknown tag id must be rejected");
    match err {
        AppError::Validation(message) => assert!(message.contains("t-missing")),
        other => panic!("unexpected error kind: {other}"),
    }
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn update_without_changes_is_rejected() {
    let root = unique_workspace();
    let app = open_app(&root);
    let created = app
        .create_article(plain_article("Hello"))
        .expect("create should succeed");

    let err = app
        .update_article(&created.id, ArticlePatch::default())
        .expect_err("empty patch must be rejected");
    assert!(matches!(err, AppError::Validation(_)));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn summaries_resolve_tags_and_filter_by_tag_id() {
    let root = unique_workspace();
    let app = open_app(&root);

    let rust = app.create_tag("Rust", "rust").expect("tag should create");
    let mut tagged = plain_article("Tagged");
    tagged.tag_ids = vec![rust.id.clone()];
    app.create_article(tagged).expect("create should succeed");
    app.create_article(plain_article("Untagged"))
        .expect("create should succeed");

    let all = app.list_summaries(None).expect("summaries should succeed");
    assert_eq!(all.len(), 2);

    let filtered = app
        .list_summaries(Some(&rust.id))
        .expect("filtered summaries should succeed");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].title, "Tagged");
    assert_eq!(filtered[0].tags[0].slug, "rust");
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn tag_deletion_does_not_cascade_into_articles() {
    let root = unique_workspace();
    let app = open_app(&root);

    let rust = app.create_tag("Rust", "rust").expect("tag should create");
    let mut tagged = plain_article("Tagged");
    tagged.tag_ids = vec![rust.id.clone()];
    let created = app.create_article(tagged).expect("create should succeed");

    app.delete_tag(&rust.id).expect("delete should succeed");

    // The stored reference survives; rendering drops it.
    let detail = app
        .show_article(&created.id)
        .expect("show should succeed")
        .expect("article should exist");
    assert_eq!(detail.tag_ids, vec![rust.id.clone()]);
    let summaries = app.list_summaries(None).expect("summaries should succeed");
    assert!(summaries[0].tags.is_empty());
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn duplicate_tag_slug_is_a_conflict() {
    let root = unique_workspace();
    let app = open_app(&root);

    app.create_tag("Rust", "rust").expect("tag should create");
    let err = app
        .create_tag("Rust Lang", "rust")
        .expect_err("duplicate slug must be rejected");
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(app.list_tags().expect("list should succeed").len(), 1);
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn tag_stats_count_referencing_articles() {
    let root = unique_workspace();
    let app = open_app(&root);

    let rust = app.create_tag("Rust", "rust").expect("tag should create");
    app.create_tag("Sqlite", "sqlite").expect("tag should create");
    for index in 0..2 {
        let mut article = plain_article(&format!("Article {index}"));
        article.tag_ids = vec![rust.id.clone()];
        app.create_article(article).expect("create should succeed");
    }

    let stats = app.tag_stats().expect("stats should succeed");
    assert_eq!(stats.len(), 2);
    let by_slug = |slug: &str| {
        stats
            .iter()
            .find(|usage| usage.slug == slug)
            .expect("tag should be listed")
            .article_count
    };
    assert_eq!(by_slug("rust"), 2);
    assert_eq!(by_slug("sqlite"), 0, "unused tags stay listed");
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn comments_require_an_existing_article_and_content() {
    let root = unique_workspace();
    let app = open_app(&root);
    let created = app
        .create_article(plain_article("Hello"))
        .expect("create should succeed");

    assert!(matches!(
        app.add_comment("a-missing", "ada", None, "hi"),
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        app.add_comment(&created.id, "", None, "hi"),
        Err(AppError::Validation(_))
    ));

    let comment = app
        .add_comment(&created.id, "ada", Some("ada@example.com"), "nice read")
        .expect("comment should be added");
    assert_eq!(comment.user_name, "ada");

    let listed = app
        .list_comments(&created.id)
        .expect("list should succeed");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].content, "nice read");
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn malformed_import_payload_fails_the_whole_call() {
    let root = unique_workspace();
    let app = open_app(&root);

    assert!(matches!(
        app.import_json("not json at all"),
        Err(AppError::Json(_))
    ));
    assert!(matches!(
        app.import_json(r#"{"tags": []}"#),
        Err(AppError::Json(_))
    ));
    assert!(app.list_articles().expect("list should succeed").is_empty());
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn record_view_and_stats_flow_through_the_facade() {
    let root = unique_workspace();
    let app = open_app(&root);
    let created = app
        .create_article(plain_article("Hello"))
        .expect("create should succeed");

    app.record_view(&created.id, "10.0.0.1", Some("agent"))
        .expect("view should record");
    let stats = app.view_stats().expect("stats should succeed");
    assert_eq!(stats.total_views, 1);
    assert_eq!(stats.today_views, 1);

    let logs = app
        .view_logs(Some(&created.id), 10)
        .expect("logs should succeed");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].article_title.as_deref(), Some("Hello"));
    let _ = std::fs::remove_dir_all(root);
}
