mod app;
mod bundle;
mod cli;
mod clock;
mod db;
mod export;
mod ids;
mod imports;
mod projection;
mod tags;
mod views;

use clap::{CommandFactory, Parser};

use crate::app::{App, ArticlePatch, NewArticle};
use crate::cli::{Cli, CommentCommands, Commands, TagCommands};

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("json serialization should work")
    );
}

fn run() -> Result<(), app::AppError> {
    let cli = Cli::parse();

    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        clap_complete::generate(args.shell, &mut command, "inkroll", &mut std::io::stdout());
        return Ok(());
    }

    let app = App::open(&cli.db)?;

    match cli.command {
        Commands::New(args) => {
            let article = app.create_article(NewArticle {
                title: args.title,
                content: args.content,
                tag_ids: args.tag_ids,
                seo_title: args.seo_title,
                seo_description: args.seo_description,
                seo_keywords: args.seo_keywords,
            })?;
            println!("created {} {}", article.id, article.title);
        }
        Commands::Show(args) => match app.show_article(&args.id)? {
            Some(article) => print_json(&article),
            None => return Err(app::AppError::NotFound(format!("article '{}'", args.id))),
        },
        Commands::Ls(args) => {
            let summaries = app.list_summaries(args.tag.as_deref())?;
            if args.json {
                print_json(&summaries);
            } else {
                for summary in &summaries {
                    let slugs: Vec<&str> =
                        summary.tags.iter().map(|tag| tag.slug.as_str()).collect();
                    println!(
                        "{}  {}  {}  [{}]",
                        summary.id,
                        summary.created_at,
                        summary.title,
                        slugs.join(", ")
                    );
                }
            }
        }
        Commands::Update(args) => {
            let tag_ids = if args.clear_tags {
                Some(Vec::new())
            } else if args.tag_ids.is_empty() {
                None
            } else {
                Some(args.tag_ids)
            };
            let article = app.update_article(
                &args.id,
                ArticlePatch {
                    title: args.title,
                    content: args.content,
                    tag_ids,
                    seo_title: args.seo_title,
                    seo_description: args.seo_description,
                    seo_keywords: args.seo_keywords,
                },
            )?;
            println!("updated {} {}", article.id, article.title);
        }
        Commands::Rm(args) => {
            app.delete_article(&args.id)?;
            println!("deleted {}", args.id);
        }
        Commands::Tag(command) => match command {
            TagCommands::Ls(args) => {
                let tags = app.list_tags()?;
                if args.json {
                    print_json(&tags);
                } else {
                    for tag in &tags {
                        println!("{}  {}  ({})", tag.id, tag.name, tag.slug);
                    }
                }
            }
            TagCommands::New(args) => {
                let tag = app.create_tag(&args.name, &args.slug)?;
                println!("created {} {} ({})", tag.id, tag.name, tag.slug);
            }
            TagCommands::Rm(args) => {
                app.delete_tag(&args.id)?;
                println!("deleted {}", args.id);
            }
            TagCommands::Stats => print_json(&app.tag_stats()?),
        },
        Commands::Comment(command) => match command {
            CommentCommands::Add(args) => {
                let comment = app.add_comment(
                    &args.article_id,
                    &args.name,
                    args.email.as_deref(),
                    &args.content,
                )?;
                println!("comment #{} added to {}", comment.id, comment.article_id);
            }
            CommentCommands::Ls(args) => print_json(&app.list_comments(&args.article_id)?),
        },
        Commands::View(args) => {
            app.record_view(&args.article_id, &args.ip, args.user_agent.as_deref())?;
            println!("view tracked for {}", args.article_id);
        }
        Commands::Stats => print_json(&app.view_stats()?),
        Commands::Logs(args) => print_json(&app.view_logs(args.article_id.as_deref(), args.limit)?),
        Commands::Export(args) => {
            let bundle = app.export()?;
            match args.out {
                Some(path) => {
                    let payload = serde_json::to_string_pretty(&bundle)?;
                    std::fs::write(&path, payload)?;
                    println!(
                        "exported {} articles and {} tags to {}",
                        bundle.total_articles, bundle.total_tags, path
                    );
                }
                None => print_json(&bundle),
            }
        }
        Commands::Import(args) => {
            let report = app.import_file(&args.file)?;
            println!(
                "import {}: {} imported, {} skipped",
                report.status, report.imported_count, report.skipped_count
            );
            for message in &report.errors {
                eprintln!("  {}", message);
            }
        }
        Commands::Completions(_) => {
            unreachable!("completions are handled before the store is opened")
        }
    }

    Ok(())
}
