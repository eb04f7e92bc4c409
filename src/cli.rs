use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, Parser, Subcommand};

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

#[derive(Debug, Parser)]
#[command(name = "inkroll")]
#[command(bin_name = "inkroll")]
#[command(version)]
#[command(about = "A local blog content store with bulk import/export and view analytics")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'd',
        long,
        env = "INKROLL_DB_PATH",
        default_value = "inkroll.sqlite",
        help = "Path to the SQLite database."
    )]
    pub db: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Create a new article.")]
    New(NewArgs),
    #[command(about = "Show one article as JSON.")]
    Show(ShowArgs),
    #[command(about = "List article summaries, newest first.")]
    Ls(ListArgs),
    #[command(about = "Update article fields.")]
    Update(UpdateArgs),
    #[command(about = "Delete an article.")]
    Rm(RemoveArgs),
    #[command(subcommand, about = "Manage tags.")]
    Tag(TagCommands),
    #[command(subcommand, about = "Manage comments.")]
    Comment(CommentCommands),
    #[command(about = "Record one article view event.")]
    View(ViewArgs),
    #[command(about = "Print aggregated view statistics as JSON.")]
    Stats,
    #[command(about = "List raw view events, newest first.")]
    Logs(LogsArgs),
    #[command(about = "Export every article and tag as a re-importable bundle.")]
    Export(ExportArgs),
    #[command(about = "Import an export bundle from a JSON file.")]
    Import(ImportArgs),
    #[command(about = "Generate shell completions.")]
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct NewArgs {
    #[arg(help = "Article title.")]
    pub title: String,

    #[arg(short = 'c', long, help = "Article content; may contain markup.")]
    pub content: String,

    #[arg(long = "tag-id", help = "Existing tag id to attach. Repeatable.")]
    pub tag_ids: Vec<String>,

    #[arg(long, default_value = "", help = "SEO title.")]
    pub seo_title: String,

    #[arg(long, default_value = "", help = "SEO description.")]
    pub seo_description: String,

    #[arg(long, default_value = "", help = "SEO keywords.")]
    pub seo_keywords: String,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[arg(help = "Article id.")]
    pub id: String,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long, help = "Only articles referencing this tag id.")]
    pub tag: Option<String>,

    #[arg(long, help = "Print summaries as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    #[arg(help = "Article id.")]
    pub id: String,

    #[arg(long, help = "New title.")]
    pub title: Option<String>,

    #[arg(short = 'c', long, help = "New content.")]
    pub content: Option<String>,

    #[arg(
        long = "tag-id",
        help = "Replacement tag id set. Repeatable; use --clear-tags to empty."
    )]
    pub tag_ids: Vec<String>,

    #[arg(long, help = "Remove every tag reference.")]
    pub clear_tags: bool,

    #[arg(long, help = "New SEO title.")]
    pub seo_title: Option<String>,

    #[arg(long, help = "New SEO description.")]
    pub seo_description: Option<String>,

    #[arg(long, help = "New SEO keywords.")]
    pub seo_keywords: Option<String>,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    #[arg(help = "Article id.")]
    pub id: String,
}

#[derive(Debug, Subcommand)]
pub enum TagCommands {
    #[command(about = "List tags.")]
    Ls(TagListArgs),
    #[command(about = "Create a tag.")]
    New(TagNewArgs),
    #[command(about = "Delete a tag. Articles keep their weak references.")]
    Rm(TagRemoveArgs),
    #[command(about = "Per-tag referencing-article counts as JSON.")]
    Stats,
}

#[derive(Debug, Args)]
pub struct TagListArgs {
    #[arg(long, help = "Print tags as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct TagNewArgs {
    #[arg(help = "Display name.")]
    pub name: String,

    #[arg(help = "URL-safe slug; unique within the store.")]
    pub slug: String,
}

#[derive(Debug, Args)]
pub struct TagRemoveArgs {
    #[arg(help = "Tag id.")]
    pub id: String,
}

#[derive(Debug, Subcommand)]
pub enum CommentCommands {
    #[command(about = "Add a comment to an article.")]
    Add(CommentAddArgs),
    #[command(about = "List an article's comments, newest first.")]
    Ls(CommentListArgs),
}

#[derive(Debug, Args)]
pub struct CommentAddArgs {
    #[arg(help = "Article id.")]
    pub article_id: String,

    #[arg(long, help = "Commenter display name.")]
    pub name: String,

    #[arg(long, help = "Commenter email.")]
    pub email: Option<String>,

    #[arg(short = 'c', long, help = "Comment text.")]
    pub content: String,
}

#[derive(Debug, Args)]
pub struct CommentListArgs {
    #[arg(help = "Article id.")]
    pub article_id: String,
}

#[derive(Debug, Args)]
pub struct ViewArgs {
    #[arg(help = "Article id.")]
    pub article_id: String,

    #[arg(long, help = "Client IP address.")]
    pub ip: String,

    #[arg(long, help = "Client user agent string.")]
    pub user_agent: Option<String>,
}

#[derive(Debug, Args)]
pub struct LogsArgs {
    #[arg(long, help = "Only events for this article id.")]
    pub article_id: Option<String>,

    #[arg(long, default_value_t = 100, help = "Maximum number of events.")]
    pub limit: i64,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[arg(short = 'o', long, help = "Write the bundle here instead of stdout.")]
    pub out: Option<String>,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    #[arg(help = "Path to a bundle JSON file.")]
    pub file: String,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(help = "Shell name (bash, zsh, fish).")]
    pub shell: clap_complete::Shell,
}
