//! Jotter - A client for a personal markdown notes server.
//!
//! # Usage
//!
//! ```bash
//! jotter login --email me@example.com < password.txt
//! jotter feed --query cache --tag go --pages 2
//! jotter edit --title "LRU caches" --content-file notes.md --tag go
//! jotter --server https://notes.example.com --save whoami
//! ```

use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use jotter::api::{ArticleId, HttpBackend, SortKey};
use jotter::app::{Message, Runtime};
use jotter::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, load_session_state,
    local_override_path, parse_flag_tokens, save_config_flags, state_path,
};
use jotter::editor::{Edit, Status};
use jotter::feed::{FeedFilter, TagMatch, highlight_segments};
use jotter::schedule::SystemClock;

type Client = Runtime<HttpBackend, SystemClock>;

/// A client for a personal markdown notes server
#[derive(Parser, Debug)]
#[command(name = "jotter", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Base URL of the notes server
    #[arg(long, global = true, value_name = "URL")]
    server: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// Log requests and state changes to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Save current command-line flags as defaults
    #[arg(long, global = true)]
    save: bool,

    /// Clear saved defaults
    #[arg(long, global = true)]
    clear: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Log in (or register); the password is read from stdin
    Login {
        #[arg(long)]
        email: Option<String>,
        /// Create the account instead of logging in
        #[arg(long)]
        register: bool,
    },
    /// Check whether the stored session is still valid
    Whoami,
    /// List articles, newest first
    Feed {
        /// Full-text search
        #[arg(short, long)]
        query: Option<String>,
        /// Only articles with this tag (repeatable)
        #[arg(short, long = "tag", value_name = "TAG")]
        tags: Vec<String>,
        /// Require every tag instead of any
        #[arg(long)]
        all_tags: bool,
        #[arg(long, value_enum, default_value_t = SortKey::Created)]
        sort: SortKey,
        /// Number of pages to fetch
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Print an article
    Show { id: ArticleId },
    /// Create an article, or update one when an id is given
    Edit {
        id: Option<ArticleId>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "content_file")]
        content: Option<String>,
        /// Read the content from a file
        #[arg(long, value_name = "PATH")]
        content_file: Option<PathBuf>,
        /// Replace the tags (repeatable)
        #[arg(short, long = "tag", value_name = "TAG")]
        tags: Option<Vec<String>>,
    },
    /// Delete an article
    Delete {
        id: ArticleId,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// List tags with their article counts
    Tags,
    /// List links found in articles
    Links,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    // Initialize logging
    let level = if effective.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let state_file = state_path();
    let stored = load_session_state(&state_file).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "ignoring unreadable state file");
        jotter::config::SessionState::default()
    });
    let backend = HttpBackend::new(
        effective.server(),
        Duration::from_secs(effective.timeout_secs()),
    )
    .context("Failed to build HTTP client")?
    .with_token(stored.token.clone());
    tracing::debug!(server = backend.base_url(), "using server");

    let mut client = Runtime::new(backend, SystemClock::new()).with_state_path(state_file);

    match cli.command {
        Cmd::Login { email, register } => {
            login(&mut client, email.or(stored.email), register).await
        }
        Cmd::Whoami => whoami(&mut client).await,
        Cmd::Feed {
            query,
            tags,
            all_tags,
            sort,
            pages,
        } => {
            let tag_match = if all_tags { TagMatch::All } else { TagMatch::Any };
            feed(&mut client, query, &tags, tag_match, sort, pages).await
        }
        Cmd::Show { id } => show(&mut client, id).await,
        Cmd::Edit {
            id,
            title,
            content,
            content_file,
            tags,
        } => {
            let content = match content_file {
                Some(path) => Some(
                    std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                ),
                None => content,
            };
            let mut edits = Vec::new();
            edits.extend(title.map(Edit::Title));
            edits.extend(content.map(Edit::Content));
            edits.extend(tags.map(Edit::Tags));
            edit(&mut client, id, edits).await
        }
        Cmd::Delete { id, yes } => delete(&mut client, id, yes).await,
        Cmd::Tags => tags(&mut client).await,
        Cmd::Links => links(&mut client).await,
    }
}

async fn login(client: &mut Client, email: Option<String>, register: bool) -> Result<()> {
    let Some(email) = email else {
        bail!("No email given and none remembered; pass --email");
    };
    let mut password = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut password)
        .context("Failed to read password from stdin")?;
    let password = password.trim_end_matches(['\r', '\n']).to_string();

    client
        .dispatch(Message::Login {
            email: email.clone(),
            password,
            register,
        })
        .await;

    let attempt = &client.model().session.attempt;
    let status = attempt.status.as_ref().map_or("Failed", |s| s.as_str());
    if client.model().session.is_authorized() {
        println!("{status}: logged in as {email}");
        Ok(())
    } else {
        let message = attempt.message.as_deref().unwrap_or("login failed");
        bail!("{status}: {message}")
    }
}

async fn whoami(client: &mut Client) -> Result<()> {
    client.dispatch(Message::Init).await;
    let session = &client.model().session;
    let email = session.email.as_deref().unwrap_or("(unknown)");
    match session.authorized {
        Some(true) => println!("logged in as {email}"),
        Some(false) => println!("not logged in (last used: {email})"),
        None => bail!("Could not reach the server"),
    }
    Ok(())
}

async fn feed(
    client: &mut Client,
    query: Option<String>,
    tags: &[String],
    tag_match: TagMatch,
    sort: SortKey,
    pages: usize,
) -> Result<()> {
    if !tags.is_empty() {
        client.dispatch(Message::ReloadTags).await;
    }
    let keys = match client.model().tags.filter_keys(tags) {
        Ok(keys) => keys,
        Err(name) => bail!("Unknown tag {name}"),
    };
    let filter = FeedFilter::default()
        .with_query(query.unwrap_or_default())
        .with_tags(keys)
        .with_tag_match(tag_match)
        .with_sort(sort);

    client.dispatch(Message::SetFilter(filter)).await;
    for _ in 1..pages {
        if !client.model().feed.has_more() {
            break;
        }
        client.dispatch(Message::LoadMore).await;
    }

    for item in client.model().feed.items() {
        let edited = if item.was_edited() { " (edited)" } else { "" };
        println!(
            "#{:<5} {}  [{}]  {}{edited}",
            item.id,
            item.title,
            item.tags.join(", "),
            item.created_on.format("%Y-%m-%d"),
        );
        let preview: String = highlight_segments(&item.preview)
            .iter()
            .map(|segment| {
                if segment.highlighted {
                    format!("\x1b[1m{}\x1b[0m", segment.text)
                } else {
                    segment.text.to_string()
                }
            })
            .collect();
        if !preview.trim().is_empty() {
            println!("       {}", preview.trim());
        }
    }
    if client.model().feed.has_more() {
        println!("(more: pass --pages {})", pages + 1);
    }
    Ok(())
}

async fn show(client: &mut Client, id: ArticleId) -> Result<()> {
    client.dispatch(Message::ViewArticle(id)).await;
    let model = client.model();
    let Some(article) = &model.viewing else {
        let error = model.view_error.as_deref().unwrap_or("unknown error");
        bail!("Could not open article {id}: {error}");
    };
    println!("# {}", article.title);
    if !article.tags.is_empty() {
        println!("tags: {}", article.tags.join(", "));
    }
    println!("created {}", article.created_on.format("%Y-%m-%d %H:%M"));
    println!();
    println!("{}", article.content);
    Ok(())
}

async fn edit(client: &mut Client, id: Option<ArticleId>, edits: Vec<Edit>) -> Result<()> {
    client
        .dispatch(id.map_or(Message::CreateArticle, Message::EditArticle))
        .await;
    if let Some(Status::LoadFailed(message)) = editor_status(client) {
        bail!("Could not open article: {message}");
    }
    for change in edits {
        client.dispatch(Message::Edit(change)).await;
    }
    client.dispatch(Message::SaveNow).await;

    match editor_status(client) {
        Some(Status::Saved) => {
            let saved = client
                .model()
                .editor
                .as_ref()
                .and_then(|editor| editor.draft().id)
                .context("Server did not return an article id")?;
            println!("saved article #{saved}");
            Ok(())
        }
        Some(Status::SaveFailed { message, .. }) => bail!("Save failed: {message}"),
        other => bail!("Unexpected editor state: {other:?}"),
    }
}

async fn delete(client: &mut Client, id: ArticleId, yes: bool) -> Result<()> {
    client.dispatch(Message::EditArticle(id)).await;
    if let Some(Status::LoadFailed(message)) = editor_status(client) {
        bail!("Could not open article {id}: {message}");
    }
    client.dispatch(Message::RequestDelete).await;
    if !yes {
        client.dispatch(Message::CancelDelete).await;
        bail!("Refusing to delete article {id} without --yes");
    }
    client.dispatch(Message::ConfirmDelete).await;
    match editor_status(client) {
        Some(Status::Deleted) => {
            println!("deleted article #{id}");
            Ok(())
        }
        Some(Status::DeleteFailed(message)) => bail!("Delete failed: {message}"),
        other => bail!("Unexpected editor state: {other:?}"),
    }
}

async fn tags(client: &mut Client) -> Result<()> {
    client.dispatch(Message::ReloadTags).await;
    for tag in &client.model().tags.list {
        println!("{:<24} {}", tag.name, tag.num_articles);
    }
    Ok(())
}

async fn links(client: &mut Client) -> Result<()> {
    client.dispatch(Message::ReloadLinks).await;
    for link in &client.model().links.list {
        let title = link.title.as_deref().unwrap_or(&link.url);
        println!("{title}\n    {}\n    from #{} {}", link.url, link.article_id, link.article_title);
    }
    Ok(())
}

fn editor_status(client: &Client) -> Option<Status> {
    client.model().editor.as_ref().map(jotter::editor::EditBuffer::status)
}
