use crate::api::{ApiError, Article, ArticleId, ArticleInsert, ArticleSummary, Link, Tag};
use crate::app::Model;
use crate::editor::{Edit, EditBuffer, EditCommand};
use crate::feed::{FeedFilter, PageRequest, TagMatch};

/// Which view asked for an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTarget {
    Editor,
    Viewer,
}

/// All possible events and actions in the client.
///
/// User intents and request completions alike; completions carry the issuing
/// request's identity so stale answers can be recognised.
#[derive(Debug)]
pub enum Message {
    // Session
    /// Probe whether the stored session is still valid
    Init,
    SessionProbed {
        stored_email: Option<String>,
        result: Result<(), ApiError>,
    },
    Login {
        email: String,
        password: String,
        register: bool,
    },
    LoginFinished {
        email: String,
        result: Result<(), ApiError>,
    },

    // Feed
    /// Replace the whole filter
    SetFilter(FeedFilter),
    /// Search box input (debounced)
    TypeQuery(String),
    ToggleTag(String),
    SetTagMatch(TagMatch),
    ToggleSort,
    /// Fetch the next page (infinite scroll)
    LoadMore,
    PageLoaded {
        request: PageRequest,
        result: Result<Vec<ArticleSummary>, ApiError>,
    },

    // Editor
    /// Open the editor on a new, unsaved article
    CreateArticle,
    /// Open the editor on an existing article
    EditArticle(ArticleId),
    /// Apply a field edit now
    Edit(Edit),
    /// Keystroke-rate text input (debounced)
    TypeText(Edit),
    /// Save without waiting for the debounce
    SaveNow,
    Saved {
        revision: u64,
        result: Result<ArticleId, ApiError>,
    },
    RequestDelete,
    ConfirmDelete,
    CancelDelete,
    DeleteFinished(Result<(), ApiError>),
    CloseEditor,

    // Viewer
    ViewArticle(ArticleId),
    CloseViewer,
    ArticleLoaded {
        target: LoadTarget,
        id: ArticleId,
        result: Result<Article, ApiError>,
    },

    // Catalog
    ReloadTags,
    TagsLoaded(Result<Vec<Tag>, ApiError>),
    ReloadLinks,
    LinksLoaded(Result<Vec<Link>, ApiError>),

    /// Fire due debounce timers
    Tick,
}

/// Side effects requested by [`update`], executed by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ProbeSession,
    Login {
        email: String,
        password: String,
        register: bool,
    },
    PersistEmail(String),
    FetchPage(PageRequest),
    LoadArticle {
        target: LoadTarget,
        id: ArticleId,
    },
    SaveArticle {
        revision: u64,
        article: ArticleInsert,
    },
    DeleteArticle(ArticleId),
    LoadTags,
    LoadLinks,
}

impl From<EditCommand> for Command {
    fn from(cmd: EditCommand) -> Self {
        match cmd {
            EditCommand::Load(id) => Self::LoadArticle {
                target: LoadTarget::Editor,
                id,
            },
            EditCommand::Save { revision, article } => Self::SaveArticle { revision, article },
            EditCommand::Delete(id) => Self::DeleteArticle(id),
        }
    }
}

/// Pure state transition: apply `msg` at `now_ms`, return the new model and
/// the commands to run.
pub fn update(mut model: Model, msg: Message, now_ms: u64) -> (Model, Vec<Command>) {
    let mut commands = Vec::new();

    match msg {
        Message::Init => commands.push(Command::ProbeSession),
        Message::SessionProbed {
            stored_email,
            result,
        } => model.session.probed(stored_email, result),
        Message::Login {
            email,
            password,
            register,
        } => {
            model.session.begin_attempt();
            commands.push(Command::Login {
                email,
                password,
                register,
            });
        }
        Message::LoginFinished { email, result } => {
            if let Some(email) = model.session.attempt_finished(&email, result) {
                commands.push(Command::PersistEmail(email));
            }
        }

        Message::SetFilter(filter) => {
            commands.push(Command::FetchPage(model.feed.set_filter(filter)));
        }
        Message::TypeQuery(text) => model.feed.type_query(text, now_ms),
        Message::ToggleTag(key) => {
            commands.push(Command::FetchPage(model.feed.toggle_tag(&key)));
        }
        Message::SetTagMatch(tag_match) => {
            commands.push(Command::FetchPage(model.feed.set_tag_match(tag_match)));
        }
        Message::ToggleSort => commands.push(Command::FetchPage(model.feed.toggle_sort())),
        Message::LoadMore => commands.extend(model.feed.load_more(false).map(Command::FetchPage)),
        Message::PageLoaded { request, result } => {
            model.feed.page_loaded(&request, result);
        }

        Message::CreateArticle => {
            model.editor = Some(EditBuffer::new_article(now_ms));
            commands.push(Command::LoadTags);
        }
        Message::EditArticle(id) => {
            let (buffer, load) = EditBuffer::open(id);
            model.editor = Some(buffer);
            commands.push(load.into());
            commands.push(Command::LoadTags);
        }
        Message::Edit(edit) => {
            if let Some(editor) = model.editor.as_mut() {
                editor.set_field(edit, now_ms);
            }
        }
        Message::TypeText(edit) => {
            if let Some(editor) = model.editor.as_mut() {
                editor.type_text(edit, now_ms);
            }
        }
        Message::SaveNow => {
            if let Some(editor) = model.editor.as_mut() {
                commands.extend(editor.save(now_ms).map(Command::from));
            }
        }
        Message::Saved { revision, result } => {
            if let Some(editor) = model.editor.as_mut() {
                commands.extend(
                    editor
                        .save_completed(revision, result, now_ms)
                        .map(Command::from),
                );
            }
        }
        Message::RequestDelete => {
            if let Some(editor) = model.editor.as_mut() {
                editor.request_delete();
            }
        }
        Message::ConfirmDelete => {
            if let Some(editor) = model.editor.as_mut() {
                commands.extend(editor.confirm_delete().map(Command::from));
            }
        }
        Message::CancelDelete => {
            if let Some(editor) = model.editor.as_mut() {
                editor.cancel_delete();
            }
        }
        Message::DeleteFinished(result) => {
            if let Some(editor) = model.editor.as_mut() {
                editor.delete_completed(result, now_ms);
            }
        }
        Message::CloseEditor => model.editor = None,

        Message::ViewArticle(id) => {
            model.viewing = None;
            model.view_error = None;
            commands.push(Command::LoadArticle {
                target: LoadTarget::Viewer,
                id,
            });
        }
        Message::CloseViewer => {
            model.viewing = None;
            model.view_error = None;
        }
        Message::ArticleLoaded { target, id, result } => match target {
            LoadTarget::Editor => {
                if let Some(editor) = model
                    .editor
                    .as_mut()
                    .filter(|editor| editor.draft().id == Some(id))
                {
                    editor.loaded(result);
                }
            }
            LoadTarget::Viewer => match result {
                Ok(article) => model.viewing = Some(article),
                Err(err) => model.view_error = Some(err.to_string()),
            },
        },

        Message::ReloadTags => commands.push(Command::LoadTags),
        Message::TagsLoaded(result) => model.tags.loaded(result),
        Message::ReloadLinks => commands.push(Command::LoadLinks),
        Message::LinksLoaded(result) => model.links.loaded(result),

        Message::Tick => {
            if let Some(editor) = model.editor.as_mut() {
                commands.extend(editor.tick(now_ms).into_iter().map(Command::from));
            }
            commands.extend(model.feed.tick(now_ms).map(Command::FetchPage));
        }
    }

    (model, commands)
}
