use crate::api::Backend;
use crate::app::{Command, LoadTarget, Message, Runtime};
use crate::config::{SessionState, load_session_state, save_session_state};
use crate::schedule::Clock;

impl<B: Backend, C: Clock> Runtime<B, C> {
    pub(super) async fn execute(&self, command: Command) -> Option<Message> {
        let backend = &self.backend;
        let reply = match command {
            Command::ProbeSession => Message::SessionProbed {
                stored_email: self.stored_state().email,
                result: backend.current_user().await,
            },
            Command::Login {
                email,
                password,
                register,
            } => {
                let result = backend.login(&email, &password, register).await;
                Message::LoginFinished { email, result }
            }
            Command::PersistEmail(email) => {
                self.persist_email(email);
                return None;
            }
            Command::FetchPage(request) => {
                let result = backend.list_articles(&request.query).await;
                Message::PageLoaded { request, result }
            }
            Command::LoadArticle { target, id } => {
                let result = backend.get_article(id).await;
                if let (LoadTarget::Viewer, Err(err)) = (target, &result) {
                    tracing::warn!(id, error = %err, "failed to open article");
                }
                Message::ArticleLoaded { target, id, result }
            }
            Command::SaveArticle { revision, article } => Message::Saved {
                revision,
                result: backend.save_article(&article).await,
            },
            Command::DeleteArticle(id) => {
                Message::DeleteFinished(backend.delete_article(id).await)
            }
            Command::LoadTags => Message::TagsLoaded(backend.list_tags().await),
            Command::LoadLinks => Message::LinksLoaded(backend.list_links().await),
        };
        Some(reply)
    }

    fn stored_state(&self) -> SessionState {
        let Some(path) = &self.state_path else {
            return SessionState::default();
        };
        load_session_state(path).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "ignoring unreadable state file");
            SessionState::default()
        })
    }

    fn persist_email(&self, email: String) {
        let Some(path) = &self.state_path else {
            return;
        };
        let previous = self.stored_state();
        let state = SessionState {
            email: Some(email),
            token: self.backend.session_token().or(previous.token),
        };
        if let Err(err) = save_session_state(path, &state) {
            tracing::warn!(error = %err, "failed to persist session state");
        }
    }
}
