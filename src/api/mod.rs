//! REST interface of the notes server.
//!
//! [`Backend`] is the seam every store is driven through. [`HttpBackend`]
//! talks to a real server; tests substitute an in-memory fake.

mod client;
mod types;

pub use client::HttpBackend;
pub use types::{Article, ArticleId, ArticleInsert, ArticleSummary, Link, ListQuery, SortKey, Tag};
pub(crate) use types::{ErrorBody, LoginRequest, SaveResponse};

use async_trait::async_trait;

/// Failures of a single API call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server rejected a login or registration with `{kind, message}`.
    #[error("{message}")]
    AuthFailure { kind: String, message: String },
    #[error("not authorized")]
    Unauthorized,
    #[error("not found")]
    NotFound,
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET /user`. `Ok` means the session is authorized.
    async fn current_user(&self) -> ApiResult<()>;

    /// `POST /login?register={register}`.
    async fn login(&self, email: &str, password: &str, register: bool) -> ApiResult<()>;

    async fn list_articles(&self, query: &ListQuery) -> ApiResult<Vec<ArticleSummary>>;

    async fn get_article(&self, id: ArticleId) -> ApiResult<Article>;

    /// Create (no id) or update; returns the article id either way.
    async fn save_article(&self, article: &ArticleInsert) -> ApiResult<ArticleId>;

    async fn delete_article(&self, id: ArticleId) -> ApiResult<()>;

    async fn list_tags(&self) -> ApiResult<Vec<Tag>>;

    async fn list_links(&self) -> ApiResult<Vec<Link>>;

    /// Session credential worth persisting across processes, if any.
    fn session_token(&self) -> Option<String> {
        None
    }
}
