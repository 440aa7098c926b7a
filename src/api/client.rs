use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::{
    ApiError, ApiResult, Article, ArticleId, ArticleInsert, ArticleSummary, Backend, ErrorBody,
    Link, ListQuery, LoginRequest, SaveResponse, Tag,
};

/// Name of the cookie the server issues on login.
const SESSION_COOKIE: &str = "jwt";

/// [`Backend`] over HTTP.
///
/// The session cookie is kept in memory and attached to every request, so it
/// can be handed over from a previous process with [`HttpBackend::with_token`].
#[derive(Debug)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Mutex<Option<String>>,
}

impl HttpBackend {
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Use a preconfigured client (proxies, TLS roots, ...).
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: Mutex::new(None),
        }
    }

    /// Reuse a session token obtained earlier.
    #[must_use]
    pub fn with_token(self, token: Option<String>) -> Self {
        self.set_token(token);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn token(&self) -> Option<String> {
        self.token.lock().ok().and_then(|guard| guard.clone())
    }

    fn set_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.token.lock() {
            *guard = token;
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token() {
            Some(token) => request.header(COOKIE, format!("{SESSION_COOKIE}={token}")),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = self.authorized(request).send().await?;
        tracing::debug!(status = %response.status(), url = %response.url(), "response");
        check_status(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.send(self.client.get(self.url(path))).await?;
        decode(response).await
    }

    fn remember_session_cookie(&self, response: &Response) {
        let token = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(session_cookie_value);
        if let Some(token) = token {
            self.set_token(Some(token));
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn current_user(&self) -> ApiResult<()> {
        self.send(self.client.get(self.url("/user"))).await?;
        Ok(())
    }

    async fn login(&self, email: &str, password: &str, register: bool) -> ApiResult<()> {
        let request = self
            .client
            .post(self.url(&format!("/login?register={register}")))
            .json(&LoginRequest { email, password });
        let response = request.send().await?;
        if response.status() == StatusCode::OK {
            self.remember_session_cookie(&response);
            return Ok(());
        }
        let status = response.status().as_u16();
        let body = response.text().await?;
        match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody { kind, message }) => Err(ApiError::AuthFailure { kind, message }),
            Err(_) => Err(ApiError::Status { status, body }),
        }
    }

    async fn list_articles(&self, query: &ListQuery) -> ApiResult<Vec<ArticleSummary>> {
        self.get_json(&query.path()).await
    }

    async fn get_article(&self, id: ArticleId) -> ApiResult<Article> {
        self.get_json(&format!("/article/{id}")).await
    }

    async fn save_article(&self, article: &ArticleInsert) -> ApiResult<ArticleId> {
        let response = self
            .send(self.client.post(self.url("/article")).json(article))
            .await?;
        let saved: SaveResponse = decode(response).await?;
        Ok(saved.id())
    }

    async fn delete_article(&self, id: ArticleId) -> ApiResult<()> {
        self.send(self.client.delete(self.url(&format!("/article/{id}"))))
            .await?;
        Ok(())
    }

    async fn list_tags(&self) -> ApiResult<Vec<Tag>> {
        self.get_json("/tags").await
    }

    async fn list_links(&self) -> ApiResult<Vec<Link>> {
        self.get_json("/links").await
    }

    fn session_token(&self) -> Option<String> {
        self.token()
    }
}

async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status {
        StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
        StatusCode::NOT_FOUND => Err(ApiError::NotFound),
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Extract the session token from one `Set-Cookie` header value.
fn session_cookie_value(header: &str) -> Option<String> {
    let pair = header.split(';').next()?.trim();
    let value = pair.strip_prefix(SESSION_COOKIE)?.strip_prefix('=')?;
    (!value.is_empty()).then(|| value.to_string())
}
