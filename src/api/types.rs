use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Server-assigned article key.
pub type ArticleId = i64;

/// A full article as returned by `GET /article/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_on: NaiveDateTime,
    pub updated_on: NaiveDateTime,
}

/// One feed entry from `GET /article`.
///
/// When a text query is active the server wraps matched words in the
/// preview with `**`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: ArticleId,
    pub title: String,
    #[serde(default)]
    pub preview: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_on: NaiveDateTime,
    pub updated_on: NaiveDateTime,
}

impl ArticleSummary {
    pub fn was_edited(&self) -> bool {
        self.created_on != self.updated_on
    }
}

/// Body of `POST /article`. Without an `id` the server creates a new
/// article; with one it updates in place. Either way it answers with the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleInsert {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ArticleId>,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub num_articles: i64,
}

impl Tag {
    /// Value the listing endpoint accepts in its `tags` filter. The server
    /// only understands numeric ids and silently drops anything else.
    pub fn filter_key(&self) -> Option<String> {
        self.id.map(|id| id.to_string())
    }
}

/// A hyperlink extracted from an article body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
    pub article_id: ArticleId,
    pub article_title: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Error body the server sends with non-success statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

/// Answer to `POST /article`: a bare id, `{"id": ..}`, or the stored
/// article. Only the id is used.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SaveResponse {
    Id(ArticleId),
    Keyed { id: ArticleId },
}

impl SaveResponse {
    pub const fn id(&self) -> ArticleId {
        match self {
            Self::Id(id) | Self::Keyed { id } => *id,
        }
    }
}

/// Listing order.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortKey {
    #[default]
    Created,
    Updated,
}

impl SortKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Created => Self::Updated,
            Self::Updated => Self::Created,
        }
    }
}

/// Parameters of one `GET /article` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub from: usize,
    pub limit: usize,
    pub all_tags: bool,
    pub sort_by: SortKey,
    /// Omitted from the request when empty.
    pub query: String,
    /// Omitted from the request when empty.
    pub tags: Vec<String>,
}

impl ListQuery {
    /// Encoded query string, without the leading `?`.
    pub fn to_query_string(&self) -> String {
        let mut pairs = vec![
            ("from", self.from.to_string()),
            ("limit", self.limit.to_string()),
            ("all_tags", self.all_tags.to_string()),
            ("sort_by", self.sort_by.as_str().to_string()),
        ];
        if !self.query.is_empty() {
            pairs.push(("query", self.query.clone()));
        }
        if !self.tags.is_empty() {
            pairs.push(("tags", self.tags.join(",")));
        }
        pairs
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Request path including the query string.
    pub fn path(&self) -> String {
        format!("/article?{}", self.to_query_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn save_response_id(body: &str) -> ArticleId {
        serde_json::from_str::<SaveResponse>(body).unwrap().id()
    }

    #[test]
    fn test_save_response_accepts_bare_id() {
        assert_eq!(save_response_id("42"), 42);
    }

    #[test]
    fn test_save_response_accepts_id_object() {
        assert_eq!(save_response_id(r#"{"id": 42}"#), 42);
    }

    #[test]
    fn test_save_response_accepts_full_article() {
        let body = r##"{
            "id": 42,
            "title": "Caching",
            "content": "# LRU",
            "tags": ["go"],
            "created_on": "2021-03-14T12:00:00",
            "updated_on": "2021-03-14T12:00:00"
        }"##;
        assert_eq!(save_response_id(body), 42);
    }

    #[test]
    fn test_save_response_without_id_is_an_error() {
        assert!(serde_json::from_str::<SaveResponse>(r#"{"title": "x"}"#).is_err());
    }

    fn query() -> ListQuery {
        ListQuery {
            from: 0,
            limit: 10,
            all_tags: false,
            sort_by: SortKey::Created,
            query: String::new(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_query_string_omits_empty_optional_params() {
        assert_eq!(
            query().to_query_string(),
            "from=0&limit=10&all_tags=false&sort_by=created"
        );
    }

    #[test]
    fn test_query_string_encodes_text_and_joins_tags() {
        let q = ListQuery {
            from: 20,
            query: "lru cache".to_string(),
            tags: vec!["3".to_string(), "7".to_string()],
            all_tags: true,
            sort_by: SortKey::Updated,
            ..query()
        };
        assert_eq!(
            q.path(),
            "/article?from=20&limit=10&all_tags=true&sort_by=updated&query=lru%20cache&tags=3%2C7"
        );
    }

    #[test]
    fn test_article_deserializes_server_timestamps() {
        let json = r#"{
            "id": 4,
            "title": "Notes",
            "content": "body",
            "tags": ["go"],
            "created_on": "2021-06-01T10:20:30.123456",
            "updated_on": "2021-06-02T08:00:00"
        }"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.id, 4);
        assert_eq!(article.tags, vec!["go".to_string()]);
        assert!(article.created_on < article.updated_on);
    }

    #[test]
    fn test_insert_without_id_omits_field() {
        let insert = ArticleInsert {
            id: None,
            title: "t".to_string(),
            content: "c".to_string(),
            tags: vec![],
        };
        let json = serde_json::to_value(&insert).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["title"], "t");
    }

    #[test]
    fn test_tag_filter_key_is_the_id() {
        let tag = Tag {
            id: Some(12),
            name: "rust".to_string(),
            num_articles: 3,
        };
        assert_eq!(tag.filter_key().as_deref(), Some("12"));
        let unsaved = Tag { id: None, ..tag };
        assert_eq!(unsaved.filter_key(), None);
    }
}
