use crate::api::Article;
use crate::catalog::{LinkList, TagList};
use crate::editor::EditBuffer;
use crate::feed::FeedCursor;
use crate::session::Session;

/// The complete client state.
///
/// All state lives here, one field per slice. Slices never reach into each
/// other; [`super::update`] is the only place that routes between them.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub session: Session,
    pub feed: FeedCursor,
    /// Open editing session, if any
    pub editor: Option<EditBuffer>,
    /// Article opened read-only
    pub viewing: Option<Article>,
    /// Why the last read-only open failed
    pub view_error: Option<String>,
    pub tags: TagList,
    pub links: LinkList,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Earliest pending timer across all slices.
    pub fn next_deadline(&self) -> Option<u64> {
        let editor = self.editor.as_ref().and_then(EditBuffer::next_deadline);
        let feed = self.feed.next_deadline();
        match (editor, feed) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}
