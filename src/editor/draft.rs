use chrono::NaiveDateTime;

use crate::api::{ApiError, Article, ArticleId, ArticleInsert};
use crate::schedule::Scheduler;

/// Quiet time before keystroke-rate text is committed to the draft.
pub const INPUT_DEBOUNCE_MS: u64 = 1_000;
/// Quiet time before the coalesced document save.
pub const SAVE_DEBOUNCE_MS: u64 = 2_000;
/// Upper bound for the retry delay after failed saves.
pub const RETRY_CAP_MS: u64 = 60_000;

const NEW_TITLE: &str = "Untitled";
const NEW_CONTENT: &str = "Start writing";

/// An editable article field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Content,
    Tags,
}

/// A new value for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Title(String),
    Content(String),
    Tags(Vec<String>),
}

impl Edit {
    pub const fn field(&self) -> Field {
        match self {
            Self::Title(_) => Field::Title,
            Self::Content(_) => Field::Content,
            Self::Tags(_) => Field::Tags,
        }
    }
}

/// Network work requested by the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    Load(ArticleId),
    /// Persist a snapshot taken at `revision`.
    Save {
        revision: u64,
        article: ArticleInsert,
    },
    Delete(ArticleId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    Commit(Field),
    Flush,
}

/// Local copy of an article's editable fields.
///
/// Every applied edit bumps `revision`; `saved_revision` is the newest
/// revision the server has confirmed. The draft is dirty while they differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub id: Option<ArticleId>,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_on: Option<NaiveDateTime>,
    pub updated_on: Option<NaiveDateTime>,
    revision: u64,
    saved_revision: u64,
}

impl Draft {
    fn blank() -> Self {
        Self {
            id: None,
            title: NEW_TITLE.to_string(),
            content: NEW_CONTENT.to_string(),
            tags: Vec::new(),
            created_on: None,
            updated_on: None,
            revision: 1,
            saved_revision: 0,
        }
    }

    fn from_article(article: Article) -> Self {
        Self {
            id: Some(article.id),
            title: article.title,
            content: article.content,
            tags: article.tags,
            created_on: Some(article.created_on),
            updated_on: Some(article.updated_on),
            revision: 0,
            saved_revision: 0,
        }
    }

    pub const fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    pub const fn revision(&self) -> u64 {
        self.revision
    }

    fn apply(&mut self, edit: Edit) {
        match edit {
            Edit::Title(title) => self.title = title,
            Edit::Content(content) => self.content = content,
            Edit::Tags(tags) => self.tags = tags,
        }
        self.revision += 1;
    }

    fn snapshot(&self) -> ArticleInsert {
        ArticleInsert {
            id: self.id,
            title: self.title.clone(),
            content: self.content.clone(),
            tags: self.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Loading(ArticleId),
    LoadFailed(String),
    Open,
    ConfirmDelete,
    Deleting,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SaveFailure {
    message: String,
    attempt: u32,
}

/// What the editor should show next to the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Loading,
    LoadFailed(String),
    /// Local edits not yet sent.
    Editing,
    /// A save for the current revision is in flight.
    Saving,
    Saved,
    /// The last save failed; a retry is scheduled.
    SaveFailed { message: String, attempt: u32 },
    ConfirmDelete,
    Deleting,
    DeleteFailed(String),
    Deleted,
}

/// Debounced autosave buffer for one article.
///
/// Methods take the current time in milliseconds and return the network
/// work to perform; responses are fed back through the `*_completed` and
/// [`EditBuffer::loaded`] methods. At most one save is in flight at a time.
#[derive(Debug, Clone)]
pub struct EditBuffer {
    phase: Phase,
    draft: Draft,
    typed: Vec<Edit>,
    timers: Scheduler<Timer>,
    in_flight: Option<u64>,
    flush_deferred: bool,
    delete_when_created: bool,
    failure: Option<SaveFailure>,
    delete_error: Option<String>,
}

impl EditBuffer {
    fn with(phase: Phase, draft: Draft) -> Self {
        Self {
            phase,
            draft,
            typed: Vec::new(),
            timers: Scheduler::new(),
            in_flight: None,
            flush_deferred: false,
            delete_when_created: false,
            failure: None,
            delete_error: None,
        }
    }

    /// Start a new article. It is dirty from the outset and its first save
    /// is due immediately.
    pub fn new_article(now_ms: u64) -> Self {
        let mut buffer = Self::with(Phase::Open, Draft::blank());
        buffer.timers.schedule(Timer::Flush, 0, now_ms);
        buffer
    }

    /// Open an existing article; the caller runs the returned load.
    pub fn open(id: ArticleId) -> (Self, EditCommand) {
        let placeholder = Draft {
            id: Some(id),
            revision: 0,
            saved_revision: 0,
            ..Draft::blank()
        };
        (
            Self::with(Phase::Loading(id), placeholder),
            EditCommand::Load(id),
        )
    }

    pub fn loaded(&mut self, result: Result<Article, ApiError>) {
        let Phase::Loading(id) = self.phase else {
            return;
        };
        match result {
            Ok(article) => {
                self.draft = Draft::from_article(article);
                self.phase = Phase::Open;
            }
            Err(err) => {
                tracing::warn!(id, error = %err, "failed to load article");
                self.phase = Phase::LoadFailed(err.to_string());
            }
        }
    }

    pub const fn draft(&self) -> &Draft {
        &self.draft
    }

    pub const fn is_dirty(&self) -> bool {
        self.draft.is_dirty()
    }

    /// Text to display for a field, including typing not yet committed.
    pub fn display_value(&self, field: Field) -> Edit {
        if let Some(edit) = self.typed.iter().find(|edit| edit.field() == field) {
            return edit.clone();
        }
        match field {
            Field::Title => Edit::Title(self.draft.title.clone()),
            Field::Content => Edit::Content(self.draft.content.clone()),
            Field::Tags => Edit::Tags(self.draft.tags.clone()),
        }
    }

    const fn is_editable(&self) -> bool {
        matches!(self.phase, Phase::Open | Phase::ConfirmDelete)
    }

    /// Apply an edit to the draft now and push the save back by
    /// [`SAVE_DEBOUNCE_MS`].
    pub fn set_field(&mut self, edit: Edit, now_ms: u64) {
        if !self.is_editable() {
            return;
        }
        self.draft.apply(edit);
        self.failure = None;
        self.delete_error = None;
        self.timers.schedule(Timer::Flush, SAVE_DEBOUNCE_MS, now_ms);
    }

    /// Keystroke-rate input: buffered and committed with [`Self::set_field`]
    /// once the field has been quiet for [`INPUT_DEBOUNCE_MS`].
    pub fn type_text(&mut self, edit: Edit, now_ms: u64) {
        if !self.is_editable() {
            return;
        }
        let field = edit.field();
        self.typed.retain(|pending| pending.field() != field);
        self.typed.push(edit);
        self.timers
            .schedule(Timer::Commit(field), INPUT_DEBOUNCE_MS, now_ms);
    }

    /// Save right away, committing any buffered typing first.
    pub fn save(&mut self, now_ms: u64) -> Option<EditCommand> {
        if !self.is_editable() {
            return None;
        }
        for edit in std::mem::take(&mut self.typed) {
            self.timers.cancel(&Timer::Commit(edit.field()));
            self.set_field(edit, now_ms);
        }
        self.timers.cancel(&Timer::Flush);
        self.flush()
    }

    /// Fire every timer due at `now_ms`.
    pub fn tick(&mut self, now_ms: u64) -> Vec<EditCommand> {
        let mut commands = Vec::new();
        for timer in self.timers.take_due(now_ms) {
            match timer {
                Timer::Commit(field) => {
                    if let Some(pos) = self.typed.iter().position(|e| e.field() == field) {
                        let edit = self.typed.remove(pos);
                        self.set_field(edit, now_ms);
                    }
                }
                Timer::Flush => commands.extend(self.flush()),
            }
        }
        commands
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_due()
    }

    fn flush(&mut self) -> Option<EditCommand> {
        if !self.is_editable() || !self.draft.is_dirty() {
            return None;
        }
        if self.in_flight.is_some() {
            self.flush_deferred = true;
            return None;
        }
        let revision = self.draft.revision;
        self.in_flight = Some(revision);
        tracing::debug!(id = ?self.draft.id, revision, "flushing draft");
        Some(EditCommand::Save {
            revision,
            article: self.draft.snapshot(),
        })
    }

    /// Apply the outcome of the save sent at `revision`.
    ///
    /// Response payloads never overwrite local fields. Only the id is
    /// adopted, so the next flush updates instead of creating again.
    pub fn save_completed(
        &mut self,
        revision: u64,
        result: Result<ArticleId, ApiError>,
        now_ms: u64,
    ) -> Option<EditCommand> {
        if self.in_flight != Some(revision) {
            tracing::debug!(revision, "ignoring reply for a save this buffer did not send");
            return None;
        }
        self.in_flight = None;
        self.delete_error = None;
        match result {
            Ok(id) => {
                if self.draft.id.is_none() {
                    self.draft.id = Some(id);
                }
                self.draft.saved_revision = self.draft.saved_revision.max(revision);
                self.failure = None;
                if self.delete_when_created {
                    self.delete_when_created = false;
                    return Some(EditCommand::Delete(id));
                }
                if !self.draft.is_dirty() {
                    self.flush_deferred = false;
                    return None;
                }
                if self.timers.is_pending(&Timer::Flush) {
                    self.flush_deferred = false;
                    None
                } else if std::mem::take(&mut self.flush_deferred) {
                    self.flush()
                } else {
                    self.timers.schedule(Timer::Flush, SAVE_DEBOUNCE_MS, now_ms);
                    None
                }
            }
            Err(err) => {
                if self.delete_when_created {
                    // Nothing was created, so there is nothing to delete.
                    self.delete_when_created = false;
                    self.phase = Phase::Deleted;
                    return None;
                }
                let attempt = self.failure.as_ref().map_or(1, |f| f.attempt + 1);
                tracing::warn!(revision, attempt, error = %err, "save failed");
                self.failure = Some(SaveFailure {
                    message: err.to_string(),
                    attempt,
                });
                self.flush_deferred = false;
                if self.is_editable() && !self.timers.is_pending(&Timer::Flush) {
                    self.timers
                        .schedule(Timer::Flush, retry_delay_ms(attempt), now_ms);
                }
                None
            }
        }
    }

    pub fn request_delete(&mut self) {
        if self.phase == Phase::Open {
            self.delete_error = None;
            self.phase = Phase::ConfirmDelete;
        }
    }

    pub fn cancel_delete(&mut self) {
        if self.phase == Phase::ConfirmDelete {
            self.phase = Phase::Open;
        }
    }

    /// Irrevocably delete the article. Timers are dropped; an article that
    /// never reached the server is discarded locally.
    pub fn confirm_delete(&mut self) -> Option<EditCommand> {
        if self.phase != Phase::ConfirmDelete {
            return None;
        }
        self.timers.clear();
        self.typed.clear();
        match self.draft.id {
            Some(id) => {
                self.phase = Phase::Deleting;
                Some(EditCommand::Delete(id))
            }
            None if self.in_flight.is_some() => {
                self.phase = Phase::Deleting;
                self.delete_when_created = true;
                None
            }
            None => {
                self.phase = Phase::Deleted;
                None
            }
        }
    }

    /// Only a successful delete ends the session; on failure the draft
    /// stays open with the error visible.
    pub fn delete_completed(&mut self, result: Result<(), ApiError>, now_ms: u64) {
        if self.phase != Phase::Deleting {
            return;
        }
        match result {
            Ok(()) => self.phase = Phase::Deleted,
            Err(err) => {
                tracing::warn!(id = ?self.draft.id, error = %err, "delete failed");
                self.delete_error = Some(err.to_string());
                self.phase = Phase::Open;
                if self.draft.is_dirty() {
                    self.timers.schedule(Timer::Flush, SAVE_DEBOUNCE_MS, now_ms);
                }
            }
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.phase == Phase::Deleted
    }

    pub fn status(&self) -> Status {
        match &self.phase {
            Phase::Loading(_) => Status::Loading,
            Phase::LoadFailed(message) => Status::LoadFailed(message.clone()),
            Phase::ConfirmDelete => Status::ConfirmDelete,
            Phase::Deleting => Status::Deleting,
            Phase::Deleted => Status::Deleted,
            // A save in flight outranks the outcome of earlier requests.
            Phase::Open => {
                if self.is_dirty() && self.in_flight == Some(self.draft.revision) {
                    return Status::Saving;
                }
                if let Some(failure) = &self.failure {
                    return Status::SaveFailed {
                        message: failure.message.clone(),
                        attempt: failure.attempt,
                    };
                }
                if let Some(message) = &self.delete_error {
                    return Status::DeleteFailed(message.clone());
                }
                if self.is_dirty() {
                    Status::Editing
                } else {
                    Status::Saved
                }
            }
        }
    }
}

/// Exponential backoff starting at the save debounce: 2s, 4s, 8s, ...
pub fn retry_delay_ms(attempt: u32) -> u64 {
    let shift = attempt.saturating_sub(1).min(16);
    SAVE_DEBOUNCE_MS.saturating_mul(1 << shift).min(RETRY_CAP_MS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 5, 1)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .unwrap()
    }

    fn article(id: ArticleId) -> Article {
        Article {
            id,
            title: "Caching".to_string(),
            content: "LRU notes".to_string(),
            tags: vec!["go".to_string()],
            created_on: stamp(),
            updated_on: stamp(),
        }
    }

    fn opened(id: ArticleId) -> EditBuffer {
        let (mut buffer, _) = EditBuffer::open(id);
        buffer.loaded(Ok(article(id)));
        buffer
    }

    fn saves(commands: &[EditCommand]) -> Vec<(u64, ArticleInsert)> {
        commands
            .iter()
            .filter_map(|cmd| match cmd {
                EditCommand::Save { revision, article } => Some((*revision, article.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_open_requests_load_and_seeds_clean_draft() {
        let (mut buffer, cmd) = EditBuffer::open(7);
        assert_eq!(cmd, EditCommand::Load(7));
        assert_eq!(buffer.status(), Status::Loading);

        buffer.loaded(Ok(article(7)));
        assert_eq!(buffer.status(), Status::Saved);
        assert!(!buffer.is_dirty());
        assert_eq!(buffer.draft().title, "Caching");
        assert_eq!(buffer.next_deadline(), None);
    }

    #[test]
    fn test_load_failure_is_visible() {
        let (mut buffer, _) = EditBuffer::open(7);
        buffer.loaded(Err(ApiError::NotFound));
        assert_eq!(buffer.status(), Status::LoadFailed("not found".to_string()));
        buffer.set_field(Edit::Title("x".to_string()), 0);
        assert!(buffer.tick(10_000).is_empty());
    }

    #[test]
    fn test_new_article_saves_immediately_as_creation() {
        let mut buffer = EditBuffer::new_article(100);
        assert!(buffer.is_dirty());
        let sent = saves(&buffer.tick(100));
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.id, None);
    }

    #[test]
    fn test_rapid_edits_collapse_into_one_save_with_final_values() {
        let mut buffer = opened(3);
        buffer.set_field(Edit::Title("C".to_string()), 0);
        buffer.set_field(Edit::Title("Ca".to_string()), 500);
        buffer.set_field(Edit::Tags(vec!["rust".to_string()]), 1_500);
        buffer.set_field(Edit::Title("Cache".to_string()), 3_000);

        assert!(buffer.tick(4_999).is_empty());
        let sent = saves(&buffer.tick(5_000));
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.title, "Cache");
        assert_eq!(sent[0].1.tags, vec!["rust".to_string()]);
        assert_eq!(sent[0].1.id, Some(3));
        assert_eq!(buffer.status(), Status::Saving);
    }

    #[test]
    fn test_successful_save_clears_dirty() {
        let mut buffer = opened(3);
        buffer.set_field(Edit::Content("new".to_string()), 0);
        let (revision, _) = saves(&buffer.tick(2_000)).remove(0);
        assert!(buffer.save_completed(revision, Ok(3), 2_100).is_none());
        assert!(!buffer.is_dirty());
        assert_eq!(buffer.status(), Status::Saved);
        assert_eq!(buffer.next_deadline(), None);
    }

    #[test]
    fn test_creation_id_is_used_for_following_saves() {
        let mut buffer = EditBuffer::new_article(0);
        let (revision, first) = saves(&buffer.tick(0)).remove(0);
        assert_eq!(first.id, None);
        buffer.save_completed(revision, Ok(42), 50);
        assert_eq!(buffer.draft().id, Some(42));

        buffer.set_field(Edit::Title("Second thoughts".to_string()), 100);
        let (_, second) = saves(&buffer.tick(2_100)).remove(0);
        assert_eq!(second.id, Some(42));
        assert_eq!(second.title, "Second thoughts");
    }

    #[test]
    fn test_edit_during_flight_keeps_dirty_and_schedules_one_more_save() {
        let mut buffer = opened(3);
        buffer.set_field(Edit::Title("one".to_string()), 0);
        let (revision, _) = saves(&buffer.tick(2_000)).remove(0);

        buffer.set_field(Edit::Title("two".to_string()), 2_100);
        assert!(buffer.save_completed(revision, Ok(3), 2_200).is_none());
        assert!(buffer.is_dirty());
        assert_eq!(buffer.status(), Status::Editing);
        assert_eq!(buffer.draft().title, "two");

        let sent = saves(&buffer.tick(4_100));
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.title, "two");
        assert!(buffer.tick(100_000).is_empty());
    }

    #[test]
    fn test_flush_due_during_flight_is_sent_when_response_arrives() {
        let mut buffer = opened(3);
        buffer.set_field(Edit::Title("one".to_string()), 0);
        let (revision, _) = saves(&buffer.tick(2_000)).remove(0);

        buffer.set_field(Edit::Title("two".to_string()), 2_100);
        assert!(saves(&buffer.tick(4_100)).is_empty());

        let next = buffer.save_completed(revision, Ok(3), 4_500);
        match next {
            Some(EditCommand::Save { article, .. }) => assert_eq!(article.title, "two"),
            other => panic!("expected deferred save, got {other:?}"),
        }
        assert!(buffer.tick(100_000).is_empty());
    }

    #[test]
    fn test_creation_in_flight_is_never_duplicated() {
        let mut buffer = EditBuffer::new_article(0);
        let (revision, _) = saves(&buffer.tick(0)).remove(0);
        buffer.set_field(Edit::Title("typed fast".to_string()), 10);
        assert!(saves(&buffer.tick(2_010)).is_empty());

        let Some(EditCommand::Save { article, .. }) = buffer.save_completed(revision, Ok(42), 3_000)
        else {
            panic!("expected follow-up save");
        };
        assert_eq!(article.id, Some(42));
    }

    #[test]
    fn test_typing_commits_after_input_debounce_then_saves() {
        let mut buffer = opened(3);
        buffer.type_text(Edit::Content("h".to_string()), 0);
        buffer.type_text(Edit::Content("hello".to_string()), 400);
        assert_eq!(buffer.display_value(Field::Content), Edit::Content("hello".to_string()));
        assert!(!buffer.is_dirty());

        assert!(buffer.tick(1_399).is_empty());
        assert!(buffer.tick(1_400).is_empty());
        assert!(buffer.is_dirty());
        assert_eq!(buffer.draft().content, "hello");

        let sent = saves(&buffer.tick(3_400));
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.content, "hello");
    }

    #[test]
    fn test_explicit_save_commits_typing_and_skips_debounce() {
        let mut buffer = opened(3);
        buffer.type_text(Edit::Title("draft title".to_string()), 0);
        let Some(EditCommand::Save { article, .. }) = buffer.save(10) else {
            panic!("expected save");
        };
        assert_eq!(article.title, "draft title");
        assert!(buffer.tick(100_000).is_empty());
    }

    #[test]
    fn test_save_failure_surfaces_and_retries_with_backoff() {
        let mut buffer = opened(3);
        buffer.set_field(Edit::Title("x".to_string()), 0);
        let (revision, _) = saves(&buffer.tick(2_000)).remove(0);

        buffer.save_completed(revision, Err(ApiError::Unauthorized), 2_100);
        assert!(buffer.is_dirty());
        assert_eq!(
            buffer.status(),
            Status::SaveFailed {
                message: "not authorized".to_string(),
                attempt: 1
            }
        );
        assert_eq!(buffer.next_deadline(), Some(2_100 + 2_000));

        let (revision, _) = saves(&buffer.tick(4_100)).remove(0);
        buffer.save_completed(revision, Err(ApiError::NotFound), 4_200);
        assert_eq!(buffer.next_deadline(), Some(4_200 + 4_000));

        let (revision, _) = saves(&buffer.tick(8_200)).remove(0);
        buffer.save_completed(revision, Ok(3), 8_300);
        assert_eq!(buffer.status(), Status::Saved);
    }

    #[test]
    fn test_new_edit_after_failure_resets_to_normal_debounce() {
        let mut buffer = opened(3);
        buffer.set_field(Edit::Title("x".to_string()), 0);
        let (revision, _) = saves(&buffer.tick(2_000)).remove(0);
        buffer.save_completed(revision, Err(ApiError::NotFound), 2_100);

        buffer.set_field(Edit::Title("y".to_string()), 3_000);
        assert_eq!(buffer.status(), Status::Editing);
        assert_eq!(buffer.next_deadline(), Some(5_000));
    }

    #[test]
    fn test_retry_delay_doubles_up_to_cap() {
        assert_eq!(retry_delay_ms(1), 2_000);
        assert_eq!(retry_delay_ms(2), 4_000);
        assert_eq!(retry_delay_ms(3), 8_000);
        assert_eq!(retry_delay_ms(6), RETRY_CAP_MS);
        assert_eq!(retry_delay_ms(40), RETRY_CAP_MS);
    }

    #[test]
    fn test_delete_requires_confirmation_and_success() {
        let mut buffer = opened(9);
        assert!(buffer.confirm_delete().is_none());

        buffer.request_delete();
        assert_eq!(buffer.status(), Status::ConfirmDelete);
        assert_eq!(buffer.confirm_delete(), Some(EditCommand::Delete(9)));
        assert_eq!(buffer.status(), Status::Deleting);

        buffer.delete_completed(Ok(()), 0);
        assert!(buffer.is_deleted());
    }

    #[test]
    fn test_failed_delete_keeps_draft_open() {
        let mut buffer = opened(9);
        buffer.set_field(Edit::Title("keep me".to_string()), 0);
        buffer.request_delete();
        buffer.confirm_delete();
        assert_eq!(buffer.next_deadline(), None);

        buffer.delete_completed(
            Err(ApiError::Status {
                status: 500,
                body: String::new(),
            }),
            10,
        );
        assert!(!buffer.is_deleted());
        assert!(matches!(buffer.status(), Status::DeleteFailed(_)));
        assert_eq!(buffer.next_deadline(), Some(10 + SAVE_DEBOUNCE_MS));
    }

    #[test]
    fn test_save_outcome_replaces_earlier_delete_failure() {
        let mut buffer = opened(9);
        buffer.request_delete();
        buffer.confirm_delete();
        buffer.delete_completed(Err(ApiError::NotFound), 0);
        assert_eq!(buffer.status(), Status::DeleteFailed("not found".to_string()));

        buffer.set_field(Edit::Title("after".to_string()), 100);
        assert_eq!(buffer.status(), Status::Editing);

        let (revision, _) = saves(&buffer.tick(2_100)).remove(0);
        buffer.save_completed(revision, Err(ApiError::Unauthorized), 2_200);
        assert!(buffer.is_dirty());
        assert_eq!(
            buffer.status(),
            Status::SaveFailed {
                message: "not authorized".to_string(),
                attempt: 1
            }
        );

        let (revision, _) = saves(&buffer.tick(4_200)).remove(0);
        buffer.save_completed(revision, Ok(9), 4_300);
        assert!(!buffer.is_dirty());
        assert_eq!(buffer.status(), Status::Saved);
    }

    #[test]
    fn test_save_after_failed_delete_clears_the_delete_error() {
        let mut buffer = opened(9);
        buffer.set_field(Edit::Title("keep".to_string()), 0);
        buffer.request_delete();
        buffer.confirm_delete();
        buffer.delete_completed(Err(ApiError::NotFound), 10);

        let (revision, _) = saves(&buffer.tick(10 + SAVE_DEBOUNCE_MS)).remove(0);
        assert_eq!(buffer.status(), Status::Saving);
        buffer.save_completed(revision, Ok(9), 3_000);
        assert_eq!(buffer.status(), Status::Saved);
    }

    #[test]
    fn test_retry_in_flight_reports_saving() {
        let mut buffer = opened(3);
        buffer.set_field(Edit::Title("x".to_string()), 0);
        let (revision, _) = saves(&buffer.tick(2_000)).remove(0);
        buffer.save_completed(revision, Err(ApiError::NotFound), 2_100);
        assert!(matches!(buffer.status(), Status::SaveFailed { .. }));

        assert_eq!(saves(&buffer.tick(4_100)).len(), 1);
        assert_eq!(buffer.status(), Status::Saving);
    }

    #[test]
    fn test_reply_for_unsent_revision_is_ignored() {
        let mut buffer = opened(3);
        buffer.set_field(Edit::Title("x".to_string()), 0);
        assert!(buffer.save_completed(1, Ok(3), 100).is_none());
        assert!(buffer.is_dirty());
        assert_eq!(buffer.status(), Status::Editing);
        assert_eq!(buffer.next_deadline(), Some(SAVE_DEBOUNCE_MS));
    }

    #[test]
    fn test_cancel_delete_returns_to_editing() {
        let mut buffer = opened(9);
        buffer.request_delete();
        buffer.cancel_delete();
        assert_eq!(buffer.status(), Status::Saved);
    }

    #[test]
    fn test_deleting_unsaved_article_is_local() {
        let mut buffer = EditBuffer::new_article(0);
        buffer.request_delete();
        assert!(buffer.confirm_delete().is_none());
        assert!(buffer.is_deleted());
        assert!(buffer.tick(10_000).is_empty());
    }

    #[test]
    fn test_delete_during_creation_waits_for_id() {
        let mut buffer = EditBuffer::new_article(0);
        let (revision, _) = saves(&buffer.tick(0)).remove(0);
        buffer.request_delete();
        assert!(buffer.confirm_delete().is_none());
        assert_eq!(buffer.status(), Status::Deleting);

        let next = buffer.save_completed(revision, Ok(42), 100);
        assert_eq!(next, Some(EditCommand::Delete(42)));
        buffer.delete_completed(Ok(()), 200);
        assert!(buffer.is_deleted());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn edits_within_window_send_one_save_with_final_values(
                titles in proptest::collection::vec("[a-z]{1,8}", 1..30),
                gaps in proptest::collection::vec(0..SAVE_DEBOUNCE_MS, 30),
            ) {
                let mut buffer = opened(1);
                let mut now = 0;
                let mut sent = Vec::new();
                for (title, gap) in titles.iter().zip(&gaps) {
                    now += gap;
                    sent.extend(saves(&buffer.tick(now.saturating_sub(1))));
                    buffer.set_field(Edit::Title(title.clone()), now);
                }
                prop_assert!(sent.is_empty());
                sent.extend(saves(&buffer.tick(now + SAVE_DEBOUNCE_MS)));
                prop_assert_eq!(sent.len(), 1);
                prop_assert_eq!(&sent[0].1.title, titles.last().unwrap());
            }

            #[test]
            fn clean_draft_matches_last_confirmed_snapshot(
                steps in proptest::collection::vec((any::<bool>(), 0..3_000u64), 1..40),
            ) {
                let mut buffer = opened(1);
                let mut now = 0;
                let mut confirmed = buffer.draft().title.clone();
                let mut in_flight: Option<(u64, String)> = None;
                for (i, (respond, gap)) in steps.into_iter().enumerate() {
                    now += gap;
                    if respond {
                        if let Some((revision, title)) = in_flight.take() {
                            let follow = buffer.save_completed(revision, Ok(1), now);
                            confirmed = title;
                            in_flight = saves(&follow.into_iter().collect::<Vec<_>>())
                                .pop()
                                .map(|(r, a)| (r, a.title));
                        }
                    } else {
                        buffer.set_field(Edit::Title(format!("t{i}")), now);
                    }
                    for (revision, article) in saves(&buffer.tick(now)) {
                        prop_assert!(in_flight.is_none());
                        in_flight = Some((revision, article.title));
                    }
                    if !buffer.is_dirty() {
                        prop_assert_eq!(&buffer.draft().title, &confirmed);
                    }
                }
            }
        }
    }
}
