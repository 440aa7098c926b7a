use crate::api::{ApiError, ArticleSummary, ListQuery, SortKey};
use crate::schedule::Scheduler;

/// Articles requested per page.
pub const PAGE_SIZE: usize = 10;
/// Quiet time before the search box becomes part of the filter.
pub const QUERY_DEBOUNCE_MS: u64 = 500;

/// How multiple selected tags combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TagMatch {
    /// At least one selected tag.
    #[default]
    Any,
    /// Every selected tag.
    All,
}

/// The active listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedFilter {
    pub query: String,
    /// Tag keys as the listing endpoint expects them.
    pub tags: Vec<String>,
    pub tag_match: TagMatch,
    pub sort_by: SortKey,
}

impl FeedFilter {
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn with_tag_match(mut self, tag_match: TagMatch) -> Self {
        self.tag_match = tag_match;
        self
    }

    #[must_use]
    pub const fn with_sort(mut self, sort_by: SortKey) -> Self {
        self.sort_by = sort_by;
        self
    }

    fn list_query(&self, from: usize) -> ListQuery {
        ListQuery {
            from,
            limit: PAGE_SIZE,
            all_tags: self.tag_match == TagMatch::All,
            sort_by: self.sort_by,
            query: self.query.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// A listing request tagged with the generation it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub generation: u64,
    pub fresh: bool,
    pub query: ListQuery,
}

/// Accumulating, filterable feed of article summaries.
///
/// Every filter change and every fresh load starts a new generation.
/// Pages that come back for an older generation are dropped, so a slow
/// response can never land on a list built for a different filter.
#[derive(Debug, Clone)]
pub struct FeedCursor {
    filter: FeedFilter,
    items: Vec<ArticleSummary>,
    has_more: bool,
    generation: u64,
    in_flight: bool,
    typed_query: Option<String>,
    timers: Scheduler<()>,
}

impl FeedCursor {
    pub const fn new() -> Self {
        Self {
            filter: FeedFilter {
                query: String::new(),
                tags: Vec::new(),
                tag_match: TagMatch::Any,
                sort_by: SortKey::Created,
            },
            items: Vec::new(),
            has_more: true,
            generation: 0,
            in_flight: false,
            typed_query: None,
            timers: Scheduler::new(),
        }
    }

    pub const fn filter(&self) -> &FeedFilter {
        &self.filter
    }

    pub fn items(&self) -> &[ArticleSummary] {
        &self.items
    }

    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    pub const fn is_loading(&self) -> bool {
        self.in_flight
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Text to show in the search box, including typing not yet applied.
    pub fn query_text(&self) -> &str {
        self.typed_query.as_deref().unwrap_or(&self.filter.query)
    }

    /// Replace the filter, empty the list and load its first page.
    pub fn set_filter(&mut self, filter: FeedFilter) -> PageRequest {
        tracing::debug!(?filter, "feed filter changed");
        self.filter = filter;
        self.items.clear();
        self.has_more = true;
        self.start_over()
    }

    /// Next page request. `fresh` starts over from offset 0 and replaces
    /// the list when it arrives. Appending loads are skipped while a page is
    /// in flight or once the feed is exhausted.
    pub fn load_more(&mut self, fresh: bool) -> Option<PageRequest> {
        if fresh {
            return Some(self.start_over());
        }
        if self.in_flight || !self.has_more {
            return None;
        }
        self.in_flight = true;
        Some(PageRequest {
            generation: self.generation,
            fresh: false,
            query: self.filter.list_query(self.items.len()),
        })
    }

    fn start_over(&mut self) -> PageRequest {
        self.generation += 1;
        self.in_flight = true;
        PageRequest {
            generation: self.generation,
            fresh: true,
            query: self.filter.list_query(0),
        }
    }

    /// Apply a page. Returns false when it belonged to a stale generation.
    ///
    /// Errors (including 404) count as an empty page.
    pub fn page_loaded(
        &mut self,
        request: &PageRequest,
        result: Result<Vec<ArticleSummary>, ApiError>,
    ) -> bool {
        if request.generation != self.generation {
            tracing::debug!(
                stale = request.generation,
                current = self.generation,
                "dropping stale feed page"
            );
            return false;
        }
        self.in_flight = false;
        let page = result.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "feed page failed, treating as empty");
            Vec::new()
        });
        self.has_more = page.len() == PAGE_SIZE;
        if request.fresh {
            self.items = page;
        } else {
            self.items.extend(page);
        }
        true
    }

    /// Search box input, debounced by [`QUERY_DEBOUNCE_MS`].
    pub fn type_query(&mut self, text: impl Into<String>, now_ms: u64) {
        self.typed_query = Some(text.into());
        self.timers.schedule((), QUERY_DEBOUNCE_MS, now_ms);
    }

    /// Apply typed query text once it has been quiet long enough.
    pub fn tick(&mut self, now_ms: u64) -> Option<PageRequest> {
        if self.timers.take_due(now_ms).is_empty() {
            return None;
        }
        let query = self.typed_query.take()?;
        if query == self.filter.query {
            return None;
        }
        Some(self.set_filter(self.filter.clone().with_query(query)))
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_due()
    }

    /// Select or deselect one tag.
    pub fn toggle_tag(&mut self, key: &str) -> PageRequest {
        let mut filter = self.filter.clone();
        if let Some(pos) = filter.tags.iter().position(|t| t == key) {
            filter.tags.remove(pos);
        } else {
            filter.tags.push(key.to_string());
        }
        self.set_filter(filter)
    }

    pub fn set_tag_match(&mut self, tag_match: TagMatch) -> PageRequest {
        self.set_filter(self.filter.clone().with_tag_match(tag_match))
    }

    pub fn toggle_sort(&mut self) -> PageRequest {
        let sort_by = self.filter.sort_by.toggled();
        self.set_filter(self.filter.clone().with_sort(sort_by))
    }
}

impl Default for FeedCursor {
    fn default() -> Self {
        Self::new()
    }
}
