//! Incrementally loaded article feed.
//!
//! - [`FeedCursor`]: filter state, accumulated pages and the stale-page guard
//! - [`highlight_segments`]: splitting search previews into matched runs

mod cursor;
mod highlight;

pub use cursor::{FeedCursor, FeedFilter, PAGE_SIZE, PageRequest, QUERY_DEBOUNCE_MS, TagMatch};
pub use highlight::{Segment, highlight_segments};
