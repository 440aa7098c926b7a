// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. feed::FeedCursor)
    clippy::module_name_repetitions
)]

//! # Jotter
//!
//! A client for a personal markdown notes server.
//!
//! Jotter keeps a local draft of the article being edited and saves it in
//! the background:
//! - Debounced autosave with coalesced writes
//! - One save in flight per article, so a new article is created once
//! - An infinitely scrolling feed with search, tag and sort filters
//! - Stale feed pages dropped when the filter changes mid-request
//!
//! ## Architecture
//!
//! Jotter uses The Elm Architecture (TEA) pattern:
//! - **Model**: Client state
//! - **Message**: User intents and request completions
//! - **Update**: Pure state transitions returning commands
//! - **Runtime**: Executes commands against a [`api::Backend`]
//!
//! ## Modules
//!
//! - [`app`]: Model, update function and runtime
//! - [`api`]: REST types and the HTTP backend
//! - [`editor`]: Autosaving edit buffer
//! - [`feed`]: Paginated, filtered article feed
//! - [`session`]: Login state
//! - [`catalog`]: Tag and link lists
//! - [`schedule`]: Clocks and debounce timers
//! - [`config`]: Saved defaults and session state

pub mod api;
pub mod app;
pub mod catalog;
pub mod config;
pub mod editor;
pub mod feed;
pub mod schedule;
pub mod session;

/// Re-exports for convenience
pub mod prelude {
    pub use crate::api::{ApiError, Backend, HttpBackend};
    pub use crate::app::{Message, Model, Runtime};
    pub use crate::editor::{Edit, EditBuffer};
    pub use crate::feed::{FeedCursor, FeedFilter, TagMatch};
    pub use crate::schedule::{Clock, ManualClock, SystemClock};
}
