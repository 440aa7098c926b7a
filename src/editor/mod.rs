//! Edit buffer for a single article.
//!
//! Holds the local draft, debounces typing and saves, and reconciles save
//! responses without letting them overwrite newer local edits.

mod draft;

pub use draft::{
    Draft, Edit, EditBuffer, EditCommand, Field, INPUT_DEBOUNCE_MS, RETRY_CAP_MS,
    SAVE_DEBOUNCE_MS, Status, retry_delay_ms,
};
