//! Application state and the runtime that drives it.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete client state
//! - [`Message`]: All possible events and request completions
//! - [`update`]: Pure function for state transitions, returning [`Command`]s
//! - [`Runtime`]: Executes commands and fires debounce timers

mod effects;
mod event_loop;
mod model;
mod update;

pub use event_loop::Runtime;
pub use model::Model;
pub use update::{Command, LoadTarget, Message, update};
