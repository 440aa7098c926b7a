use std::collections::VecDeque;
use std::path::PathBuf;

use crate::api::Backend;
use crate::app::{Message, Model, update};
use crate::schedule::{Clock, SystemClock};

/// Owns the model and drives it: runs [`update`], executes the returned
/// commands against the backend and feeds their results back in.
///
/// Commands run one at a time in the order they were issued, so a save
/// always resolves before the next timer is looked at.
pub struct Runtime<B, C = SystemClock> {
    pub(super) backend: B,
    pub(super) clock: C,
    pub(super) model: Model,
    pub(super) state_path: Option<PathBuf>,
}

impl<B: Backend, C: Clock> Runtime<B, C> {
    pub fn new(backend: B, clock: C) -> Self {
        Self {
            backend,
            clock,
            model: Model::new(),
            state_path: None,
        }
    }

    /// Remember the last email (and session token) in this file.
    #[must_use]
    pub fn with_state_path(mut self, path: PathBuf) -> Self {
        self.state_path = Some(path);
        self
    }

    pub const fn model(&self) -> &Model {
        &self.model
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Handle one message and everything it transitively triggers.
    pub async fn dispatch(&mut self, msg: Message) {
        let mut queue = VecDeque::from([msg]);
        while let Some(msg) = queue.pop_front() {
            let now_ms = self.clock.now_ms();
            let model = std::mem::take(&mut self.model);
            let (model, commands) = update(model, msg, now_ms);
            self.model = model;
            for command in commands {
                tracing::debug!(?command, "executing");
                if let Some(reply) = self.execute(command).await {
                    queue.push_back(reply);
                }
            }
        }
    }

    /// Fire whatever timers are due now.
    pub async fn tick(&mut self) {
        self.dispatch(Message::Tick).await;
    }

    /// Keep firing timers until none are pending.
    ///
    /// Gives up once the next deadline lies more than `budget_ms` past the
    /// start, e.g. while a failing save keeps backing off. Returns true if
    /// everything settled.
    pub async fn settle(&mut self, budget_ms: u64) -> bool {
        let give_up_at = self.clock.now_ms().saturating_add(budget_ms);
        while let Some(due) = self.model.next_deadline() {
            if due > give_up_at {
                tracing::debug!(due, give_up_at, "timers still pending after budget");
                return false;
            }
            let now_ms = self.clock.now_ms();
            if due > now_ms {
                self.clock.sleep(due - now_ms).await;
            }
            self.tick().await;
        }
        true
    }
}
