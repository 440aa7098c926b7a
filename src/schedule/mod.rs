//! Keyed debounce timers over an injectable millisecond clock.
//!
//! Stores never read the wall clock themselves. They receive `now_ms` from
//! the caller, queue work with [`Scheduler::schedule`], and the runtime
//! drains ready keys with [`Scheduler::take_due`]. Tests drive time with a
//! [`ManualClock`].

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Source of monotonic milliseconds for the runtime.
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed origin.
    fn now_ms(&self) -> u64;

    /// Wait for `ms` milliseconds to pass on this clock.
    fn sleep(&self, ms: u64) -> impl Future<Output = ()>;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn sleep(&self, ms: u64) -> impl Future<Output = ()> {
        tokio::time::sleep(Duration::from_millis(ms))
    }
}

/// Virtual clock that only moves when told to.
///
/// Clones share the same time, so a test can keep a handle while the
/// runtime owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn sleep(&self, ms: u64) -> impl Future<Output = ()> {
        self.advance(ms);
        std::future::ready(())
    }
}

/// Pending tasks keyed by `K`. Scheduling a key that is already pending
/// replaces it; nothing is ever queued twice.
#[derive(Debug, Clone)]
pub struct Scheduler<K> {
    pending: Vec<(K, u64)>,
}

impl<K: PartialEq + Clone> Scheduler<K> {
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Schedule `key` to become due `delay_ms` after `now_ms`, cancelling
    /// any earlier schedule for the same key.
    pub fn schedule(&mut self, key: K, delay_ms: u64, now_ms: u64) {
        let due = now_ms.saturating_add(delay_ms);
        if let Some(slot) = self.pending.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = due;
        } else {
            self.pending.push((key, due));
        }
    }

    /// Returns true if the key was pending.
    pub fn cancel(&mut self, key: &K) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(k, _)| k != key);
        before != self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.iter().any(|(k, _)| k == key)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest due time of any pending key.
    pub fn next_due(&self) -> Option<u64> {
        self.pending.iter().map(|(_, due)| *due).min()
    }

    /// Remove and return every key due at `now_ms`, earliest first.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<K> {
        let mut ready: Vec<(K, u64)> = Vec::new();
        self.pending.retain(|(key, due)| {
            if *due <= now_ms {
                ready.push((key.clone(), *due));
                false
            } else {
                true
            }
        });
        ready.sort_by_key(|(_, due)| *due);
        ready.into_iter().map(|(key, _)| key).collect()
    }
}

impl<K: PartialEq + Clone> Default for Scheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}
