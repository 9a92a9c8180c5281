//! A value that is reused until it is older than its time to live.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub(crate) struct Cached<T> {
    ttl: Duration,
    entry: Option<(Instant, T)>,
}

impl<T: Clone> Cached<T> {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    /// Returns the cached value if it is still fresh.
    pub(crate) fn get(&self) -> Option<T> {
        self.get_at(Instant::now())
    }

    pub(crate) fn put(&mut self, value: T) {
        self.put_at(Instant::now(), value)
    }

    pub(crate) fn invalidate(&mut self) {
        self.entry = None;
    }

    fn get_at(&self, now: Instant) -> Option<T> {
        match &self.entry {
            Some((stored, value)) if now.saturating_duration_since(*stored) < self.ttl => {
                Some(value.clone())
            }
            _ => None,
        }
    }

    fn put_at(&mut self, now: Instant, value: T) {
        self.entry = Some((now, value));
    }
}
