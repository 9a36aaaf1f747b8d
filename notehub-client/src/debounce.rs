//! Trailing-edge debouncing.
//!
//! A [`Debouncer`] holds the committed value and at most one pending
//! candidate. Every push restarts the quiet period; the candidate is
//! committed once `delay` has passed with no further push. The caller
//! drives time by calling [`Debouncer::poll`], usually when the
//! [`Debouncer::deadline`] timer fires.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    value: T,
    pending: Option<Pending<T>>,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

impl<T: Clone + PartialEq> Debouncer<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            delay,
            value: initial,
            pending: None,
        }
    }

    /// Last committed value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Record a new input at `now`, replacing any pending one.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some(Pending {
            value,
            deadline: now + self.delay,
        });
    }

    /// When the pending value becomes due, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Commit the pending value if its quiet period is over.
    ///
    /// Returns the new value only when it differs from the previously
    /// committed one; typing and erasing back to the same text within
    /// the window is not a change.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some(pending) if now >= pending.deadline => self.commit(),
            _ => None,
        }
    }

    fn commit(&mut self) -> Option<T> {
        let pending = self.pending.take()?;
        if pending.value == self.value {
            return None;
        }
        self.value = pending.value.clone();
        Some(pending.value)
    }
}
