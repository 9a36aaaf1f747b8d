//! Create and delete mutations.
//!
//! A mutation makes exactly one service call per invocation, never
//! retried. On success it invalidates the query prefixes its
//! [`MutationSpec`] declares and waits for the observed keys under them
//! to refetch. Failures stay on the mutation; they never touch the
//! listing's cache entries.

use notehub_cache::{CacheKey, QueryCache};
use notehub_core::{MutationError, QueryPrefix};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// What a mutation is called and which cached queries it makes stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationSpec {
    pub name: &'static str,
    pub invalidates: Vec<QueryPrefix>,
}

impl MutationSpec {
    pub fn create_note() -> Self {
        Self {
            name: "create",
            invalidates: vec![QueryPrefix::notes()],
        }
    }

    pub fn delete_note() -> Self {
        Self {
            name: "delete",
            invalidates: vec![QueryPrefix::notes()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MutationState {
    #[default]
    Idle,
    Pending,
    Success,
    Error(MutationError),
}

impl MutationState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn error(&self) -> Option<&MutationError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }
}

/// Shared handle to one mutation's state. Clones observe the same state.
#[derive(Debug, Clone)]
pub struct Mutation {
    spec: Arc<MutationSpec>,
    state: Arc<Mutex<MutationState>>,
}

impl Mutation {
    pub fn new(spec: MutationSpec) -> Self {
        Self {
            spec: Arc::new(spec),
            state: Arc::new(Mutex::new(MutationState::Idle)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MutationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn spec(&self) -> &MutationSpec {
        &self.spec
    }

    pub fn state(&self) -> MutationState {
        self.lock().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.lock().is_pending()
    }

    pub fn error(&self) -> Option<MutationError> {
        self.lock().error().cloned()
    }

    /// Back to `Idle`, unless a call is in flight.
    pub fn reset(&self) {
        let mut state = self.lock();
        if !state.is_pending() {
            *state = MutationState::Idle;
        }
    }

    /// Mark the mutation pending and hand back the ticket that settles it.
    ///
    /// Fails with [`MutationError::Busy`] while another call is pending.
    /// Dropping the ticket unsettled returns the mutation to `Idle`.
    pub fn begin(&self) -> Result<MutationTicket, MutationError> {
        let mut state = self.lock();
        if state.is_pending() {
            return Err(MutationError::Busy(self.spec.name));
        }
        *state = MutationState::Pending;
        drop(state);
        tracing::debug!(mutation = self.spec.name, "Mutation started");
        Ok(MutationTicket {
            mutation: self.clone(),
            settled: false,
        })
    }

    /// Run `call` once.
    ///
    /// On success `on_success` runs first, then every declared prefix is
    /// invalidated and its observed keys are awaited. A second run while
    /// one is pending fails with [`MutationError::Busy`] without calling
    /// the service.
    pub async fn run<K, V, T, F>(
        &self,
        cache: &QueryCache<K, V>,
        call: F,
        on_success: impl FnOnce(&T),
    ) -> Result<T, MutationError>
    where
        K: CacheKey,
        V: Clone + Send + Sync + 'static,
        F: Future<Output = Result<T, MutationError>>,
    {
        let ticket = self.begin()?;
        let result = call.await;
        ticket.finish(cache, result, on_success).await
    }
}

/// A pending mutation call, settled by [`MutationTicket::finish`].
#[must_use = "an unsettled ticket resets its mutation to Idle on drop"]
#[derive(Debug)]
pub struct MutationTicket {
    mutation: Mutation,
    settled: bool,
}

impl MutationTicket {
    pub fn spec(&self) -> &MutationSpec {
        self.mutation.spec()
    }

    /// Record the call's outcome.
    ///
    /// On success `on_success` runs before the declared prefixes are
    /// invalidated; the state turns `Success` once their refetches settle.
    pub async fn finish<K, V, T>(
        mut self,
        cache: &QueryCache<K, V>,
        result: Result<T, MutationError>,
        on_success: impl FnOnce(&T),
    ) -> Result<T, MutationError>
    where
        K: CacheKey,
        V: Clone + Send + Sync + 'static,
    {
        self.settled = true;
        let mutation = self.mutation.clone();
        let name = mutation.spec.name;
        match result {
            Ok(value) => {
                on_success(&value);
                for prefix in &mutation.spec.invalidates {
                    cache.invalidate(prefix).await;
                }
                *mutation.lock() = MutationState::Success;
                tracing::info!(mutation = name, "Mutation succeeded");
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(mutation = name, error = %err, "Mutation failed");
                *mutation.lock() = MutationState::Error(err.clone());
                Err(err)
            }
        }
    }
}

impl Drop for MutationTicket {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.mutation.lock();
        if state.is_pending() {
            *state = MutationState::Idle;
            tracing::debug!(mutation = self.mutation.spec.name, "Mutation abandoned");
        }
    }
}
