//! Fetch lifecycle with stale-result protection.
//!
//! Every fetch takes a ticket carrying a generation number. Completing with a
//! ticket that is no longer the latest discards the result, so a slow fetch
//! started before a locale change can never overwrite a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{FailureKind, FetchError};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FetchState<T> {
    Idle,
    Loading { generation: u64 },
    Ready { generation: u64, value: T },
    Failed { generation: u64, kind: FailureKind, message: String },
}

impl<T> FetchState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading { .. })
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            FetchState::Ready { value, .. } => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

impl FetchTicket {
    pub fn generation(self) -> u64 {
        self.generation
    }
}

#[derive(Debug)]
pub struct ForecastSession<T> {
    latest: AtomicU64,
    state: Mutex<FetchState<T>>,
}

impl<T> Default for ForecastSession<T> {
    fn default() -> Self {
        Self {
            latest: AtomicU64::new(0),
            state: Mutex::new(FetchState::Idle),
        }
    }
}

impl<T: Clone> ForecastSession<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new fetch; any ticket handed out earlier becomes stale.
    pub fn begin(&self) -> FetchTicket {
        let mut state = self.lock();
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        *state = FetchState::Loading { generation };
        drop(state);
        info!(generation, "forecast fetch started");
        FetchTicket { generation }
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.generation
    }

    /// Apply a finished fetch. Returns `false` when the ticket was stale and
    /// the result was dropped.
    pub fn complete(&self, ticket: FetchTicket, result: Result<T, FetchError>) -> bool {
        let mut state = self.lock();
        // checked under the lock so a concurrent begin() cannot slip in between
        if !self.is_current(ticket) {
            debug!(generation = ticket.generation, "discarding stale forecast result");
            return false;
        }
        let generation = ticket.generation;
        *state = match result {
            Ok(value) => {
                info!(generation, "forecast ready");
                FetchState::Ready { generation, value }
            }
            Err(err) => {
                info!(generation, error = %err, "forecast fetch failed");
                FetchState::Failed {
                    generation,
                    kind: err.kind(),
                    message: err.to_string(),
                }
            }
        };
        true
    }

    pub fn state(&self) -> FetchState<T> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, FetchState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
