//! Token refresh coordination
//!
//! Guarantees a single refresh call for any number of requests that hit an
//! expired access token at the same time. The first request to report a 401
//! becomes the leader and performs the refresh; every request arriving while
//! that refresh is outstanding becomes a follower and waits on a oneshot
//! channel. When the leader settles, followers are completed in arrival order
//! with the same outcome.
//!
//! States:
//! - Idle: no refresh in flight, `join()` returns a leader
//! - Refreshing: `join()` enqueues and returns a follower
//!
//! The flag is checked and set under a synchronous lock, before the leader
//! reaches its first await point.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::debug;

use crate::error::ApiError;
use crate::metrics;

/// New access token, or the error every participant receives.
pub type RefreshOutcome = Result<String, ApiError>;

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: VecDeque<oneshot::Sender<RefreshOutcome>>,
}

/// Owner of the refresh flag and the follower queue.
#[derive(Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

/// Role handed out by `RefreshCoordinator::join`.
pub enum Ticket<'a> {
    /// Perform the refresh, then call `settle`.
    Leader(RefreshGuard<'a>),
    /// Await the leader's outcome.
    Follower(RefreshWaiter),
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the refresh cycle: lead it if idle, otherwise queue behind it.
    pub fn join(&self) -> Ticket<'_> {
        let mut state = self.lock();
        if state.in_flight {
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            debug!(queued = state.waiters.len(), "refresh in flight, queued request");
            Ticket::Follower(RefreshWaiter { rx })
        } else {
            state.in_flight = true;
            debug!("starting refresh cycle");
            Ticket::Leader(RefreshGuard {
                coordinator: self,
                settled: false,
            })
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().in_flight
    }

    /// Followers currently waiting.
    pub fn pending(&self) -> usize {
        self.lock().waiters.len()
    }

    fn finish(&self, outcome: &RefreshOutcome) {
        let waiters = {
            let mut state = self.lock();
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };
        debug!(
            waiters = waiters.len(),
            success = outcome.is_ok(),
            "refresh cycle settled"
        );
        for waiter in waiters {
            // A follower that gave up has dropped its receiver
            let _ = waiter.send(outcome.clone());
        }
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held by the leader. Dropping it unsettled rejects all followers.
pub struct RefreshGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl RefreshGuard<'_> {
    /// Return to Idle and hand `outcome` to every follower, oldest first.
    pub fn settle(mut self, outcome: &RefreshOutcome) {
        self.settled = true;
        self.coordinator.finish(outcome);
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            metrics::record_refresh("interrupted");
            self.coordinator.finish(&Err(ApiError::refresh_interrupted()));
        }
    }
}

/// A follower's pending outcome.
pub struct RefreshWaiter {
    rx: oneshot::Receiver<RefreshOutcome>,
}

impl RefreshWaiter {
    pub async fn wait(self) -> RefreshOutcome {
        self.rx
            .await
            .unwrap_or_else(|_| Err(ApiError::refresh_interrupted()))
    }
}
