// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Long-poll controller: keeps exactly one fetch in flight, hands each
//! message to a [`DeliverySink`], and backs off for a fixed delay after a
//! failed fetch.

pub mod sink;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ControlError, FetchError};
use crate::transport::Transport;

pub use sink::DeliverySink;
pub use state::{PollPhase, PollState};

/// Delay between a failed fetch and the next attempt.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(1000);

/// Smallest accepted backoff. A failure must never be retried immediately.
const MIN_BACKOFF: Duration = Duration::from_millis(1);

/// Drives the poll loop for one session.
///
/// A controller runs at most once: after [`PollController::stop`] a new
/// controller is needed to poll again.
pub struct PollController {
    transport: Arc<dyn Transport>,
    backoff: Duration,
    state_tx: Arc<watch::Sender<PollState>>,
    cancel: CancellationToken,
    exited: CancellationToken,
}

impl PollController {
    pub fn new(transport: Arc<dyn Transport>, backoff: Duration) -> Self {
        let (state_tx, _) = watch::channel(PollState::default());
        Self {
            transport,
            backoff: backoff.max(MIN_BACKOFF),
            state_tx: Arc::new(state_tx),
            cancel: CancellationToken::new(),
            exited: CancellationToken::new(),
        }
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Spawn the loop task and move from `Idle` to `Polling`.
    pub fn start<S: DeliverySink>(&self, sink: S) -> Result<(), ControlError> {
        let mut outcome = Ok(());
        self.state_tx.send_if_modified(|state| match state.phase {
            PollPhase::Idle => {
                state.phase = PollPhase::Polling;
                true
            }
            PollPhase::Stopped => {
                outcome = Err(ControlError::Stopped);
                false
            }
            PollPhase::Polling | PollPhase::BackingOff => {
                outcome = Err(ControlError::AlreadyStarted);
                false
            }
        });
        outcome?;

        let task = PollTask {
            transport: Arc::clone(&self.transport),
            sink: Box::new(sink),
            backoff: self.backoff,
            state_tx: Arc::clone(&self.state_tx),
            cancel: self.cancel.clone(),
        };
        let exited = self.exited.clone();
        tokio::spawn(async move {
            let _exited = exited.drop_guard();
            task.run().await;
        });
        Ok(())
    }

    /// Move to `Stopped`. No fetch is issued afterwards; an in-flight fetch
    /// is abandoned and its result discarded. Safe to call repeatedly.
    pub fn stop(&self) {
        self.cancel.cancel();
        let mut was_idle = false;
        self.state_tx.send_if_modified(|state| {
            was_idle = state.phase == PollPhase::Idle;
            if state.phase == PollPhase::Stopped {
                return false;
            }
            state.phase = PollPhase::Stopped;
            state.next_delay = Duration::ZERO;
            true
        });
        // A start that lost the race saw Stopped and spawned nothing.
        if was_idle {
            self.exited.cancel();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.state_tx.borrow().phase == PollPhase::Stopped
    }

    /// Subscribe to state snapshots.
    pub fn state(&self) -> watch::Receiver<PollState> {
        self.state_tx.subscribe()
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> PollState {
        self.state_tx.borrow().clone()
    }

    /// Wait until the loop task has exited after [`PollController::stop`].
    pub async fn stopped(&self) {
        self.exited.cancelled().await;
    }
}

impl Drop for PollController {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// State owned by the spawned loop task.
struct PollTask {
    transport: Arc<dyn Transport>,
    sink: Box<dyn DeliverySink>,
    backoff: Duration,
    state_tx: Arc<watch::Sender<PollState>>,
    cancel: CancellationToken,
}

impl PollTask {
    async fn run(mut self) {
        info!(backoff_ms = self.backoff.as_millis() as u64, "starting poll loop");
        let mut degraded = false;

        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            self.update(|state| {
                state.phase = PollPhase::Polling;
                state.next_delay = Duration::ZERO;
            });

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                result = self.transport.fetch_next_message() => result,
            };

            if self.cancel.is_cancelled() {
                debug!("poll loop: stopped while fetching, discarding result");
                break;
            }

            match result {
                Ok(message) => {
                    if degraded {
                        degraded = false;
                        info!("poll loop recovered");
                        sink::contain("recovered", || self.sink.recovered());
                    }
                    sink::contain("deliver", || self.sink.deliver(&message));
                    self.update(|state| {
                        state.delivered += 1;
                        state.consecutive_failures = 0;
                    });
                }
                Err(e) => {
                    log_fetch_error(&e, self.backoff);
                    // A timed-out long poll on a quiet server is not an outage.
                    if !degraded && !matches!(e, FetchError::Timeout) {
                        degraded = true;
                        sink::contain("degraded", || self.sink.degraded(&e));
                    }
                    let backoff = self.backoff;
                    self.update(|state| {
                        state.phase = PollPhase::BackingOff;
                        state.next_delay = backoff;
                        state.consecutive_failures += 1;
                    });

                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        }

        self.state_tx.send_if_modified(|state| {
            if state.phase == PollPhase::Stopped {
                return false;
            }
            state.phase = PollPhase::Stopped;
            state.next_delay = Duration::ZERO;
            true
        });
        info!("poll loop exited");
    }

    /// Apply `f` unless the controller has already been stopped.
    fn update(&self, f: impl FnOnce(&mut PollState)) {
        self.state_tx.send_if_modified(|state| {
            if state.phase == PollPhase::Stopped {
                return false;
            }
            f(state);
            true
        });
    }
}

fn log_fetch_error(e: &FetchError, backoff: Duration) {
    let delay_ms = backoff.as_millis() as u64;
    match e {
        FetchError::Malformed(_) => warn!(err = %e, delay_ms, "poll returned malformed message"),
        FetchError::Unreachable(_) | FetchError::Timeout => {
            debug!(err = %e, delay_ms, "poll failed, backing off")
        }
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
