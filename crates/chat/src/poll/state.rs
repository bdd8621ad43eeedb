// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lifecycle phase of the poll loop.
///
/// `Idle → Polling ⇄ BackingOff`, and any phase `→ Stopped`. `Stopped` is
/// terminal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollPhase {
    #[default]
    Idle,
    Polling,
    BackingOff,
    Stopped,
}

impl PollPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Polling => "polling",
            Self::BackingOff => "backing_off",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for PollPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the poll loop, published through a `watch` channel.
///
/// Written only by the controller; everyone else holds a receiver.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PollState {
    pub phase: PollPhase,
    /// Delay before the next fetch: zero while polling, the backoff while
    /// backing off.
    pub next_delay: Duration,
    /// Messages handed to the sink so far.
    pub delivered: u64,
    /// Failed fetches since the last success.
    pub consecutive_failures: u32,
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (next fetch in {} ms, {} delivered, {} consecutive failures)",
            self.phase,
            self.next_delay.as_millis(),
            self.delivered,
            self.consecutive_failures
        )
    }
}
