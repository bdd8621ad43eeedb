// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the transport adapter and the poll controller.

/// Failure of a single long-poll fetch. Every variant is retried by the
/// poll loop after the backoff delay.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("server unreachable: {0}")]
    Unreachable(String),

    #[error("long poll timed out")]
    Timeout,

    #[error("malformed message: {0}")]
    Malformed(String),
}

impl FetchError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unreachable(_) => "UNREACHABLE",
            Self::Timeout => "TIMEOUT",
            Self::Malformed(_) => "MALFORMED",
        }
    }
}

/// Failure of a single publish. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    #[error("server unreachable: {0}")]
    Unreachable(String),

    #[error("publish rejected with status {0}")]
    Rejected(u16),
}

/// Returned by [`crate::poll::PollController::start`] when the controller
/// is not idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    #[error("poll loop already started")]
    AlreadyStarted,

    #[error("poll loop is stopped; create a new controller to resume")]
    Stopped,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
