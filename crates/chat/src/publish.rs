// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Publish path: submit a draft once, then clear it.

use tracing::debug;

use crate::error::PublishError;
use crate::message::OutboundDraft;
use crate::transport::Transport;

/// Publish the staged draft and clear its body once the request completes.
///
/// The body is cleared whether or not the publish succeeded, and a failed
/// publish is not retried. The error is returned so the caller can report it.
pub async fn send(transport: &dyn Transport, draft: &mut OutboundDraft) -> Result<(), PublishError> {
    let result = transport.publish(draft.clone()).await;
    draft.clear();
    match &result {
        Ok(()) => debug!(sender = ?draft.sender, "message published"),
        Err(e) => debug!(err = %e, "publish failed, draft discarded"),
    }
    result
}

#[cfg(test)]
#[path = "publish_tests.rs"]
mod tests;
