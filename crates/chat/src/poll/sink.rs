// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery sink: the consumer of messages produced by the poll loop.

use std::panic::AssertUnwindSafe;

use tokio::sync::mpsc;

use crate::error::FetchError;
use crate::message::Message;

// `contain` relies on unwinding to keep a panicking sink from taking the loop down.
#[cfg(not(panic = "unwind"))]
compile_error!("pubsub-chat must be built with panic = \"unwind\"");

/// Receives each fetched message, in fetch order.
///
/// Errors and panics raised here are logged by the poll loop and never stop
/// it.
pub trait DeliverySink: Send + 'static {
    fn deliver(&mut self, message: &Message) -> anyhow::Result<()>;

    /// Called on the first failure of a run of consecutive fetch failures.
    /// A long poll that merely timed out does not count.
    fn degraded(&mut self, _error: &FetchError) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called on the first successful fetch after [`DeliverySink::degraded`].
    fn recovered(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl DeliverySink for mpsc::UnboundedSender<Message> {
    fn deliver(&mut self, message: &Message) -> anyhow::Result<()> {
        self.send(message.clone()).map_err(|_| anyhow::anyhow!("message receiver dropped"))
    }
}

impl DeliverySink for Box<dyn DeliverySink> {
    fn deliver(&mut self, message: &Message) -> anyhow::Result<()> {
        (**self).deliver(message)
    }

    fn degraded(&mut self, error: &FetchError) -> anyhow::Result<()> {
        (**self).degraded(error)
    }

    fn recovered(&mut self) -> anyhow::Result<()> {
        (**self).recovered()
    }
}

/// Run a sink callback, logging instead of propagating errors and panics.
pub(crate) fn contain(what: &'static str, f: impl FnOnce() -> anyhow::Result<()>) {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(err = %e, "sink {what} failed"),
        Err(_) => tracing::error!("sink {what} panicked"),
    }
}
