// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! pubsub-chat: terminal client for a long-poll publish/subscribe chat server.

pub mod config;
pub mod console;
pub mod error;
pub mod message;
pub mod poll;
pub mod publish;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

use std::future::Future;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::console::{Composer, TerminalSink};
use crate::poll::PollController;
use crate::transport::{HttpTransport, Transport};

/// Run a chat session until end of input, `/quit`, or Ctrl-C.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let endpoints = config.endpoints()?;
    info!(
        mode = %config.mode,
        poll = %endpoints.poll_url,
        publish = %endpoints.publish_url,
        "starting chat session"
    );

    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(
        endpoints,
        config.poll_timeout(),
        config.publish_timeout(),
    )?);

    let poll = PollController::new(Arc::clone(&transport), config.backoff());
    poll.start(TerminalSink::new(std::io::stdout()))?;

    let mut composer = Composer::new(transport, config.nick.clone(), poll.state());
    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();

    tokio::select! {
        result = composer.run(input, &mut out) => result?,
        () = interrupted(tokio::signal::ctrl_c()) => info!("interrupted"),
    }

    poll.stop();
    poll.stopped().await;
    info!("chat session ended");
    Ok(())
}

/// Resolve when `signal` fires. If the handler could not be installed, never
/// resolve, so the session keeps running until input ends.
async fn interrupted(signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(e) = signal.await {
        warn!(err = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
