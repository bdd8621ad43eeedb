// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: a scripted transport and recording sinks.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::error::{FetchError, PublishError};
use crate::message::{Message, OutboundDraft};
use crate::poll::DeliverySink;
use crate::transport::{Transport, TransportFuture};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bound a test wait so a broken loop fails instead of hanging. Under paused
/// time this fires as soon as nothing else can make progress.
pub async fn within<F: Future>(f: F) -> anyhow::Result<F::Output> {
    Ok(tokio::time::timeout(Duration::from_secs(60), f).await?)
}

/// Transport that replays a fixed script of fetch results.
///
/// Once the script is exhausted, further fetches never resolve, like a
/// long poll on a quiet server.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<Message, FetchError>>>,
    fetch_times: Mutex<Vec<Instant>>,
    fetches_tx: watch::Sender<usize>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    publish_results: Mutex<VecDeque<Result<(), PublishError>>>,
    published: Mutex<Vec<OutboundDraft>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<Message, FetchError>>) -> Self {
        let (fetches_tx, _) = watch::channel(0);
        Self {
            script: Mutex::new(script.into()),
            fetch_times: Mutex::new(Vec::new()),
            fetches_tx,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            publish_results: Mutex::new(VecDeque::new()),
            published: Mutex::new(Vec::new()),
        }
    }

    /// Queue results for upcoming publishes. Unscripted publishes succeed.
    pub fn with_publish_results(self, results: Vec<Result<(), PublishError>>) -> Self {
        *lock(&self.publish_results) = results.into();
        self
    }

    pub fn fetch_count(&self) -> usize {
        *self.fetches_tx.borrow()
    }

    /// Instants at which each fetch was issued.
    pub fn fetch_times(&self) -> Vec<Instant> {
        lock(&self.fetch_times).clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn published(&self) -> Vec<OutboundDraft> {
        lock(&self.published).clone()
    }

    /// Wait until at least `n` fetches have been issued.
    pub async fn wait_for_fetches(&self, n: usize) -> anyhow::Result<()> {
        let mut rx = self.fetches_tx.subscribe();
        within(rx.wait_for(|count| *count >= n)).await??;
        Ok(())
    }
}

impl Transport for ScriptedTransport {
    fn fetch_next_message(&self) -> TransportFuture<'_, Result<Message, FetchError>> {
        Box::pin(async move {
            lock(&self.fetch_times).push(Instant::now());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.fetches_tx.send_modify(|count| *count += 1);

            let next = lock(&self.script).pop_front();
            let Some(result) = next else {
                return std::future::pending::<Result<Message, FetchError>>().await;
            };
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        })
    }

    fn publish(&self, draft: OutboundDraft) -> TransportFuture<'_, Result<(), PublishError>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            lock(&self.published).push(draft);
            lock(&self.publish_results).pop_front().unwrap_or(Ok(()))
        })
    }
}

/// Everything a sink observed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Delivered(Message),
    Degraded(&'static str),
    Recovered,
}

/// Sink that forwards every callback to a channel.
pub struct RecordingSink {
    tx: mpsc::UnboundedSender<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SinkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn record(&self, event: SinkEvent) -> anyhow::Result<()> {
        self.tx.send(event).map_err(|_| anyhow::anyhow!("recorder dropped"))
    }
}

impl DeliverySink for RecordingSink {
    fn deliver(&mut self, message: &Message) -> anyhow::Result<()> {
        self.record(SinkEvent::Delivered(message.clone()))
    }

    fn degraded(&mut self, error: &FetchError) -> anyhow::Result<()> {
        self.record(SinkEvent::Degraded(error.as_str()))
    }

    fn recovered(&mut self) -> anyhow::Result<()> {
        self.record(SinkEvent::Recovered)
    }
}

pub fn msg(sender: &str, body: &str) -> Message {
    Message::new(Some(sender.to_owned()), body)
}
