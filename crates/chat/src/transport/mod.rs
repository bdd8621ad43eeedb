// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport adapter: the two server operations behind one interface.

pub mod http;

use std::future::Future;
use std::pin::Pin;

use reqwest::Url;

use crate::error::{FetchError, PublishError};
use crate::message::{Message, OutboundDraft};

pub use http::HttpTransport;

/// Boxed future returned by [`Transport`] methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Server operations used by the poll loop and the publish path.
///
/// Each call performs exactly one round-trip; retry policy belongs to the
/// caller. Object-safe for use as `Arc<dyn Transport>`.
pub trait Transport: Send + Sync + 'static {
    /// Long-poll for the next message. May block for as long as the server
    /// holds the request open.
    fn fetch_next_message(&self) -> TransportFuture<'_, Result<Message, FetchError>>;

    /// Submit a message for broadcast. Success only confirms receipt.
    fn publish(&self, draft: OutboundDraft) -> TransportFuture<'_, Result<(), PublishError>>;
}

/// Resolved server URLs, fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub poll_url: Url,
    pub publish_url: Url,
}
