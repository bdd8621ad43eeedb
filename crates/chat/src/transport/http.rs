// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP implementation of [`Transport`] on top of `reqwest`.

use std::sync::Once;
use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::error::{FetchError, PublishError};
use crate::message::{Message, OutboundDraft};
use crate::transport::{Endpoints, Transport, TransportFuture};

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider for reqwest/rustls.
/// Only the first call has effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// HTTP client for one chat server.
pub struct HttpTransport {
    endpoints: Endpoints,
    poll_timeout: Duration,
    publish_timeout: Duration,
    client: Client,
}

impl HttpTransport {
    pub fn new(
        endpoints: Endpoints,
        poll_timeout: Duration,
        publish_timeout: Duration,
    ) -> anyhow::Result<Self> {
        ensure_crypto();
        let client = Client::builder().build()?;
        Ok(Self { endpoints, poll_timeout, publish_timeout, client })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// GET the poll URL and decode one message.
    pub async fn fetch(&self) -> Result<Message, FetchError> {
        let resp = self
            .client
            .get(self.endpoints.poll_url.clone())
            .timeout(self.poll_timeout)
            .send()
            .await
            .map_err(fetch_error)?;

        let status = resp.status();
        if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
            return Err(FetchError::Timeout);
        }
        if !status.is_success() {
            return Err(FetchError::Unreachable(format!("poll returned status {status}")));
        }

        let bytes = resp.bytes().await.map_err(fetch_error)?;
        decode_message(&bytes)
    }

    /// POST the draft as form fields to the publish URL.
    pub async fn send_draft(&self, draft: &OutboundDraft) -> Result<(), PublishError> {
        let resp = self
            .client
            .post(self.endpoints.publish_url.clone())
            .timeout(self.publish_timeout)
            .form(draft)
            .send()
            .await
            .map_err(|e| PublishError::Unreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PublishError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}

impl Transport for HttpTransport {
    fn fetch_next_message(&self) -> TransportFuture<'_, Result<Message, FetchError>> {
        Box::pin(self.fetch())
    }

    fn publish(&self, draft: OutboundDraft) -> TransportFuture<'_, Result<(), PublishError>> {
        Box::pin(async move { self.send_draft(&draft).await })
    }
}

/// Decode a `/sub` response body.
pub fn decode_message(bytes: &[u8]) -> Result<Message, FetchError> {
    serde_json::from_slice(bytes).map_err(|e| FetchError::Malformed(e.to_string()))
}

fn fetch_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_decode() {
        FetchError::Malformed(e.to_string())
    } else {
        FetchError::Unreachable(e.to_string())
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
