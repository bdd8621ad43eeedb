// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake chat server for integration tests.
//!
//! `GET /sub` answers with the next scripted [`Reply`], holding the request
//! open until one is queued. `POST /pub` records the form fields and, in
//! loopback mode, queues them as the next `/sub` reply like the real
//! broadcast server does.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};

use pubsub_chat::transport::{Endpoints, HttpTransport};

/// One scripted answer to `GET /sub`.
pub enum Reply {
    Json(serde_json::Value),
    Status(StatusCode),
    Raw(&'static str),
    /// Never answer.
    Hold,
}

struct Shared {
    replies_tx: mpsc::UnboundedSender<Reply>,
    replies_rx: Mutex<mpsc::UnboundedReceiver<Reply>>,
    published_tx: mpsc::UnboundedSender<HashMap<String, String>>,
    publish_status: StatusCode,
    loopback: bool,
}

/// A running fake server.
pub struct FakeServer {
    pub addr: SocketAddr,
    shared: Arc<Shared>,
    published_rx: Mutex<mpsc::UnboundedReceiver<HashMap<String, String>>>,
}

/// Builder for configuring a [`FakeServer`].
pub struct FakeServerBuilder {
    publish_status: StatusCode,
    loopback: bool,
}

impl Default for FakeServerBuilder {
    fn default() -> Self {
        Self { publish_status: StatusCode::OK, loopback: false }
    }
}

impl FakeServerBuilder {
    pub fn publish_status(mut self, status: StatusCode) -> Self {
        self.publish_status = status;
        self
    }

    pub fn loopback(mut self) -> Self {
        self.loopback = true;
        self
    }

    pub async fn start(self) -> anyhow::Result<FakeServer> {
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();
        let (published_tx, published_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            replies_tx,
            replies_rx: Mutex::new(replies_rx),
            published_tx,
            publish_status: self.publish_status,
            loopback: self.loopback,
        });

        let router = Router::new()
            .route("/sub", get(sub))
            .route("/pub", post(publish))
            .with_state(Arc::clone(&shared));
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Ok(FakeServer { addr, shared, published_rx: Mutex::new(published_rx) })
    }
}

impl FakeServer {
    pub async fn start() -> anyhow::Result<Self> {
        FakeServerBuilder::default().start().await
    }

    pub fn builder() -> FakeServerBuilder {
        FakeServerBuilder::default()
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn endpoints(&self) -> anyhow::Result<Endpoints> {
        Ok(Endpoints {
            poll_url: format!("{}/sub", self.base_url()).parse()?,
            publish_url: format!("{}/pub", self.base_url()).parse()?,
        })
    }

    pub fn transport(&self) -> anyhow::Result<HttpTransport> {
        HttpTransport::new(self.endpoints()?, Duration::from_secs(10), Duration::from_secs(10))
    }

    pub fn reply(&self, reply: Reply) {
        let _ = self.shared.replies_tx.send(reply);
    }

    pub fn message(&self, nick: Option<&str>, message: &str) {
        self.reply(Reply::Json(serde_json::json!({ "nick": nick, "message": message })));
    }

    /// Wait for the next recorded `POST /pub` form.
    pub async fn next_published(&self) -> anyhow::Result<HashMap<String, String>> {
        let mut rx = self.published_rx.lock().await;
        tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await?
            .ok_or_else(|| anyhow::anyhow!("server stopped"))
    }
}

async fn sub(State(shared): State<Arc<Shared>>) -> Response {
    let reply = shared.replies_rx.lock().await.recv().await;
    match reply {
        Some(Reply::Json(value)) => Json(value).into_response(),
        Some(Reply::Status(status)) => status.into_response(),
        Some(Reply::Raw(body)) => body.into_response(),
        Some(Reply::Hold) | None => std::future::pending().await,
    }
}

async fn publish(
    State(shared): State<Arc<Shared>>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let _ = shared.published_tx.send(fields.clone());
    if shared.loopback && shared.publish_status.is_success() {
        let _ = shared.replies_tx.send(Reply::Json(serde_json::json!({
            "nick": fields.get("nick"),
            "message": fields.get("message"),
        })));
    }
    (shared.publish_status, Json(serde_json::json!({ "status": "sent" }))).into_response()
}
