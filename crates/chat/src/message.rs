// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat message types shared by the poll loop, the publish path, and the
//! console front end.
//!
//! On the wire the server uses `nick` for the sender and `message` for the
//! body, both for `/sub` responses and `/pub` form fields.

use serde::{Deserialize, Serialize};

/// A message received from the server. Never mutated after decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireMessage")]
pub struct Message {
    #[serde(rename = "nick")]
    sender: Option<String>,
    #[serde(rename = "message")]
    body: String,
}

impl Message {
    /// Build a message. An empty sender is treated as absent.
    pub fn new(sender: Option<String>, body: impl Into<String>) -> Self {
        Self { sender: sender.filter(|s| !s.is_empty()), body: body.into() }
    }

    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Raw `/sub` payload. `message` is required; `nick` may be null or missing.
#[derive(Deserialize)]
struct WireMessage {
    #[serde(default)]
    nick: Option<String>,
    message: String,
}

impl From<WireMessage> for Message {
    fn from(wire: WireMessage) -> Self {
        Self::new(wire.nick, wire.message)
    }
}

/// Content staged for publishing, owned by whoever calls
/// [`crate::publish::send`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutboundDraft {
    #[serde(rename = "nick", skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(rename = "message")]
    pub body: String,
}

impl OutboundDraft {
    pub fn new(sender: Option<String>, body: impl Into<String>) -> Self {
        Self { sender: sender.filter(|s| !s.is_empty()), body: body.into() }
    }

    /// Reset the staged body. The sender is kept for the next message.
    pub fn clear(&mut self) {
        self.body.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
