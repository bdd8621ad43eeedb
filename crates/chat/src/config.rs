// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use clap::Parser;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::transport::Endpoints;

/// Where the long-poll endpoint lives relative to the server URL.
///
/// - `Standard`: `/sub` on the server URL itself.
/// - `Proxied`: the front-end proxy cannot hold connections open, so long
///   polls go straight to the app on a dedicated port.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployMode {
    #[default]
    Standard,
    Proxied,
}

impl std::fmt::Display for DeployMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::Proxied => f.write_str("proxied"),
        }
    }
}

impl std::str::FromStr for DeployMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "proxied" => Ok(Self::Proxied),
            other => anyhow::bail!("invalid deployment mode: {other}"),
        }
    }
}

/// Terminal client for a long-poll publish/subscribe chat server.
#[derive(Debug, Parser)]
#[command(name = "pubsub-chat", version, about)]
pub struct Config {
    /// Base URL of the chat server.
    #[arg(long, env = "PUBSUB_SERVER", default_value = "http://127.0.0.1:8080")]
    pub server: String,

    /// Deployment mode (standard, proxied).
    #[arg(long, env = "PUBSUB_MODE", default_value = "standard")]
    pub mode: DeployMode,

    /// Long-poll port used in proxied mode.
    #[arg(long, env = "PUBSUB_PROXIED_POLL_PORT", default_value_t = 8000)]
    pub proxied_poll_port: u16,

    /// Name shown next to messages you send.
    #[arg(long, env = "PUBSUB_NICK")]
    pub nick: Option<String>,

    /// Delay before retrying a failed poll, in milliseconds.
    #[arg(long, env = "PUBSUB_BACKOFF_MS", default_value_t = 1000)]
    pub backoff_ms: u64,

    /// Client-side timeout for one long poll, in seconds.
    #[arg(long, env = "PUBSUB_POLL_TIMEOUT_SECS", default_value_t = 120)]
    pub poll_timeout_secs: u64,

    /// Timeout for one publish, in seconds.
    #[arg(long, env = "PUBSUB_PUBLISH_TIMEOUT_SECS", default_value_t = 10)]
    pub publish_timeout_secs: u64,

    /// Log filter (tracing `EnvFilter` syntax).
    #[arg(long, env = "PUBSUB_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Log format (text, json).
    #[arg(long, env = "PUBSUB_LOG_FORMAT", default_value = "text")]
    pub log_format: String,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.endpoints()?;
        if self.backoff_ms == 0 {
            anyhow::bail!("--backoff-ms must be greater than zero");
        }
        if self.poll_timeout_secs == 0 {
            anyhow::bail!("--poll-timeout-secs must be greater than zero");
        }
        if self.publish_timeout_secs == 0 {
            anyhow::bail!("--publish-timeout-secs must be greater than zero");
        }
        match self.log_format.as_str() {
            "text" | "json" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }
        Ok(())
    }

    /// Resolve the poll and publish URLs for the configured deployment mode.
    pub fn endpoints(&self) -> anyhow::Result<Endpoints> {
        let server: Url = self.server.parse()?;
        if !matches!(server.scheme(), "http" | "https") {
            anyhow::bail!("server URL must be http or https: {server}");
        }

        let mut poll_url = with_path(&server, "sub");
        if self.mode == DeployMode::Proxied {
            poll_url
                .set_port(Some(self.proxied_poll_port))
                .map_err(|()| anyhow::anyhow!("cannot set a port on {server}"))?;
        }
        let publish_url = with_path(&server, "pub");

        Ok(Endpoints { poll_url, publish_url })
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.publish_timeout_secs)
    }
}

/// Append `segment` to the server's path, dropping any query or fragment.
fn with_path(server: &Url, segment: &str) -> Url {
    let mut url = server.clone();
    url.set_path(&format!("{}/{segment}", server.path().trim_end_matches('/')));
    url.set_query(None);
    url.set_fragment(None);
    url
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
