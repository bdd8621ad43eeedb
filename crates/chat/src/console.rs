// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal front end: renders received messages and turns input lines into
//! publishes.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;
use tracing::warn;

use crate::error::FetchError;
use crate::message::{Message, OutboundDraft};
use crate::poll::{DeliverySink, PollState};
use crate::publish;
use crate::transport::Transport;

/// Label shown for messages without a sender.
pub const UNKNOWN_SENDER: &str = "<unknown>";

/// Format a message as a single chat line.
pub fn render(message: &Message) -> String {
    format!("{}: {}", message.sender().unwrap_or(UNKNOWN_SENDER), message.body())
}

/// Delivery sink that writes one line per message.
pub struct TerminalSink<W> {
    out: W,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) -> anyhow::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write + Send + 'static> DeliverySink for TerminalSink<W> {
    fn deliver(&mut self, message: &Message) -> anyhow::Result<()> {
        self.line(&render(message))
    }

    fn degraded(&mut self, error: &FetchError) -> anyhow::Result<()> {
        self.line(&format!("*** connection lost ({error}), retrying"))
    }

    fn recovered(&mut self) -> anyhow::Result<()> {
        self.line("*** reconnected")
    }
}

/// One line of user input.
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Send(&'a str),
    /// `/nick <name>`; `/nick` alone clears the name.
    Nick(Option<&'a str>),
    Status,
    Quit,
    Unknown(&'a str),
    Empty,
}

pub fn parse_line(line: &str) -> Command<'_> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Command::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Send(line);
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match name {
        "nick" => Command::Nick(Some(arg).filter(|a| !a.is_empty())),
        "status" => Command::Status,
        "quit" => Command::Quit,
        _ => Command::Unknown(name),
    }
}

/// Stages input lines into a draft and publishes them.
pub struct Composer {
    transport: Arc<dyn Transport>,
    draft: OutboundDraft,
    state: watch::Receiver<PollState>,
}

impl Composer {
    pub fn new(
        transport: Arc<dyn Transport>,
        nick: Option<String>,
        state: watch::Receiver<PollState>,
    ) -> Self {
        Self { transport, draft: OutboundDraft::new(nick, ""), state }
    }

    pub fn nick(&self) -> Option<&str> {
        self.draft.sender.as_deref()
    }

    /// Read lines until end of input or `/quit`.
    pub async fn run<R, W>(&mut self, mut input: R, out: &mut W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut raw = Vec::new();
        loop {
            raw.clear();
            if input.read_until(b'\n', &mut raw).await? == 0 {
                break;
            }
            // Stray non-UTF-8 bytes are replaced, not fatal.
            let line = String::from_utf8_lossy(&raw);
            match parse_line(&line) {
                Command::Empty => {}
                Command::Send(text) => {
                    self.draft.body = text.to_owned();
                    if let Err(e) = publish::send(&*self.transport, &mut self.draft).await {
                        warn!(err = %e, "message not sent");
                    }
                }
                Command::Nick(name) => {
                    self.draft.sender = name.map(str::to_owned);
                    writeln!(out, "*** you are now {}", self.nick().unwrap_or(UNKNOWN_SENDER))?;
                }
                Command::Status => {
                    let state = self.state.borrow().clone();
                    writeln!(out, "*** {state}")?;
                }
                Command::Quit => break,
                Command::Unknown(name) => {
                    writeln!(out, "*** unknown command: /{name}")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "console_tests.rs"]
mod tests;
