// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Token streaming output for incremental responses.
//!
//! The generation loop calls a `TokenSink` synchronously, on the thread that
//! runs the inference call. `ChannelSink` bridges those calls to an async
//! consumer through a bounded tokio channel.

use tokio::sync::mpsc;

/// Receiver of streamed output. Exactly one of `on_complete` or `on_error`
/// is called per streaming call, after all `on_token` calls.
pub trait TokenSink {
    /// One text fragment, in generation order.
    fn on_token(&mut self, fragment: &str);
    /// The full response; equals the concatenation of all fragments.
    fn on_complete(&mut self, full_text: &str);
    /// A stage before generation failed; no tokens were produced.
    fn on_error(&mut self, message: &str);
}

/// A streamed notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Token(String),
    Complete(String),
    Error(String),
}

impl StreamEvent {
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Token(_))
    }
}

/// Async stream of generation events.
pub struct TokenStream {
    receiver: mpsc::Receiver<StreamEvent>,
}

impl TokenStream {
    /// Create a new token stream with sink/receiver pair.
    pub fn new(buffer_size: usize) -> (ChannelSink, Self) {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        (ChannelSink { sender, closed: false }, Self { receiver })
    }

    /// Receive the next event, if available.
    pub async fn next(&mut self) -> Option<StreamEvent> {
        self.receiver.recv().await
    }

    /// Drain the stream. Returns the completion payload, or the error message.
    pub async fn collect_text(mut self) -> Result<String, String> {
        let mut partial = String::new();
        while let Some(event) = self.next().await {
            match event {
                StreamEvent::Token(t) => partial.push_str(&t),
                StreamEvent::Complete(full) => return Ok(full),
                StreamEvent::Error(e) => return Err(e),
            }
        }
        // Producer dropped without a final event.
        Ok(partial)
    }
}

/// Sink half that forwards events into a `TokenStream`.
///
/// Sends block when the buffer is full, so it must be driven from a plain
/// thread (e.g. `tokio::task::spawn_blocking`), never from async code.
pub struct ChannelSink {
    sender: mpsc::Sender<StreamEvent>,
    closed: bool,
}

impl ChannelSink {
    fn send(&mut self, event: StreamEvent) {
        if self.closed {
            return;
        }
        if self.sender.blocking_send(event).is_err() {
            // Consumer went away; generation still runs to completion.
            self.closed = true;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl TokenSink for ChannelSink {
    fn on_token(&mut self, fragment: &str) {
        self.send(StreamEvent::Token(fragment.to_owned()));
    }

    fn on_complete(&mut self, full_text: &str) {
        self.send(StreamEvent::Complete(full_text.to_owned()));
    }

    fn on_error(&mut self, message: &str) {
        self.send(StreamEvent::Error(message.to_owned()));
    }
}
