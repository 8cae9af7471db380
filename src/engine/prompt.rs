// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Chat prompt construction.
//!
//! A conversation is always one fixed system instruction plus one user
//! message. Marker placement in the user message depends on the call kind and
//! is part of the external contract.

use tracing::{debug, warn};

use super::backend::VisionBackend;
use super::input::{ChatMessage, ChatRole};

/// System instruction sent with every call.
pub const SYSTEM_PROMPT: &str =
    "You are an image understanding model capable of describing the salient features of any image.";

/// Default prompt for single-image calls.
pub const DEFAULT_IMAGE_PROMPT: &str = "Describe this image.";

/// Default prompt for multi-frame calls.
pub const DEFAULT_VIDEO_PROMPT: &str =
    "What is the main action or notable event happening in this segment? Describe it in one brief sentence.";

/// How many images a call carries, which fixes the marker layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// One frame: marker first, then the prompt.
    Image,
    /// Several frames: prompt first so the instruction carries more weight,
    /// then one marker per frame.
    Video { frames: usize },
}

impl CallKind {
    pub fn for_frames(n: usize) -> Self {
        if n == 1 {
            Self::Image
        } else {
            Self::Video { frames: n }
        }
    }

    pub fn frame_count(&self) -> usize {
        match self {
            Self::Image => 1,
            Self::Video { frames } => *frames,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video { .. } => "video",
        }
    }
}

/// Build the user message content for a call.
pub fn user_content(kind: CallKind, marker: &str, prompt: &str) -> String {
    match kind {
        CallKind::Image => format!("{marker}\n{prompt}"),
        CallKind::Video { frames } => {
            let mut content = String::with_capacity(prompt.len() + 1 + frames * (marker.len() + 1));
            content.push_str(prompt);
            content.push('\n');
            for _ in 0..frames {
                content.push_str(marker);
                content.push('\n');
            }
            content
        }
    }
}

/// The ephemeral two-message conversation of one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: [ChatMessage; 2],
}

impl Conversation {
    pub fn new(system: &str, user: String) -> Self {
        Self {
            messages: [
                ChatMessage::new(ChatRole::System, system),
                ChatMessage::new(ChatRole::User, user),
            ],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn user_content(&self) -> &str {
        &self.messages[1].content
    }
}

/// Render the conversation through the model's chat template.
///
/// Falls back to the raw user content when the model has no template or the
/// template cannot be applied; inference proceeds either way.
pub fn render<B: VisionBackend>(backend: &B, model: &B::Model, conversation: &Conversation) -> String {
    if !backend.has_chat_template(model) {
        warn!("model has no chat template, using raw prompt");
        return conversation.user_content().to_owned();
    }
    match backend.apply_chat_template(model, conversation.messages(), true) {
        Ok(formatted) => {
            debug!(chars = formatted.len(), "formatted prompt");
            formatted
        }
        Err(e) => {
            warn!(error = %e, "chat template failed, falling back to raw prompt");
            conversation.user_content().to_owned()
        }
    }
}
