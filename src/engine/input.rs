// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Inference input types and validation for VisionAI CORE.
//!
//! Frames are validated before any native bitmap is built. Invalid frames are
//! rejected, not cropped or padded.

use super::error::InferenceError;

/// Bytes per pixel of a packed RGB frame.
pub const RGB_CHANNELS: usize = 3;

/// A borrowed RGB frame: `width * height * 3` bytes, row-major, no padding.
///
/// The caller keeps ownership; the frame is only read while bitmaps are built.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub rgb: &'a [u8],
    pub width: u32,
    pub height: u32,
}

impl<'a> Frame<'a> {
    pub fn new(rgb: &'a [u8], width: u32, height: u32) -> Self {
        Self { rgb, width, height }
    }

    /// Expected buffer length for the declared dimensions.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * RGB_CHANNELS
    }

    /// Check dimensions against the buffer. `index` is the frame's position
    /// in the call, reported back in the error.
    pub fn validate(&self, index: usize) -> Result<(), InferenceError> {
        if self.width == 0 || self.height == 0 {
            return Err(InferenceError::InvalidFrame {
                index,
                reason: format!("zero dimension {}x{}", self.width, self.height),
            });
        }
        if self.rgb.len() != self.expected_len() {
            return Err(InferenceError::InvalidFrame {
                index,
                reason: format!(
                    "buffer is {} bytes, expected {} for {}x{} RGB",
                    self.rgb.len(),
                    self.expected_len(),
                    self.width,
                    self.height
                ),
            });
        }
        Ok(())
    }
}

/// Typed chat roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

/// Text handed to the multimodal tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizeText {
    pub text: String,
    /// Let the tokenizer insert BOS and similar tokens.
    pub add_special: bool,
    /// Parse special-token markup inside `text`.
    pub parse_special: bool,
}

impl TokenizeText {
    /// Settings for text already rendered through a chat template, which
    /// injects BOS itself.
    pub fn templated(text: String) -> Self {
        Self { text, add_special: false, parse_special: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_frame_passes() {
        let buf = vec![0u8; 4 * 2 * 3];
        assert!(Frame::new(&buf, 4, 2).validate(0).is_ok());
    }

    #[test]
    fn zero_dimension_rejected() {
        let buf: Vec<u8> = Vec::new();
        let err = Frame::new(&buf, 0, 10).validate(3).unwrap_err();
        assert!(matches!(err, InferenceError::InvalidFrame { index: 3, .. }));
    }

    #[test]
    fn short_buffer_rejected() {
        let buf = vec![0u8; 10];
        let err = Frame::new(&buf, 4, 4).validate(1).unwrap_err();
        assert!(err.to_string().contains("expected 48"));
    }

    #[test]
    fn templated_text_disables_bos() {
        let t = TokenizeText::templated("hi".into());
        assert!(!t.add_special);
        assert!(t.parse_special);
    }

    #[test]
    fn role_strings() {
        assert_eq!(ChatRole::System.as_str(), "system");
        assert_eq!(ChatRole::User.as_str(), "user");
    }
}
