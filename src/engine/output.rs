// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Inference output types for VisionAI CORE.

use serde::Serialize;

/// Result of one generation loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    /// Generated text output.
    pub text: String,
    /// Number of tokens appended to the response.
    pub tokens_generated: u32,
    /// Reason generation stopped.
    pub finish_reason: FinishReason,
}

/// Reason why text generation finished.
///
/// Every variant is a successful completion; the boundary returns only the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Model emitted an end-of-generation token.
    Stop,
    /// Hit the token ceiling.
    MaxTokens,
    /// Committing a generated token failed; the text is a partial response.
    DecodeFailed,
}

impl FinishReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::MaxTokens => "max_tokens",
            Self::DecodeFailed => "decode_failed",
        }
    }

    /// True when the response was cut short by a decode failure.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::DecodeFailed)
    }
}
