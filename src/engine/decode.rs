// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Autoregressive generation loop.
//!
//! Blocking and streaming calls share this loop; streaming passes a sink that
//! receives each fragment before the token is committed.

use encoding_rs::CoderResult;
use tracing::warn;

use super::backend::VisionBackend;
use super::config::GenerationConfig;
use super::error::InferenceError;
use super::output::{FinishReason, GenerationResult};
use super::prefill::DecodeCursor;
use super::resources::ResourceSet;
use super::streaming::TokenSink;

/// Run the sample / append / decode loop for at most `config.max_tokens`
/// iterations.
///
/// Ends on an end-of-generation token, on the ceiling, or on a decode
/// failure. A decode failure keeps the text produced so far and is reported
/// only through `FinishReason::DecodeFailed`.
pub fn generate<B: VisionBackend>(
    backend: &B,
    resources: &mut ResourceSet<B>,
    mut cursor: DecodeCursor,
    config: &GenerationConfig,
    mut sink: Option<&mut dyn TokenSink>,
) -> Result<GenerationResult, InferenceError> {
    let (model, context, sampler) = resources.generation_parts()?;
    let mut text = TextAccumulator::new();
    let mut tokens_generated = 0u32;
    let mut finish_reason = FinishReason::MaxTokens;

    for i in 0..config.max_tokens {
        let token = backend.sample(sampler, context);
        if backend.is_end_of_generation(model, token) {
            finish_reason = FinishReason::Stop;
            break;
        }
        tokens_generated += 1;

        // Oversized pieces contribute nothing, matching a failed
        // token-to-piece conversion in the runtime.
        let piece = backend
            .token_to_piece(model, token, config.max_piece_bytes)
            .unwrap_or_default();
        let fragment = text.push(&piece);
        if let Some(sink) = sink.as_deref_mut() {
            if !fragment.is_empty() {
                sink.on_token(&fragment);
            }
        }

        if let Err(e) = backend.decode_token(context, token, cursor.position()) {
            warn!(iteration = i, position = cursor.position(), error = %e, "Failed to decode token");
            finish_reason = FinishReason::DecodeFailed;
            break;
        }
        cursor.advance();
    }

    let tail = text.finish();
    if let Some(sink) = sink {
        if !tail.is_empty() {
            sink.on_token(&tail);
        }
    }

    Ok(GenerationResult { text: text.into_string(), tokens_generated, finish_reason })
}

/// Incremental UTF-8 assembly of token pieces.
///
/// A multi-byte character may be split across tokens; its bytes are held back
/// until the character is complete, so every emitted fragment is valid text.
struct TextAccumulator {
    decoder: encoding_rs::Decoder,
    text: String,
}

impl TextAccumulator {
    fn new() -> Self {
        Self { decoder: encoding_rs::UTF_8.new_decoder_without_bom_handling(), text: String::new() }
    }

    /// Append `bytes`; returns the newly completed text.
    fn push(&mut self, bytes: &[u8]) -> String {
        self.decode(bytes, false)
    }

    /// Flush held-back bytes (invalid remainders become U+FFFD).
    fn finish(&mut self) -> String {
        self.decode(&[], true)
    }

    fn decode(&mut self, bytes: &[u8], last: bool) -> String {
        let mut out = String::with_capacity(
            self.decoder
                .max_utf8_buffer_length(bytes.len())
                .unwrap_or(bytes.len() * 3 + 4),
        );
        let (result, _, _) = self.decoder.decode_to_string(bytes, &mut out, last);
        // Capacity comes from `max_utf8_buffer_length`, so all input is consumed.
        debug_assert!(matches!(result, CoderResult::InputEmpty));
        self.text.push_str(&out);
        out
    }

    fn into_string(self) -> String {
        self.text
    }
}
