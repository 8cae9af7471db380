// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Multimodal tokenization: prompt text plus frames into a chunk sequence.

use tracing::{debug, error};

use super::backend::VisionBackend;
use super::error::InferenceError;
use super::input::{Frame, TokenizeText};
use super::prompt::{self, CallKind, Conversation, SYSTEM_PROMPT};
use super::resources::ResourceSet;

/// Turn a prompt and its frames into model-consumable chunks.
///
/// Bitmaps live only for the tokenize call and are released before this
/// function returns, whatever the outcome. On failure no chunk sequence
/// escapes.
pub fn tokenize<B: VisionBackend>(
    backend: &B,
    resources: &ResourceSet<B>,
    prompt_text: &str,
    frames: &[Frame<'_>],
) -> Result<B::Chunks, InferenceError> {
    validate_frames(frames)?;
    let kind = CallKind::for_frames(frames.len());
    let text = format_prompt(backend, resources.model()?, kind, prompt_text);
    tokenize_formatted(backend, resources, &text, frames)
}

/// Reject an empty frame list or any frame whose buffer does not match its
/// dimensions.
pub fn validate_frames(frames: &[Frame<'_>]) -> Result<(), InferenceError> {
    if frames.is_empty() {
        return Err(InferenceError::InvalidFrame { index: 0, reason: "no frames supplied".into() });
    }
    for (i, frame) in frames.iter().enumerate() {
        frame.validate(i)?;
    }
    Ok(())
}

/// Build the conversation for `kind` and render it with the model's template.
pub fn format_prompt<B: VisionBackend>(
    backend: &B,
    model: &B::Model,
    kind: CallKind,
    prompt_text: &str,
) -> TokenizeText {
    let marker = backend.media_marker();
    let content = prompt::user_content(kind, &marker, prompt_text);
    let conversation = Conversation::new(SYSTEM_PROMPT, content);
    TokenizeText::templated(prompt::render(backend, model, &conversation))
}

/// Tokenize already formatted text against `frames`. Frames are assumed
/// validated.
pub fn tokenize_formatted<B: VisionBackend>(
    backend: &B,
    resources: &ResourceSet<B>,
    text: &TokenizeText,
    frames: &[Frame<'_>],
) -> Result<B::Chunks, InferenceError> {
    let projector = resources.projector()?;
    let bitmaps = build_bitmaps(backend, frames)?;

    let refs: Vec<&B::Bitmap> = bitmaps.iter().collect();
    let result = backend.tokenize(projector, text, &refs);
    drop(refs);
    drop(bitmaps);

    match result {
        Ok(chunks) => {
            debug!(frames = frames.len(), tokens = backend.chunk_tokens(&chunks), "tokenized input");
            Ok(chunks)
        }
        Err(e) => {
            error!(error = %e, "Failed to tokenize");
            Err(InferenceError::Tokenization(e))
        }
    }
}

/// One bitmap per frame. A failure part-way drops the bitmaps built so far.
fn build_bitmaps<B: VisionBackend>(
    backend: &B,
    frames: &[Frame<'_>],
) -> Result<Vec<B::Bitmap>, InferenceError> {
    let mut bitmaps = Vec::with_capacity(frames.len());
    for (i, frame) in frames.iter().enumerate() {
        let bitmap = backend.create_bitmap(frame).map_err(|e| InferenceError::InvalidFrame {
            index: i,
            reason: e.to_string(),
        })?;
        debug!(frame = i, width = frame.width, height = frame.height, "bitmap created");
        bitmaps.push(bitmap);
    }
    Ok(bitmaps)
}
