// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Seam between the session orchestrator and its native collaborators.
//!
//! Every handle type releases its native resource on `Drop`. The orchestrator
//! never frees anything explicitly; it only controls when handles go out of
//! scope. Implementations: `gguf::LlamaCppBackend` (llama-cpp-2 + mtmd) and
//! the tracking fake used by the test suite.

use std::path::Path;

use super::config::{ContextParams, EvalParams, ModelParams, ProjectorParams, SamplerConfig};
use super::error::BackendError;
use super::input::{ChatMessage, Frame, TokenizeText};

/// Model runtime plus multimodal preprocessing, as consumed by a session.
pub trait VisionBackend {
    /// Loaded model weights.
    type Model;
    /// Inference context bound to a model (running memory state).
    type Context;
    /// Stateful sampler chain.
    type Sampler;
    /// Multimodal projector context bound to a model.
    type Projector;
    /// Native bitmap built from one frame.
    type Bitmap;
    /// Tokenized chunk sequence (text runs and image-feature runs).
    type Chunks;
    /// Vocabulary token id.
    type Token: Copy + std::fmt::Debug;

    // ---- acquisition ----

    fn load_model(&self, path: &Path, params: &ModelParams) -> Result<Self::Model, BackendError>;

    fn create_context(
        &self,
        model: &Self::Model,
        params: &ContextParams,
    ) -> Result<Self::Context, BackendError>;

    fn load_projector(
        &self,
        model: &Self::Model,
        path: &Path,
        params: &ProjectorParams,
    ) -> Result<Self::Projector, BackendError>;

    fn build_sampler(&self, config: &SamplerConfig) -> Result<Self::Sampler, BackendError>;

    /// Whether the projector can encode images (logged at load).
    fn supports_vision(&self, projector: &Self::Projector) -> bool;

    // ---- prompt formatting ----

    /// Whether the model ships a chat template.
    fn has_chat_template(&self, model: &Self::Model) -> bool;

    /// Render messages through the model's chat template, appending the
    /// assistant-turn prefix when `add_assistant` is set.
    fn apply_chat_template(
        &self,
        model: &Self::Model,
        messages: &[ChatMessage],
        add_assistant: bool,
    ) -> Result<String, BackendError>;

    // ---- multimodal tokenization ----

    /// Placeholder text standing in for one image in the prompt.
    fn media_marker(&self) -> String;

    fn create_bitmap(&self, frame: &Frame<'_>) -> Result<Self::Bitmap, BackendError>;

    fn tokenize(
        &self,
        projector: &Self::Projector,
        text: &TokenizeText,
        bitmaps: &[&Self::Bitmap],
    ) -> Result<Self::Chunks, BackendError>;

    /// Total positions the chunk sequence will occupy (logged only).
    fn chunk_tokens(&self, chunks: &Self::Chunks) -> usize;

    // ---- evaluation ----

    /// Drop everything committed to the context's running memory.
    fn clear_memory(&self, context: &mut Self::Context);

    /// Evaluate a chunk sequence, returning the new position cursor.
    fn eval_chunks(
        &self,
        projector: &Self::Projector,
        context: &mut Self::Context,
        chunks: &Self::Chunks,
        params: &EvalParams,
    ) -> Result<i32, BackendError>;

    // ---- generation ----

    /// Draw the next token from the last computed logits.
    fn sample(&self, sampler: &mut Self::Sampler, context: &Self::Context) -> Self::Token;

    fn is_end_of_generation(&self, model: &Self::Model, token: Self::Token) -> bool;

    /// Raw text bytes for a token; fails when the piece exceeds `max_bytes`.
    fn token_to_piece(
        &self,
        model: &Self::Model,
        token: Self::Token,
        max_bytes: usize,
    ) -> Result<Vec<u8>, BackendError>;

    /// Commit a single token at `position` and compute its logits.
    fn decode_token(
        &self,
        context: &mut Self::Context,
        token: Self::Token,
        position: i32,
    ) -> Result<(), BackendError>;
}
