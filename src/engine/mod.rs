// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Inference engine module for VisionAI CORE.
//!
//! Owns the per-session native handles and runs the call pipeline: prompt
//! formatting, multimodal tokenization, evaluation, and token generation.
//! Native work goes through the `VisionBackend` trait.

pub mod backend;
pub mod config;
pub mod decode;
pub mod error;
pub mod frames;
pub mod input;
pub mod multimodal;
pub mod output;
pub mod prefill;
pub mod prompt;
pub mod resources;
pub mod session;
pub mod streaming;

#[cfg(feature = "gguf")]
pub mod gguf;

pub use backend::VisionBackend;
pub use config::{
    ContextParams, EvalParams, GenerationConfig, ModelParams, ProjectorParams, SamplerConfig,
    SessionConfig, MAX_PIECE_BYTES, MAX_TOKENS,
};
pub use error::{BackendError, InferenceError};
pub use frames::{FrameError, PreparedFrame, FRAME_MAX_DIM};
pub use input::{ChatMessage, ChatRole, Frame, TokenizeText};
pub use output::{FinishReason, GenerationResult};
pub use prefill::DecodeCursor;
pub use prompt::{CallKind, DEFAULT_IMAGE_PROMPT, DEFAULT_VIDEO_PROMPT, SYSTEM_PROMPT};
pub use resources::ResourceSet;
pub use session::{CallStage, VisionSession};
pub use streaming::{ChannelSink, StreamEvent, TokenSink, TokenStream};

#[cfg(feature = "gguf")]
pub use gguf::{GgufSession, LlamaCppBackend};
