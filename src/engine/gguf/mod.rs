// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! GGUF vision-language backend built on llama.cpp and mtmd.

mod backend;

pub use backend::{
    GgufBitmap, GgufChunks, GgufContext, GgufModel, GgufProjector, GgufSampler, LlamaCppBackend,
};

use super::session::VisionSession;

/// Session over the llama.cpp backend.
pub type GgufSession = VisionSession<LlamaCppBackend>;
