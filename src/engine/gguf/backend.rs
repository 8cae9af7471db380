// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! llama-cpp-2 backend for GGUF vision-language models.
//!
//! Model loading, context creation, mtmd projector, tokenization and token
//! generation via the llama-cpp-2 Rust bindings.

use std::num::NonZeroU32;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use llama_cpp_2::context::params::LlamaContextParams;
use llama_cpp_2::context::LlamaContext;
use llama_cpp_2::llama_backend::LlamaBackend;
use llama_cpp_2::llama_batch::LlamaBatch;
use llama_cpp_2::model::params::LlamaModelParams;
use llama_cpp_2::model::{LlamaChatMessage, LlamaModel};
use llama_cpp_2::mtmd::{
    mtmd_default_marker, MtmdBitmap, MtmdContext, MtmdContextParams, MtmdInputChunks,
    MtmdInputText,
};
use llama_cpp_2::sampling::LlamaSampler;
use llama_cpp_2::token::LlamaToken;
use parking_lot::Mutex;
use tracing::debug;

use crate::engine::backend::VisionBackend;
use crate::engine::config::{
    resolve_threads, ContextParams, EvalParams, ModelParams, ProjectorParams, SamplerConfig,
};
use crate::engine::error::BackendError;
use crate::engine::input::{ChatMessage, Frame, TokenizeText};

static RUNTIME: OnceLock<LlamaBackend> = OnceLock::new();
static RUNTIME_INIT: Mutex<()> = Mutex::new(());

/// Process-wide llama.cpp backend. Initialized on first use; llama.cpp allows
/// only one initialization per process.
fn runtime() -> Result<&'static LlamaBackend, BackendError> {
    if let Some(backend) = RUNTIME.get() {
        return Ok(backend);
    }
    let _guard = RUNTIME_INIT.lock();
    if let Some(backend) = RUNTIME.get() {
        return Ok(backend);
    }
    let backend = LlamaBackend::init().map_err(|e| BackendError::new("backend_init", e.to_string()))?;
    Ok(RUNTIME.get_or_init(|| backend))
}

/// `llama_flash_attn_type` value: 0 = disabled, 1 = enabled.
fn flash_attention_policy(enabled: bool) -> i32 {
    if enabled {
        1
    } else {
        0
    }
}

/// Loaded GGUF weights. Shared with the context that borrows them.
pub struct GgufModel {
    inner: Arc<LlamaModel>,
}

/// Inference context bound to a `GgufModel`.
pub struct GgufContext {
    // SAFETY: `ctx` borrows the model behind `_model`. Field order drops
    // `ctx` first, and the Arc keeps the model alive until then.
    ctx: LlamaContext<'static>,
    _model: Arc<LlamaModel>,
    batch: LlamaBatch,
}

/// Sampler chain handle.
pub struct GgufSampler {
    inner: LlamaSampler,
}

/// mtmd projector context.
pub struct GgufProjector {
    inner: MtmdContext,
}

/// Native RGB bitmap for one frame.
pub struct GgufBitmap {
    inner: MtmdBitmap,
}

/// Tokenized text and image chunks.
pub struct GgufChunks {
    inner: MtmdInputChunks,
}

// SAFETY: every handle is owned by exactly one session, and a session is used
// by one thread at a time (callers serialize through `&mut` or a mutex).
unsafe impl Send for GgufModel {}
unsafe impl Send for GgufContext {}
unsafe impl Send for GgufSampler {}
unsafe impl Send for GgufProjector {}

/// `VisionBackend` over llama.cpp and its mtmd multimodal library.
#[derive(Debug, Default, Clone, Copy)]
pub struct LlamaCppBackend;

impl LlamaCppBackend {
    pub fn new() -> Self {
        Self
    }
}

impl VisionBackend for LlamaCppBackend {
    type Model = GgufModel;
    type Context = GgufContext;
    type Sampler = GgufSampler;
    type Projector = GgufProjector;
    type Bitmap = GgufBitmap;
    type Chunks = GgufChunks;
    type Token = LlamaToken;

    fn load_model(&self, path: &Path, params: &ModelParams) -> Result<GgufModel, BackendError> {
        let backend = runtime()?;
        let model_params = LlamaModelParams::default().with_n_gpu_layers(params.n_gpu_layers);
        let model = LlamaModel::load_from_file(backend, path, &model_params)
            .map_err(|e| BackendError::new("load_model", e.to_string()))?;
        Ok(GgufModel { inner: Arc::new(model) })
    }

    fn create_context(
        &self,
        model: &GgufModel,
        params: &ContextParams,
    ) -> Result<GgufContext, BackendError> {
        let backend = runtime()?;
        let n_threads = resolve_threads(params.n_threads);
        debug!(flash_attention = params.flash_attention, n_threads, "context params");
        let p = LlamaContextParams::default()
            .with_n_ctx(NonZeroU32::new(params.n_ctx))
            .with_n_batch(params.n_batch)
            .with_n_threads(n_threads)
            .with_n_threads_batch(n_threads)
            .with_flash_attention_policy(flash_attention_policy(params.flash_attention));

        let shared = Arc::clone(&model.inner);
        let ctx = shared
            .new_context(backend, p)
            .map_err(|e| BackendError::new("create_context", e.to_string()))?;
        // SAFETY: see `GgufContext`; the Arc stored alongside outlives `ctx`.
        let ctx = unsafe { std::mem::transmute::<LlamaContext<'_>, LlamaContext<'static>>(ctx) };
        Ok(GgufContext { ctx, _model: shared, batch: LlamaBatch::new(1, 1) })
    }

    fn load_projector(
        &self,
        model: &GgufModel,
        path: &Path,
        params: &ProjectorParams,
    ) -> Result<GgufProjector, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::new("load_projector", "path is not valid UTF-8"))?;
        let mtmd_params = MtmdContextParams {
            use_gpu: params.use_gpu,
            n_threads: resolve_threads(params.n_threads),
            ..MtmdContextParams::default()
        };
        let inner = MtmdContext::init_from_file(path_str, &model.inner, &mtmd_params)
            .map_err(|e| BackendError::new("load_projector", e.to_string()))?;
        Ok(GgufProjector { inner })
    }

    fn build_sampler(&self, config: &SamplerConfig) -> Result<GgufSampler, BackendError> {
        let chain = LlamaSampler::chain_simple([
            LlamaSampler::penalties(
                config.penalty_last_n,
                config.penalty_repeat,
                config.penalty_freq,
                config.penalty_present,
            ),
            LlamaSampler::min_p(config.min_p, config.min_keep),
            LlamaSampler::temp(config.temperature),
            LlamaSampler::dist(config.seed),
        ]);
        Ok(GgufSampler { inner: chain })
    }

    fn supports_vision(&self, projector: &GgufProjector) -> bool {
        projector.inner.support_vision()
    }

    fn has_chat_template(&self, model: &GgufModel) -> bool {
        model.inner.chat_template(None).is_ok()
    }

    fn apply_chat_template(
        &self,
        model: &GgufModel,
        messages: &[ChatMessage],
        add_assistant: bool,
    ) -> Result<String, BackendError> {
        let template = model
            .inner
            .chat_template(None)
            .map_err(|e| BackendError::new("chat_template", e.to_string()))?;
        let chat = messages
            .iter()
            .map(|m| LlamaChatMessage::new(m.role.as_str().to_string(), m.content.clone()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| BackendError::new("chat_template", e.to_string()))?;
        model
            .inner
            .apply_chat_template(&template, &chat, add_assistant)
            .map_err(|e| BackendError::new("apply_chat_template", e.to_string()))
    }

    fn media_marker(&self) -> String {
        mtmd_default_marker().to_string()
    }

    fn create_bitmap(&self, frame: &Frame<'_>) -> Result<GgufBitmap, BackendError> {
        let inner = MtmdBitmap::from_image_data(frame.width, frame.height, frame.rgb)
            .map_err(|e| BackendError::new("create_bitmap", e.to_string()))?;
        Ok(GgufBitmap { inner })
    }

    fn tokenize(
        &self,
        projector: &GgufProjector,
        text: &TokenizeText,
        bitmaps: &[&GgufBitmap],
    ) -> Result<GgufChunks, BackendError> {
        let input = MtmdInputText {
            text: text.text.clone(),
            add_special: text.add_special,
            parse_special: text.parse_special,
        };
        let refs: Vec<&MtmdBitmap> = bitmaps.iter().map(|b| &b.inner).collect();
        let inner = projector
            .inner
            .tokenize(input, &refs)
            .map_err(|e| BackendError::new("tokenize", e.to_string()))?;
        Ok(GgufChunks { inner })
    }

    fn chunk_tokens(&self, chunks: &GgufChunks) -> usize {
        chunks.inner.total_tokens()
    }

    fn clear_memory(&self, context: &mut GgufContext) {
        context.ctx.clear_kv_cache();
    }

    fn eval_chunks(
        &self,
        projector: &GgufProjector,
        context: &mut GgufContext,
        chunks: &GgufChunks,
        params: &EvalParams,
    ) -> Result<i32, BackendError> {
        chunks
            .inner
            .eval_chunks(
                &projector.inner,
                &mut context.ctx,
                params.n_past,
                0,
                params.n_batch,
                params.logits_last,
            )
            .map_err(|e| BackendError::new("eval_chunks", e.to_string()))
    }

    fn sample(&self, sampler: &mut GgufSampler, context: &GgufContext) -> LlamaToken {
        // -1 samples from the last position that produced logits.
        sampler.inner.sample(&context.ctx, -1)
    }

    fn is_end_of_generation(&self, model: &GgufModel, token: LlamaToken) -> bool {
        model.inner.is_eog_token(token)
    }

    fn token_to_piece(
        &self,
        model: &GgufModel,
        token: LlamaToken,
        max_bytes: usize,
    ) -> Result<Vec<u8>, BackendError> {
        model
            .inner
            .token_to_piece_bytes(token, max_bytes, true, None)
            .map_err(|e| BackendError::new("token_to_piece", e.to_string()))
    }

    fn decode_token(
        &self,
        context: &mut GgufContext,
        token: LlamaToken,
        position: i32,
    ) -> Result<(), BackendError> {
        context.batch.clear();
        context
            .batch
            .add(token, position, &[0], true)
            .map_err(|e| BackendError::new("batch", e.to_string()))?;
        context
            .ctx
            .decode(&mut context.batch)
            .map_err(|e| BackendError::new("decode", e.to_string()))
    }
}
