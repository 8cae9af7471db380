// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tracking fake backend shared by the integration tests.
//!
//! Every acquisition, release and pipeline call is appended to a ledger so
//! tests can assert ordering. Failures can be injected at any stage, and the
//! sampled token stream is scripted.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use visionai_core::engine::{
    BackendError, ChatMessage, ContextParams, EvalParams, Frame, ModelParams, ProjectorParams,
    SamplerConfig, SessionConfig, TokenSink, TokenizeText, VisionBackend, VisionSession,
};

pub const MARKER: &str = "<__media__>";
/// End-of-generation token id.
pub const EOG: u32 = u32::MAX;
/// Token sampled once the script runs out; its piece is "x".
pub const FILLER: u32 = 0;

/// Stage at which the fake reports failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    LoadModel,
    CreateContext,
    LoadProjector,
    BuildSampler,
    Bitmap,
    Tokenize,
    Eval,
    ChatTemplate,
}

/// Scripted behavior for one fake backend.
#[derive(Debug, Clone)]
pub struct Script {
    pub fail_at: Option<FailAt>,
    /// Tokens returned by successive `sample` calls within one call.
    pub tokens: Vec<u32>,
    /// Piece bytes per token id; index 0 is the filler piece.
    pub vocab: Vec<Vec<u8>>,
    /// Zero-based index of the decode that fails within one call.
    pub decode_fail_at: Option<usize>,
    pub has_template: bool,
    /// Position returned by `eval_chunks`.
    pub n_past: i32,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            fail_at: None,
            tokens: Vec::new(),
            vocab: vec![b"x".to_vec()],
            decode_fail_at: None,
            has_template: true,
            n_past: 42,
        }
    }
}

impl Script {
    /// Script that emits `pieces` in order, then end-of-generation.
    pub fn emitting(pieces: &[&str]) -> Self {
        let mut script = Self::default();
        for p in pieces {
            script.vocab.push(p.as_bytes().to_vec());
            script.tokens.push((script.vocab.len() - 1) as u32);
        }
        script.tokens.push(EOG);
        script
    }

    pub fn failing_at(mut self, stage: FailAt) -> Self {
        self.fail_at = Some(stage);
        self
    }
}

/// State shared between the fake and the test.
#[derive(Debug, Default)]
pub struct FakeState {
    pub events: Mutex<Vec<String>>,
    pub script: Mutex<Script>,
    pub last_text: Mutex<Option<TokenizeText>>,
    pub last_messages: Mutex<Vec<ChatMessage>>,
}

impl FakeState {
    pub fn log(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events.lock().iter().filter(|e| e.as_str() == event).count()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.events.lock().iter().position(|e| e == event)
    }

    pub fn clear_events(&self) {
        self.events.lock().clear();
    }

    pub fn set_script(&self, script: Script) {
        *self.script.lock() = script;
    }

    fn fails(&self, stage: FailAt) -> bool {
        self.script.lock().fail_at == Some(stage)
    }
}

/// A native handle that records its release.
#[derive(Debug)]
pub struct Handle {
    name: &'static str,
    state: Arc<FakeState>,
}

impl Handle {
    fn new(name: &'static str, state: &Arc<FakeState>) -> Self {
        Self { name, state: Arc::clone(state) }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.state.log(format!("free:{}", self.name));
    }
}

pub struct FakeContext {
    _handle: Handle,
    decodes: usize,
}

pub struct FakeSampler {
    _handle: Handle,
    next: usize,
}

pub struct FakeChunks {
    _handle: Handle,
    tokens: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    pub state: Arc<FakeState>,
}

impl FakeBackend {
    pub fn new(script: Script) -> Self {
        let state = Arc::new(FakeState::default());
        state.set_script(script);
        Self { state }
    }
}

fn err(op: &'static str) -> BackendError {
    BackendError::new(op, "injected failure")
}

impl VisionBackend for FakeBackend {
    type Model = Handle;
    type Context = FakeContext;
    type Sampler = FakeSampler;
    type Projector = Handle;
    type Bitmap = Handle;
    type Chunks = FakeChunks;
    type Token = u32;

    fn load_model(&self, _path: &Path, _params: &ModelParams) -> Result<Handle, BackendError> {
        self.state.log("load_model");
        if self.state.fails(FailAt::LoadModel) {
            return Err(err("load_model"));
        }
        Ok(Handle::new("model", &self.state))
    }

    fn create_context(&self, _model: &Handle, _params: &ContextParams) -> Result<FakeContext, BackendError> {
        self.state.log("create_context");
        if self.state.fails(FailAt::CreateContext) {
            return Err(err("create_context"));
        }
        Ok(FakeContext { _handle: Handle::new("context", &self.state), decodes: 0 })
    }

    fn load_projector(
        &self,
        _model: &Handle,
        _path: &Path,
        _params: &ProjectorParams,
    ) -> Result<Handle, BackendError> {
        self.state.log("load_projector");
        if self.state.fails(FailAt::LoadProjector) {
            return Err(err("load_projector"));
        }
        Ok(Handle::new("projector", &self.state))
    }

    fn build_sampler(&self, _config: &SamplerConfig) -> Result<FakeSampler, BackendError> {
        self.state.log("build_sampler");
        if self.state.fails(FailAt::BuildSampler) {
            return Err(err("build_sampler"));
        }
        Ok(FakeSampler { _handle: Handle::new("sampler", &self.state), next: 0 })
    }

    fn supports_vision(&self, _projector: &Handle) -> bool {
        true
    }

    fn has_chat_template(&self, _model: &Handle) -> bool {
        self.state.script.lock().has_template
    }

    fn apply_chat_template(
        &self,
        _model: &Handle,
        messages: &[ChatMessage],
        add_assistant: bool,
    ) -> Result<String, BackendError> {
        *self.state.last_messages.lock() = messages.to_vec();
        if self.state.fails(FailAt::ChatTemplate) {
            return Err(err("apply_chat_template"));
        }
        let mut out = String::new();
        for m in messages {
            out.push_str(&format!("<|{}|>{}<|end|>", m.role.as_str(), m.content));
        }
        if add_assistant {
            out.push_str("<|assistant|>");
        }
        Ok(out)
    }

    fn media_marker(&self) -> String {
        MARKER.to_string()
    }

    fn create_bitmap(&self, frame: &Frame<'_>) -> Result<Handle, BackendError> {
        self.state.log(format!("create_bitmap:{}x{}", frame.width, frame.height));
        if self.state.fails(FailAt::Bitmap) {
            return Err(err("create_bitmap"));
        }
        Ok(Handle::new("bitmap", &self.state))
    }

    fn tokenize(
        &self,
        _projector: &Handle,
        text: &TokenizeText,
        bitmaps: &[&Handle],
    ) -> Result<FakeChunks, BackendError> {
        self.state.log(format!("tokenize:{}", bitmaps.len()));
        *self.state.last_text.lock() = Some(text.clone());
        if self.state.fails(FailAt::Tokenize) {
            return Err(err("tokenize"));
        }
        Ok(FakeChunks { _handle: Handle::new("chunks", &self.state), tokens: text.text.len() })
    }

    fn chunk_tokens(&self, chunks: &FakeChunks) -> usize {
        chunks.tokens
    }

    fn clear_memory(&self, context: &mut FakeContext) {
        self.state.log("clear_memory");
        context.decodes = 0;
    }

    fn eval_chunks(
        &self,
        _projector: &Handle,
        _context: &mut FakeContext,
        _chunks: &FakeChunks,
        params: &EvalParams,
    ) -> Result<i32, BackendError> {
        self.state.log(format!("eval_chunks:{}:{}", params.n_batch, params.logits_last));
        if self.state.fails(FailAt::Eval) {
            return Err(err("eval_chunks"));
        }
        Ok(self.state.script.lock().n_past)
    }

    fn sample(&self, sampler: &mut FakeSampler, _context: &FakeContext) -> u32 {
        let script = self.state.script.lock();
        let token = script.tokens.get(sampler.next).copied().unwrap_or(FILLER);
        sampler.next += 1;
        token
    }

    fn is_end_of_generation(&self, _model: &Handle, token: u32) -> bool {
        token == EOG
    }

    fn token_to_piece(&self, _model: &Handle, token: u32, max_bytes: usize) -> Result<Vec<u8>, BackendError> {
        let script = self.state.script.lock();
        let piece = script
            .vocab
            .get(token as usize)
            .cloned()
            .ok_or_else(|| err("token_to_piece"))?;
        if piece.len() > max_bytes {
            return Err(BackendError::new("token_to_piece", "piece exceeds buffer"));
        }
        Ok(piece)
    }

    fn decode_token(&self, context: &mut FakeContext, token: u32, position: i32) -> Result<(), BackendError> {
        let index = context.decodes;
        context.decodes += 1;
        self.state.log(format!("decode:{token}@{position}"));
        if self.state.script.lock().decode_fail_at == Some(index) {
            return Err(err("decode"));
        }
        Ok(())
    }
}

/// Sink recording every notification.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub tokens: Vec<String>,
    pub completed: Vec<String>,
    pub errors: Vec<String>,
}

impl TokenSink for RecordingSink {
    fn on_token(&mut self, fragment: &str) {
        self.tokens.push(fragment.to_string());
    }

    fn on_complete(&mut self, full_text: &str) {
        self.completed.push(full_text.to_string());
    }

    fn on_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

/// Model and projector files that exist on disk.
pub struct ModelFiles {
    _dir: tempfile::TempDir,
    pub model: PathBuf,
    pub projector: PathBuf,
}

pub fn model_files() -> ModelFiles {
    let dir = tempfile::tempdir().unwrap();
    let model = dir.path().join("model.gguf");
    let projector = dir.path().join("mmproj.gguf");
    std::fs::write(&model, b"GGUF").unwrap();
    std::fs::write(&projector, b"GGUF").unwrap();
    ModelFiles { _dir: dir, model, projector }
}

/// A uniform RGB buffer for a `width x height` frame.
pub fn rgb(width: u32, height: u32) -> Vec<u8> {
    vec![128u8; width as usize * height as usize * 3]
}

/// Load a session over a fake running `script`. Returns the shared state too.
pub fn loaded_session(script: Script) -> (VisionSession<FakeBackend>, Arc<FakeState>, ModelFiles) {
    let backend = FakeBackend::new(script);
    let state = Arc::clone(&backend.state);
    let files = model_files();
    let session = VisionSession::load(backend, SessionConfig::default(), &files.model, &files.projector)
        .expect("session loads");
    (session, state, files)
}
