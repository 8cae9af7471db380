// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Inference session: load once, run many calls, release once.
//!
//! Each call walks `Idle → Formatting → Tokenizing → Evaluating → Generating`
//! and ends `Completed` or `Failed`. Calls take `&mut self`; one call runs at
//! a time per session.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::backend::VisionBackend;
use super::config::SessionConfig;
use super::decode;
use super::error::InferenceError;
use super::input::Frame;
use super::multimodal;
use super::output::GenerationResult;
use super::prefill;
use super::prompt::CallKind;
use super::resources::ResourceSet;
use super::streaming::TokenSink;
use crate::telemetry::{self, RequestSpan, SpanExt, StageTimer, TimedStage};

/// Where an inference call currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStage {
    Idle,
    Formatting,
    Tokenizing,
    Evaluating,
    Generating,
    Completed,
    Failed,
}

impl CallStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Formatting => "formatting",
            Self::Tokenizing => "tokenizing",
            Self::Evaluating => "evaluating",
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Tracks one call's stage, logging each transition.
#[derive(Debug)]
struct CallTracker {
    stage: CallStage,
}

impl CallTracker {
    fn new() -> Self {
        Self { stage: CallStage::Idle }
    }

    fn enter(&mut self, next: CallStage) {
        debug!(from = self.stage.as_str(), to = next.as_str(), "call stage");
        self.stage = next;
    }
}

/// A loaded model with its context, projector and sampler.
pub struct VisionSession<B: VisionBackend> {
    // Declared before `backend` so handles are released first on drop.
    resources: ResourceSet<B>,
    backend: B,
    config: SessionConfig,
    last_stage: CallStage,
}

impl<B: VisionBackend> VisionSession<B> {
    /// Load model, context, projector and sampler.
    ///
    /// Nothing is acquired unless both files exist. A failure at any later
    /// stage releases what was already acquired and returns that stage's error.
    pub fn load(
        backend: B,
        config: SessionConfig,
        model_path: &Path,
        projector_path: &Path,
    ) -> Result<Self, InferenceError> {
        config.validate()?;
        if !model_path.exists() {
            return Err(InferenceError::ModelNotFound(model_path.to_path_buf()));
        }
        if !projector_path.exists() {
            return Err(InferenceError::ProjectorNotFound(projector_path.to_path_buf()));
        }

        info!(model = %model_path.display(), projector = %projector_path.display(), "Loading model");
        let started = Instant::now();
        let resources = match ResourceSet::acquire(&backend, &config, model_path, projector_path) {
            Ok(r) => r,
            Err(e) => {
                error!(stage = e.stage(), error = %e, "session load failed");
                return Err(e);
            }
        };
        info!(load_ms = started.elapsed().as_millis() as u64, "session ready");

        Ok(Self { resources, backend, config, last_stage: CallStage::Idle })
    }

    /// All persistent handles are live.
    pub fn is_ready(&self) -> bool {
        self.resources.is_ready()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Terminal stage of the most recent call (`Idle` before the first).
    pub fn last_stage(&self) -> CallStage {
        self.last_stage
    }

    /// Describe a single image.
    pub fn describe_image(
        &mut self,
        frame: Frame<'_>,
        prompt: &str,
    ) -> Result<GenerationResult, InferenceError> {
        self.run(&[frame], prompt, None)
    }

    /// Describe an ordered set of frames (a short video segment).
    pub fn describe_frames(
        &mut self,
        frames: &[Frame<'_>],
        prompt: &str,
    ) -> Result<GenerationResult, InferenceError> {
        self.run(frames, prompt, None)
    }

    /// Single image, streaming each fragment to `sink`.
    pub fn describe_image_streaming(
        &mut self,
        frame: Frame<'_>,
        prompt: &str,
        sink: &mut dyn TokenSink,
    ) -> Result<GenerationResult, InferenceError> {
        self.run(&[frame], prompt, Some(sink))
    }

    /// Several frames, streaming each fragment to `sink`.
    pub fn describe_frames_streaming(
        &mut self,
        frames: &[Frame<'_>],
        prompt: &str,
        sink: &mut dyn TokenSink,
    ) -> Result<GenerationResult, InferenceError> {
        self.run(frames, prompt, Some(sink))
    }

    /// Release every handle. Safe to call repeatedly; dropping the session
    /// does the same.
    pub fn release(&mut self) {
        if self.resources.is_ready() || self.resources.has_sampler() {
            info!("Freeing model resources");
        }
        self.resources.release();
    }

    fn run(
        &mut self,
        frames: &[Frame<'_>],
        prompt: &str,
        mut sink: Option<&mut dyn TokenSink>,
    ) -> Result<GenerationResult, InferenceError> {
        // Readiness failures are reported to the caller directly, never
        // through the sink.
        if !self.resources.is_ready() {
            return Err(InferenceError::SessionNotReady);
        }

        let kind = CallKind::for_frames(frames.len());
        let call_id = Uuid::new_v4().to_string();
        let span = RequestSpan::new(&call_id, kind.label(), frames.len());
        let _guard = span.enter();
        info!(kind = kind.label(), frames = frames.len(), streaming = sink.is_some(), "Running inference");

        let mut tracker = CallTracker::new();
        let mut timer = StageTimer::start();
        let stage_sink = sink.as_mut().map(|s| &mut **s as &mut dyn TokenSink);
        let result = self.run_stages(kind, frames, prompt, stage_sink, &mut tracker, &mut timer);

        span.record_result(&result);
        span.record("latency_ms", timer.total().as_millis() as u64);
        match &result {
            Ok(generation) => {
                tracker.enter(CallStage::Completed);
                span.record("tokens_generated", generation.tokens_generated);
                if generation.finish_reason.is_truncated() {
                    warn!(tokens = generation.tokens_generated, "response truncated by decode failure");
                    telemetry::record_truncated_generation(kind.label());
                }
                timer.log_summary(kind.label(), frames.len(), generation.tokens_generated);
                telemetry::record_inference_success(kind.label(), generation.tokens_generated, timer.total());
                if let Some(sink) = sink {
                    sink.on_complete(&generation.text);
                }
            }
            Err(e) => {
                tracker.enter(CallStage::Failed);
                error!(stage = e.stage(), error = %e, "inference failed");
                telemetry::record_inference_failure(kind.label(), e.stage());
                if let Some(sink) = sink {
                    sink.on_error(&sink_message(kind, e));
                }
            }
        }
        self.last_stage = tracker.stage;
        result
    }

    fn run_stages(
        &mut self,
        kind: CallKind,
        frames: &[Frame<'_>],
        prompt: &str,
        sink: Option<&mut dyn TokenSink>,
        tracker: &mut CallTracker,
        timer: &mut StageTimer,
    ) -> Result<GenerationResult, InferenceError> {
        let backend = &self.backend;

        tracker.enter(CallStage::Formatting);
        multimodal::validate_frames(frames)?;
        let text = multimodal::format_prompt(backend, self.resources.model()?, kind, prompt);

        tracker.enter(CallStage::Tokenizing);
        timer.begin();
        let chunks = multimodal::tokenize_formatted(backend, &self.resources, &text, frames)?;
        timer.end(TimedStage::Tokenize);

        // `chunks` is dropped on every path out of this function.
        tracker.enter(CallStage::Evaluating);
        timer.begin();
        let cursor = prefill::evaluate(backend, &mut self.resources, &self.config.sampler, &chunks)?;
        timer.end(TimedStage::Evaluate);

        tracker.enter(CallStage::Generating);
        timer.begin();
        let generation = decode::generate(backend, &mut self.resources, cursor, &self.config.generation, sink);
        timer.end(TimedStage::Generate);
        drop(chunks);
        generation
    }
}

impl<B: VisionBackend> Drop for VisionSession<B> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Message delivered to a streaming sink when a stage before generation fails.
fn sink_message(kind: CallKind, err: &InferenceError) -> String {
    let subject = match kind {
        CallKind::Image => "input",
        CallKind::Video { .. } => "video input",
    };
    match err {
        InferenceError::Tokenization(_) => format!("Failed to tokenize {subject}"),
        InferenceError::Evaluation(_) => format!("Failed to evaluate {subject}"),
        other => other.to_string(),
    }
}
