// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! The native handle set behind a session.
//!
//! Acquisition order is model, context, projector, sampler. Any failure drops
//! the handles acquired so far in reverse order. Release order is sampler,
//! projector, context, model; each handle is checked independently so release
//! is a no-op on an already released (or never completed) set.

use std::path::Path;

use tracing::{debug, info};

use super::backend::VisionBackend;
use super::config::{SamplerConfig, SessionConfig};
use super::error::InferenceError;

/// Model, inference context, projector and sampler, owned as one unit.
pub struct ResourceSet<B: VisionBackend> {
    sampler: Option<B::Sampler>,
    projector: Option<B::Projector>,
    context: Option<B::Context>,
    model: Option<B::Model>,
}

impl<B: VisionBackend> ResourceSet<B> {
    /// Acquire every handle, or none.
    pub fn acquire(
        backend: &B,
        config: &SessionConfig,
        model_path: &Path,
        projector_path: &Path,
    ) -> Result<Self, InferenceError> {
        let model = backend
            .load_model(model_path, &config.model)
            .map_err(InferenceError::ModelLoad)?;
        debug!(path = %model_path.display(), n_gpu_layers = config.model.n_gpu_layers, "model loaded");

        // Locals drop in reverse declaration order, so an early return below
        // releases context before model.
        let context = backend
            .create_context(&model, &config.context)
            .map_err(InferenceError::ContextCreate)?;
        debug!(n_ctx = config.context.n_ctx, n_batch = config.context.n_batch, "context created");

        let projector = backend
            .load_projector(&model, projector_path, &config.projector)
            .map_err(InferenceError::ProjectorLoad)?;
        debug!(path = %projector_path.display(), use_gpu = config.projector.use_gpu, "projector loaded");

        let sampler = backend
            .build_sampler(&config.sampler)
            .map_err(InferenceError::SamplerInit)?;

        info!(
            vision = backend.supports_vision(&projector),
            chat_template = backend.has_chat_template(&model),
            "Model loaded successfully"
        );

        Ok(Self {
            sampler: Some(sampler),
            projector: Some(projector),
            context: Some(context),
            model: Some(model),
        })
    }

    /// Model, context and projector are all live. The sampler is rebuilt per
    /// call and is not part of readiness.
    pub fn is_ready(&self) -> bool {
        self.model.is_some() && self.context.is_some() && self.projector.is_some()
    }

    pub fn has_sampler(&self) -> bool {
        self.sampler.is_some()
    }

    pub fn model(&self) -> Result<&B::Model, InferenceError> {
        self.model.as_ref().ok_or(InferenceError::SessionNotReady)
    }

    pub fn projector(&self) -> Result<&B::Projector, InferenceError> {
        self.projector.as_ref().ok_or(InferenceError::SessionNotReady)
    }

    /// Replace the sampler chain. The previous chain is released first, so a
    /// failed rebuild leaves no sampler behind.
    pub fn rebuild_sampler(
        &mut self,
        backend: &B,
        config: &SamplerConfig,
    ) -> Result<(), InferenceError> {
        self.sampler = None;
        let sampler = backend.build_sampler(config).map_err(InferenceError::SamplerInit)?;
        self.sampler = Some(sampler);
        Ok(())
    }

    /// Borrows needed by the evaluation stage.
    pub fn eval_parts(&mut self) -> Result<(&B::Projector, &mut B::Context), InferenceError> {
        match (self.projector.as_ref(), self.context.as_mut()) {
            (Some(p), Some(c)) => Ok((p, c)),
            _ => Err(InferenceError::SessionNotReady),
        }
    }

    /// Borrows needed by the generation loop.
    pub fn generation_parts(
        &mut self,
    ) -> Result<(&B::Model, &mut B::Context, &mut B::Sampler), InferenceError> {
        match (self.model.as_ref(), self.context.as_mut(), self.sampler.as_mut()) {
            (Some(m), Some(c), Some(s)) => Ok((m, c, s)),
            _ => Err(InferenceError::SessionNotReady),
        }
    }

    /// Free sampler, projector, context, model, in that order.
    pub fn release(&mut self) {
        let mut released = 0;
        if self.sampler.take().is_some() {
            released += 1;
        }
        if self.projector.take().is_some() {
            released += 1;
        }
        if self.context.take().is_some() {
            released += 1;
        }
        if self.model.take().is_some() {
            released += 1;
        }
        if released > 0 {
            debug!(released, "session resources released");
        }
    }
}

impl<B: VisionBackend> Drop for ResourceSet<B> {
    fn drop(&mut self) {
        self.release();
    }
}
