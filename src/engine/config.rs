// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Session configuration types for VisionAI CORE.
//!
//! All fields have safe defaults matching the on-device profile. Configuration
//! is fixed when a session is created and validated before any handle is
//! acquired.

use serde::{Deserialize, Serialize};

use super::error::InferenceError;

/// Hard ceiling on generated tokens per call.
pub const MAX_TOKENS: u32 = 400;

/// Largest text fragment a single token may produce, in bytes.
pub const MAX_PIECE_BYTES: usize = 255;

/// Sub-batch size used when evaluating tokenized chunks.
pub const EVAL_SUB_BATCH: i32 = 128;

/// llama.cpp `LLAMA_DEFAULT_SEED`.
pub const DEFAULT_SEED: u32 = 0xFFFF_FFFF;

/// Model load parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Layers offloaded to the GPU (99 = all).
    pub n_gpu_layers: u32,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self { n_gpu_layers: 99 }
    }
}

/// Inference context parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextParams {
    /// Context window size in tokens.
    pub n_ctx: u32,
    /// Logical batch size for prompt evaluation.
    pub n_batch: u32,
    /// Worker threads (0 = auto).
    pub n_threads: u32,
    /// Enable flash attention.
    pub flash_attention: bool,
}

impl Default for ContextParams {
    fn default() -> Self {
        Self { n_ctx: 2048, n_batch: 512, n_threads: 4, flash_attention: true }
    }
}

/// Multimodal projector parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectorParams {
    /// Run the vision encoder on the GPU.
    pub use_gpu: bool,
    /// Worker threads (0 = auto).
    pub n_threads: u32,
}

impl Default for ProjectorParams {
    fn default() -> Self {
        Self { use_gpu: true, n_threads: 4 }
    }
}

/// Sampler chain configuration, consumed once per inference call.
///
/// Stage order: repetition penalty, min-p, temperature, distribution draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Window of recent tokens considered by the penalty stage.
    pub penalty_last_n: i32,
    pub penalty_repeat: f32,
    pub penalty_freq: f32,
    pub penalty_present: f32,
    /// Minimum probability relative to the most likely token.
    pub min_p: f32,
    /// Minimum candidates kept by the min-p stage.
    pub min_keep: usize,
    pub temperature: f32,
    pub seed: u32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            penalty_last_n: 64,
            penalty_repeat: 1.3,
            penalty_freq: 0.0,
            penalty_present: 0.0,
            min_p: 0.05,
            min_keep: 1,
            temperature: 0.7,
            seed: DEFAULT_SEED,
        }
    }
}

/// Parameters for prefill evaluation of a chunk sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalParams {
    /// Position of the first evaluated token.
    pub n_past: i32,
    /// Sub-batch size passed to the chunk evaluator.
    pub n_batch: i32,
    /// Request logits for the final token only.
    pub logits_last: bool,
}

impl Default for EvalParams {
    fn default() -> Self {
        Self { n_past: 0, n_batch: EVAL_SUB_BATCH, logits_last: true }
    }
}

/// Generation limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub max_tokens: u32,
    pub max_piece_bytes: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { max_tokens: MAX_TOKENS, max_piece_bytes: MAX_PIECE_BYTES }
    }
}

/// Everything fixed at session creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub model: ModelParams,
    pub context: ContextParams,
    pub projector: ProjectorParams,
    pub sampler: SamplerConfig,
    pub generation: GenerationConfig,
}

impl SessionConfig {
    /// Defaults with the caller-supplied thread count and context length,
    /// matching the boundary `loadModel(model, projector, threads, ctx)`.
    pub fn with_threads_and_ctx(n_threads: u32, n_ctx: u32) -> Self {
        let mut cfg = Self::default();
        cfg.context.n_threads = n_threads;
        cfg.context.n_ctx = n_ctx;
        cfg.projector.n_threads = n_threads;
        cfg
    }

    /// Validate configuration values. Returns error on invalid values.
    pub fn validate(&self) -> Result<(), InferenceError> {
        if self.context.n_ctx == 0 {
            return Err(InferenceError::InvalidConfig("n_ctx must be > 0".into()));
        }
        if self.context.n_batch == 0 {
            return Err(InferenceError::InvalidConfig("n_batch must be > 0".into()));
        }
        if self.generation.max_tokens == 0 || self.generation.max_tokens > MAX_TOKENS {
            return Err(InferenceError::InvalidConfig(format!(
                "max_tokens must be in 1..={MAX_TOKENS}"
            )));
        }
        if self.generation.max_piece_bytes == 0 {
            return Err(InferenceError::InvalidConfig("max_piece_bytes must be > 0".into()));
        }
        if self.sampler.temperature < 0.0 || self.sampler.temperature > 2.0 {
            return Err(InferenceError::InvalidConfig(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.sampler.min_p) {
            return Err(InferenceError::InvalidConfig("min_p must be in [0.0, 1.0]".into()));
        }
        if self.sampler.penalty_repeat < 1.0 {
            return Err(InferenceError::InvalidConfig("penalty_repeat must be >= 1.0".into()));
        }
        Ok(())
    }
}

/// Resolve a thread count, where 0 means "pick for this machine".
pub fn resolve_threads(n: u32) -> i32 {
    if n == 0 {
        // Memory-bound workload; logical cores help, with diminishing returns past 16.
        let optimal = num_cpus::get().clamp(1, 16);
        i32::try_from(optimal).unwrap_or(4)
    } else {
        i32::try_from(n).unwrap_or(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn sampler_defaults_match_device_profile() {
        let s = SamplerConfig::default();
        assert_eq!(s.penalty_last_n, 64);
        assert!((s.penalty_repeat - 1.3).abs() < f32::EPSILON);
        assert!((s.min_p - 0.05).abs() < f32::EPSILON);
        assert_eq!(s.min_keep, 1);
        assert!((s.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(s.seed, DEFAULT_SEED);
    }

    #[test]
    fn boundary_constructor_sets_threads_and_ctx() {
        let cfg = SessionConfig::with_threads_and_ctx(6, 4096);
        assert_eq!(cfg.context.n_threads, 6);
        assert_eq!(cfg.projector.n_threads, 6);
        assert_eq!(cfg.context.n_ctx, 4096);
        assert_eq!(cfg.context.n_batch, 512);
        assert_eq!(cfg.model.n_gpu_layers, 99);
        assert!(cfg.context.flash_attention);
        assert!(cfg.projector.use_gpu);
    }

    #[test]
    fn rejects_zero_ctx_and_tokens() {
        let mut cfg = SessionConfig::default();
        cfg.context.n_ctx = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = SessionConfig::default();
        cfg.generation.max_tokens = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_tokens_above_ceiling() {
        let mut cfg = SessionConfig::default();
        cfg.generation.max_tokens = MAX_TOKENS + 1;
        assert!(cfg.validate().is_err());
        cfg.generation.max_tokens = 16;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_sampler() {
        let mut cfg = SessionConfig::default();
        cfg.sampler.temperature = 2.5;
        assert!(cfg.validate().is_err());

        let mut cfg = SessionConfig::default();
        cfg.sampler.min_p = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = SessionConfig::default();
        cfg.sampler.penalty_repeat = 0.9;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn resolve_threads_auto_is_bounded() {
        let n = resolve_threads(0);
        assert!((1..=16).contains(&n));
        assert_eq!(resolve_threads(3), 3);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: SessionConfig = toml::from_str("[context]\nn_ctx = 1024\n").unwrap();
        assert_eq!(cfg.context.n_ctx, 1024);
        assert_eq!(cfg.context.n_batch, 512);
        assert_eq!(cfg.generation.max_tokens, MAX_TOKENS);
    }
}
