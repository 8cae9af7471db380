// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Runtime configuration loading from environment variables.
//!
//! Values come from `VISIONAI_*` environment variables with safe defaults.
//! An optional TOML file named by `VISIONAI_CONFIG` is applied first and
//! environment variables override it. Invalid values fall back to defaults
//! without crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `VISIONAI_N_CTX` | 2048 | Context window size (floor 128) |
//! | `VISIONAI_N_THREADS` | 4 | Inference threads (0 = auto) |
//! | `VISIONAI_N_GPU_LAYERS` | 99 | Layers offloaded to the GPU |
//! | `VISIONAI_PROJECTOR_GPU` | true | Run the vision encoder on the GPU |
//! | `VISIONAI_LOG_LEVEL` | info | Log filter |
//! | `VISIONAI_LOG_FORMAT` | json | `json` or `pretty` |
//! | `VISIONAI_CONFIG` | unset | Path to a TOML session config |
//!
//! The token ceiling and the prompt batch size are not environment settings.
//! They default to 400 and 512; a TOML file may lower the ceiling for
//! development, and `SessionConfig::validate` rejects anything above 400.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::engine::SessionConfig;
use crate::telemetry::{LogConfig, LogFormat};

const MIN_N_CTX: u32 = 128;

/// Errors reading the optional config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// All configuration resolved from file and environment.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub session: SessionConfig,
    pub log: LogConfig,
    pub config_file: Option<PathBuf>,
}

/// Flat summary of effective values (serializable, for `config show`).
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub n_ctx: u32,
    pub n_threads: u32,
    pub n_batch: u32,
    pub n_gpu_layers: u32,
    pub projector_gpu: bool,
    pub flash_attention: bool,
    pub max_tokens: u32,
    pub temperature: f32,
    pub min_p: f32,
    pub penalty_repeat: f32,
    pub penalty_last_n: i32,
    pub log_level: String,
    pub log_format: &'static str,
    pub config_file: Option<String>,
}

/// Parse a `u32` env var, returning `default` on missing or invalid.
fn parse_u32(key: &str, default: u32) -> u32 {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<u32>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse a boolean env var (`1/0`, `true/false`, `yes/no`, `on/off`).
fn parse_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => match val.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

/// Read a TOML session config. Missing sections and fields take defaults.
pub fn load_file(path: &Path) -> Result<SessionConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    toml::from_str(&text).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Apply `VISIONAI_*` overrides on top of `base`.
fn apply_env(mut cfg: SessionConfig) -> SessionConfig {
    let n_ctx = parse_u32("VISIONAI_N_CTX", cfg.context.n_ctx);
    cfg.context.n_ctx = n_ctx.max(MIN_N_CTX);

    let n_threads = parse_u32("VISIONAI_N_THREADS", cfg.context.n_threads);
    cfg.context.n_threads = n_threads;
    cfg.projector.n_threads = n_threads;

    cfg.model.n_gpu_layers = parse_u32("VISIONAI_N_GPU_LAYERS", cfg.model.n_gpu_layers);
    cfg.projector.use_gpu = parse_bool("VISIONAI_PROJECTOR_GPU", cfg.projector.use_gpu);
    cfg
}

fn load_log_config() -> LogConfig {
    let mut log = LogConfig::default();
    if let Ok(level) = std::env::var("VISIONAI_LOG_LEVEL") {
        if !level.trim().is_empty() {
            log.level = level.trim().to_string();
        }
    }
    if let Ok(format) = std::env::var("VISIONAI_LOG_FORMAT") {
        log.format = LogFormat::parse(&format).unwrap_or_default();
    }
    log
}

/// Load all configuration.
///
/// Fails only when `VISIONAI_CONFIG` names a file that cannot be read or
/// parsed; environment values never fail.
pub fn load() -> Result<EnvConfig, ConfigError> {
    let config_file = std::env::var("VISIONAI_CONFIG")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);
    let base = match &config_file {
        Some(path) => load_file(path)?,
        None => SessionConfig::default(),
    };
    Ok(EnvConfig { session: apply_env(base), log: load_log_config(), config_file })
}

impl EnvConfig {
    /// Return a serializable summary of all effective values.
    pub fn effective_config(&self) -> EffectiveConfig {
        let s = &self.session;
        EffectiveConfig {
            n_ctx: s.context.n_ctx,
            n_threads: s.context.n_threads,
            n_batch: s.context.n_batch,
            n_gpu_layers: s.model.n_gpu_layers,
            projector_gpu: s.projector.use_gpu,
            flash_attention: s.context.flash_attention,
            max_tokens: s.generation.max_tokens,
            temperature: s.sampler.temperature,
            min_p: s.sampler.min_p,
            penalty_repeat: s.sampler.penalty_repeat,
            penalty_last_n: s.sampler.penalty_last_n,
            log_level: self.log.level.clone(),
            log_format: self.log.format.as_str(),
            config_file: self.config_file.as_ref().map(|p| p.display().to_string()),
        }
    }
}
