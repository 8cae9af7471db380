// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! VisionAI CORE
//!
//! On-device multimodal inference sessions: a quantized vision-language
//! model plus its projector, answering "describe this image" and "what
//! happens in these frames" with text, returned whole or streamed.
//!
//! # Layers
//!
//! - [`engine`]: session lifecycle, prompt formatting, multimodal
//!   tokenization, evaluation and the generation loop, over the
//!   [`engine::VisionBackend`] seam
//! - [`telemetry`]: structured logging, call spans and metrics
//! - [`config`]: `VISIONAI_*` environment and TOML configuration
//! - `ffi`: C API (feature `ffi`)

pub mod cli;
pub mod config;
pub mod engine;
pub mod telemetry;

#[cfg(feature = "ffi")]
pub mod ffi;
