// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Telemetry module for VisionAI CORE.
//!
//! Structured logging, per-call spans with stage timing, and metrics facade
//! hooks. All of it observes the pipeline; none of it steers it.

mod logging;
mod metrics;
mod spans;

pub use self::logging::{init_logging, LogConfig, LogError, LogFormat};
pub use self::metrics::{record_inference_failure, record_inference_success, record_truncated_generation};
pub use self::spans::{RequestSpan, SpanExt, StageTimer, TimedStage};
