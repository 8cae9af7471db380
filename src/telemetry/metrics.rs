// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Metrics facade hooks. A host installs its own recorder; without one these
//! calls are no-ops.

use std::time::Duration;

use super::spans::TimedStage;

/// Count a completed inference call and its generated tokens.
pub fn record_inference_success(kind: &'static str, tokens: u32, latency: Duration) {
    metrics::counter!("visionai_inference_total", "status" => "ok", "kind" => kind).increment(1);
    metrics::histogram!("visionai_tokens_generated", "kind" => kind).record(f64::from(tokens));
    metrics::histogram!("visionai_inference_latency_ms", "kind" => kind)
        .record(latency.as_secs_f64() * 1000.0);
}

/// Count a call that failed before generation.
pub fn record_inference_failure(kind: &'static str, stage: &'static str) {
    metrics::counter!(
        "visionai_inference_total",
        "status" => "error",
        "kind" => kind,
        "stage" => stage
    )
    .increment(1);
}

/// Count a generation that ended on a decode failure.
pub fn record_truncated_generation(kind: &'static str) {
    metrics::counter!("visionai_generation_truncated_total", "kind" => kind).increment(1);
}

pub(crate) fn record_stage(stage: TimedStage, elapsed: Duration) {
    metrics::histogram!("visionai_stage_ms", "stage" => stage.as_str())
        .record(elapsed.as_secs_f64() * 1000.0);
}
