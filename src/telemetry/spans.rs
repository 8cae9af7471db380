// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Span utilities and stage timing for inference calls.
//!
//! Timing is observational only: nothing here feeds back into control flow.

use std::time::{Duration, Instant};

use tracing::{info, info_span, Span};

/// Extension trait for adding context to spans.
pub trait SpanExt {
    /// Record the result of an operation into the span.
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display;
}

impl SpanExt for Span {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(_) => {
                self.record("status", "ok");
            }
            Err(e) => {
                self.record("status", "error");
                self.record("error.message", e.to_string().as_str());
            }
        }
    }
}

/// Factory for inference call spans.
pub struct RequestSpan;

impl RequestSpan {
    /// Create a span for one inference call.
    ///
    /// `status`, `error.message`, `latency_ms` and `tokens_generated` are
    /// filled in when the call ends.
    pub fn new(call_id: &str, kind: &str, frames: usize) -> Span {
        info_span!(
            "inference_call",
            call_id = %call_id,
            kind = %kind,
            frames,
            status = tracing::field::Empty,
            error.message = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
            tokens_generated = tracing::field::Empty,
        )
    }
}

/// Pipeline stages timed per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedStage {
    Tokenize,
    Evaluate,
    Generate,
}

impl TimedStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tokenize => "tokenize",
            Self::Evaluate => "evaluate",
            Self::Generate => "generate",
        }
    }
}

/// Wall-clock timestamps around the tokenize / evaluate / generate stages.
#[derive(Debug)]
pub struct StageTimer {
    started: Instant,
    stage_started: Instant,
    tokenize: Option<Duration>,
    evaluate: Option<Duration>,
    generate: Option<Duration>,
}

impl StageTimer {
    pub fn start() -> Self {
        let now = Instant::now();
        Self { started: now, stage_started: now, tokenize: None, evaluate: None, generate: None }
    }

    /// Mark the beginning of a stage.
    pub fn begin(&mut self) {
        self.stage_started = Instant::now();
    }

    /// Mark the end of `stage`, started at the last `begin`.
    pub fn end(&mut self, stage: TimedStage) {
        let elapsed = self.stage_started.elapsed();
        super::metrics::record_stage(stage, elapsed);
        match stage {
            TimedStage::Tokenize => self.tokenize = Some(elapsed),
            TimedStage::Evaluate => self.evaluate = Some(elapsed),
            TimedStage::Generate => self.generate = Some(elapsed),
        }
    }

    pub fn stage(&self, stage: TimedStage) -> Option<Duration> {
        match stage {
            TimedStage::Tokenize => self.tokenize,
            TimedStage::Evaluate => self.evaluate,
            TimedStage::Generate => self.generate,
        }
    }

    pub fn total(&self) -> Duration {
        self.started.elapsed()
    }

    /// Tokens per second over the generate stage (0 when unmeasured).
    pub fn tokens_per_second(&self, tokens: u32) -> f64 {
        match self.generate {
            Some(d) if tokens > 0 && !d.is_zero() => f64::from(tokens) / d.as_secs_f64(),
            _ => 0.0,
        }
    }

    /// Emit the per-call benchmark line.
    pub fn log_summary(&self, kind: &str, frames: usize, tokens: u32) {
        let ms = |d: Option<Duration>| d.map(|d| d.as_millis() as u64).unwrap_or(0);
        info!(
            kind,
            frames,
            tokenize_ms = ms(self.tokenize),
            eval_ms = ms(self.evaluate),
            generate_ms = ms(self.generate),
            total_ms = self.total().as_millis() as u64,
            tokens,
            tok_per_s = format!("{:.1}", self.tokens_per_second(tokens)),
            "inference benchmark"
        );
    }
}
