// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Prefill: commit a tokenized chunk sequence to the context's running state.

use tracing::{debug, error};

use super::backend::VisionBackend;
use super::config::{EvalParams, SamplerConfig};
use super::error::InferenceError;
use super::resources::ResourceSet;

/// Number of tokens committed to the running state. The next decoded token
/// goes at this position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeCursor(i32);

impl DecodeCursor {
    pub fn new(position: i32) -> Self {
        Self(position)
    }

    pub fn position(&self) -> i32 {
        self.0
    }

    pub fn advance(&mut self) {
        self.0 += 1;
    }
}

/// Clear memory, rebuild the sampler, then evaluate `chunks` from position 0.
///
/// Nothing from a previous call on the same session survives into this one.
/// The caller keeps ownership of `chunks` and drops it regardless of outcome.
pub fn evaluate<B: VisionBackend>(
    backend: &B,
    resources: &mut ResourceSet<B>,
    sampler_config: &SamplerConfig,
    chunks: &B::Chunks,
) -> Result<DecodeCursor, InferenceError> {
    {
        let (_, context) = resources.eval_parts()?;
        backend.clear_memory(context);
    }
    resources.rebuild_sampler(backend, sampler_config)?;

    let params = EvalParams::default();
    let (projector, context) = resources.eval_parts()?;
    match backend.eval_chunks(projector, context, chunks, &params) {
        Ok(n_past) => {
            debug!(n_past, n_batch = params.n_batch, "prefill complete");
            Ok(DecodeCursor::new(n_past))
        }
        Err(e) => {
            error!(error = %e, "Failed to evaluate chunks");
            Err(InferenceError::Evaluation(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_advances_by_one() {
        let mut c = DecodeCursor::new(17);
        c.advance();
        c.advance();
        assert_eq!(c.position(), 19);
    }

    #[test]
    fn cursor_default_is_zero() {
        assert_eq!(DecodeCursor::default().position(), 0);
    }
}
