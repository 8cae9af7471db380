// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Inference error types for VisionAI CORE.
//!
//! Creation and pre-generation failures are fail-closed: the call aborts and
//! every resource acquired for it is released. Decode failures inside the
//! generation loop are not errors; they end generation early.

use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by an external collaborator (model runtime or the
/// multimodal preprocessing library).
#[derive(Debug, Clone, Error)]
#[error("{op}: {message}")]
pub struct BackendError {
    /// Operation that failed (e.g. "load_model", "tokenize").
    pub op: &'static str,
    /// Collaborator-supplied detail.
    pub message: String,
}

impl BackendError {
    pub fn new(op: &'static str, message: impl Into<String>) -> Self {
        Self { op, message: message.into() }
    }
}

/// Errors that can occur during session creation and inference calls.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model file not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error("Projector file not found: {}", .0.display())]
    ProjectorNotFound(PathBuf),

    #[error("Failed to load model: {0}")]
    ModelLoad(#[source] BackendError),

    #[error("Failed to create llama context: {0}")]
    ContextCreate(#[source] BackendError),

    #[error("Failed to load multimodal projector: {0}")]
    ProjectorLoad(#[source] BackendError),

    #[error("Failed to build sampler chain: {0}")]
    SamplerInit(#[source] BackendError),

    #[error("Model not loaded")]
    SessionNotReady,

    #[error("Invalid frame {index}: {reason}")]
    InvalidFrame { index: usize, reason: String },

    #[error("Failed to tokenize input: {0}")]
    Tokenization(#[source] BackendError),

    #[error("Failed to evaluate input: {0}")]
    Evaluation(#[source] BackendError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl InferenceError {
    /// Returns true if this error aborted session creation.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::ModelNotFound(_)
                | Self::ProjectorNotFound(_)
                | Self::ModelLoad(_)
                | Self::ContextCreate(_)
                | Self::ProjectorLoad(_)
        )
    }

    /// Short stage label used in logs and metrics.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ModelNotFound(_) | Self::ProjectorNotFound(_) | Self::ModelLoad(_) => "load_model",
            Self::ContextCreate(_) => "create_context",
            Self::ProjectorLoad(_) => "load_projector",
            Self::SamplerInit(_) => "sampler",
            Self::SessionNotReady => "ready_check",
            Self::InvalidFrame { .. } => "frames",
            Self::Tokenization(_) => "tokenize",
            Self::Evaluation(_) => "evaluate",
            Self::InvalidConfig(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_display_includes_op() {
        let e = BackendError::new("tokenize", "code 2");
        assert_eq!(e.to_string(), "tokenize: code 2");
    }

    #[test]
    fn load_failures_are_classified() {
        assert!(InferenceError::ModelLoad(BackendError::new("load_model", "x")).is_load_failure());
        assert!(InferenceError::ProjectorLoad(BackendError::new("mtmd_init", "x")).is_load_failure());
        assert!(!InferenceError::SessionNotReady.is_load_failure());
        assert!(!InferenceError::Tokenization(BackendError::new("tokenize", "x")).is_load_failure());
    }

    #[test]
    fn session_not_ready_message_matches_boundary_contract() {
        assert_eq!(InferenceError::SessionNotReady.to_string(), "Model not loaded");
    }

    #[test]
    fn stage_labels() {
        assert_eq!(InferenceError::Evaluation(BackendError::new("eval", "x")).stage(), "evaluate");
        assert_eq!(
            InferenceError::InvalidFrame { index: 0, reason: "empty".into() }.stage(),
            "frames"
        );
    }
}
