// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! C API for embedding VisionAI CORE in native hosts.
//!
//! Every fallible function returns a `VisionErrorCode`; the message for the
//! most recent failure on the calling thread is available from
//! `visionai_get_last_error`. The header is generated into
//! `include/visionai.h` at build time.

mod error;
mod session;

pub use error::{visionai_clear_last_error, visionai_get_last_error, VisionErrorCode};
pub use session::{
    visionai_free_model, visionai_free_string, visionai_load_model, visionai_run_inference,
    visionai_run_inference_streaming, visionai_run_video_inference,
    visionai_run_video_inference_streaming, VisionFrame, VisionSessionHandle, VisionTokenCallbacks,
};
