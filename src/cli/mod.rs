// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI module for the `visionai-cli` binary.
//!
//! ## Usage
//!
//! ```bash
//! visionai-cli describe model.gguf mmproj.gguf frame.rgb:640x480
//! visionai-cli describe model.gguf mmproj.gguf a.rgb:512x288 b.rgb:512x288 --stream
//! visionai-cli config show
//! visionai-cli config defaults
//! ```

pub mod config_cmd;
pub mod describe_cmd;

pub use describe_cmd::{parse_describe_args, DescribeArgs, FrameSpec};

/// Exit code for bad arguments or configuration.
pub const EXIT_USAGE: u8 = 2;
