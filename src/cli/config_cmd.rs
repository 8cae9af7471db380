// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Config CLI subcommands: show, defaults.
//!
//! These commands read configuration directly from environment variables
//! and the optional `VISIONAI_CONFIG` file.

use crate::config::{self, EffectiveConfig};
use crate::engine::SessionConfig;

/// Print effective config as key-value pairs to stdout.
///
/// Returns 0 on success, 2 if the config file cannot be loaded.
pub fn run_show(json: bool) -> i32 {
    let cfg = match config::load() {
        Ok(env) => env.effective_config(),
        Err(e) => {
            eprintln!("Error: {e}");
            return i32::from(super::EXIT_USAGE);
        }
    };
    if json {
        match serde_json::to_string_pretty(&cfg) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Error: {e}");
                return 1;
            }
        }
    } else {
        for line in config_lines(&cfg) {
            println!("{line}");
        }
    }
    0
}

/// Print the default session config as TOML, suitable as a starting point
/// for a `VISIONAI_CONFIG` file.
pub fn run_defaults() -> i32 {
    match toml::to_string_pretty(&SessionConfig::default()) {
        Ok(s) => {
            print!("{s}");
            0
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

fn config_lines(cfg: &EffectiveConfig) -> Vec<String> {
    vec![
        format!("VISIONAI_N_CTX={}", cfg.n_ctx),
        format!("VISIONAI_N_THREADS={}", cfg.n_threads),
        format!("n_batch={}", cfg.n_batch),
        format!("VISIONAI_N_GPU_LAYERS={}", cfg.n_gpu_layers),
        format!("VISIONAI_PROJECTOR_GPU={}", cfg.projector_gpu),
        format!("max_tokens={}", cfg.max_tokens),
        format!("VISIONAI_LOG_LEVEL={}", cfg.log_level),
        format!("VISIONAI_LOG_FORMAT={}", cfg.log_format),
        format!("VISIONAI_CONFIG={}", cfg.config_file.as_deref().unwrap_or("")),
        format!("flash_attention={}", cfg.flash_attention),
        format!("temperature={}", cfg.temperature),
        format!("min_p={}", cfg.min_p),
        format!("penalty_repeat={}", cfg.penalty_repeat),
        format!("penalty_last_n={}", cfg.penalty_last_n),
    ]
}
