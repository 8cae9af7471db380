// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! `visionai-cli` entry point.
//!
//! ## Subcommands
//!
//! - `describe` - Describe one image or a short frame sequence
//! - `config show|defaults` - Inspect configuration
//! - `version`, `help`

use std::process::ExitCode;

use visionai_core::cli::{config_cmd, parse_describe_args, EXIT_USAGE};

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match command {
        "describe" => {
            let parsed = match parse_describe_args(&args[2..]) {
                Ok(a) => a,
                Err(e) => {
                    eprintln!("{e}");
                    return ExitCode::from(EXIT_USAGE);
                }
            };
            run_describe(parsed).await
        }
        "config" => {
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => {
                    let json = args.get(3).map(|s| s.as_str()) == Some("--json");
                    exit_code(config_cmd::run_show(json))
                }
                "defaults" => exit_code(config_cmd::run_defaults()),
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_command_help("config");
                    ExitCode::FAILURE
                }
            }
        }
        "help" | "--help" | "-h" => {
            if let Some(subcommand) = args.get(2) {
                print_command_help(subcommand);
            } else {
                print_usage();
            }
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("visionai-cli {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "gguf")]
async fn run_describe(args: visionai_core::cli::DescribeArgs) -> ExitCode {
    exit_code(visionai_core::cli::describe_cmd::run_describe(args).await)
}

#[cfg(not(feature = "gguf"))]
async fn run_describe(_args: visionai_core::cli::DescribeArgs) -> ExitCode {
    eprintln!("describe requires a build with the `gguf` feature");
    ExitCode::from(EXIT_USAGE)
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "visionai-cli v{}

USAGE:
    visionai-cli <COMMAND> [OPTIONS]

COMMANDS:
    describe     Describe an image or a short frame sequence
    config       Inspect configuration (show, defaults)
    version      Show version information
    help         Show this help message

EXAMPLES:
    visionai-cli describe model.gguf mmproj.gguf photo.rgb:640x480
    visionai-cli describe model.gguf mmproj.gguf f0.rgb:512x288 f1.rgb:512x288 f2.rgb:512x288 --stream
    visionai-cli config show --json

ENVIRONMENT:
    VISIONAI_N_CTX, VISIONAI_N_THREADS, VISIONAI_N_GPU_LAYERS,
    VISIONAI_PROJECTOR_GPU, VISIONAI_LOG_LEVEL,
    VISIONAI_LOG_FORMAT, VISIONAI_CONFIG

EXIT CODES:
    0  Success
    1  Failure
    2  Usage or configuration error
",
        version
    );
}

/// Print detailed help for a specific command.
fn print_command_help(command: &str) {
    match command {
        "describe" => {
            eprintln!(
                "visionai-cli describe - Describe an image or frame sequence

USAGE:
    visionai-cli describe <MODEL> <PROJECTOR> <FRAME>:<W>x<H>... [OPTIONS]

OPTIONS:
    -p, --prompt TEXT  Prompt (default depends on frame count)
    --stream           Print fragments as they are generated

DESCRIPTION:
    Each FRAME is a file of packed RGB bytes with the given dimensions.
    Frames larger than 512 pixels on a side are downscaled first.
    One frame runs an image call; two or more run a video call.
"
            );
        }
        "config" => {
            eprintln!(
                "visionai-cli config - Inspect configuration

USAGE:
    visionai-cli config <SUBCOMMAND>

SUBCOMMANDS:
    show [--json]  Show effective configuration
    defaults       Print the default session config as TOML
"
            );
        }
        _ => {
            eprintln!(
                "No detailed help available for '{}'. Use 'visionai-cli help' for general usage.",
                command
            );
        }
    }
}
