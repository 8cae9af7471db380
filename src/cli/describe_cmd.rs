// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! `describe` subcommand: run one image or video call from raw RGB files.
//!
//! Each frame argument is `<path>:<width>x<height>` naming a packed RGB file.
//! One frame runs an image call; several run a video call.

use std::path::PathBuf;

/// A frame file and its declared dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSpec {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl FrameSpec {
    /// Parse `<path>:<width>x<height>`. The last `:` separates the size, so
    /// paths may contain colons.
    pub fn parse(arg: &str) -> Result<Self, String> {
        let (path, dims) = arg
            .rsplit_once(':')
            .ok_or_else(|| format!("frame '{arg}' must be <path>:<width>x<height>"))?;
        let (w, h) = dims
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("frame '{arg}' has no <width>x<height>"))?;
        let width = w.parse::<u32>().map_err(|_| format!("invalid width '{w}' in '{arg}'"))?;
        let height = h.parse::<u32>().map_err(|_| format!("invalid height '{h}' in '{arg}'"))?;
        if path.is_empty() {
            return Err(format!("frame '{arg}' has an empty path"));
        }
        if width == 0 || height == 0 {
            return Err(format!("frame '{arg}' has a zero dimension"));
        }
        Ok(Self { path: PathBuf::from(path), width, height })
    }
}

/// Parsed `describe` arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeArgs {
    pub model: PathBuf,
    pub projector: PathBuf,
    pub frames: Vec<FrameSpec>,
    pub prompt: Option<String>,
    pub stream: bool,
}

impl DescribeArgs {
    /// The prompt to send, falling back to the default for the call kind.
    pub fn effective_prompt(&self) -> &str {
        match &self.prompt {
            Some(p) => p,
            None if self.frames.len() == 1 => crate::engine::DEFAULT_IMAGE_PROMPT,
            None => crate::engine::DEFAULT_VIDEO_PROMPT,
        }
    }
}

/// Parse the arguments following `describe`.
pub fn parse_describe_args(args: &[String]) -> Result<DescribeArgs, String> {
    let mut positional = Vec::new();
    let mut prompt = None;
    let mut stream = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--prompt" | "-p" => {
                let value = args.get(i + 1).ok_or("Missing value for --prompt")?;
                prompt = Some(value.clone());
                i += 2;
            }
            "--stream" => {
                stream = true;
                i += 1;
            }
            other if other.starts_with("--") => return Err(format!("Unknown argument: {other}")),
            other => {
                positional.push(other.to_string());
                i += 1;
            }
        }
    }

    if positional.len() < 3 {
        return Err(
            "Usage: visionai-cli describe <MODEL> <PROJECTOR> <FRAME>:<W>x<H>... [--prompt TEXT] [--stream]"
                .into(),
        );
    }
    let mut rest = positional.into_iter();
    let model = rest.next().map(PathBuf::from).unwrap_or_default();
    let projector = rest.next().map(PathBuf::from).unwrap_or_default();
    let frames = rest.map(|a| FrameSpec::parse(&a)).collect::<Result<Vec<_>, _>>()?;

    Ok(DescribeArgs { model, projector, frames, prompt, stream })
}

#[cfg(feature = "gguf")]
pub use run::run_describe;

#[cfg(feature = "gguf")]
mod run {
    use std::io::Write;

    use tracing::error;

    use super::DescribeArgs;
    use crate::config;
    use crate::engine::{
        GgufSession, LlamaCppBackend, PreparedFrame, StreamEvent, TokenStream, VisionSession,
    };
    use crate::telemetry::{init_logging, LogFormat};

    /// Load a session, run the call, print the response. Returns an exit code.
    pub async fn run_describe(args: DescribeArgs) -> i32 {
        let env = match config::load() {
            Ok(env) => env,
            Err(e) => {
                eprintln!("Error: {e}");
                return i32::from(crate::cli::EXIT_USAGE);
            }
        };
        let mut log = env.log.clone();
        if std::env::var_os("VISIONAI_LOG_FORMAT").is_none() {
            log.format = LogFormat::Pretty;
        }
        if let Err(e) = init_logging(&log) {
            eprintln!("Warning: logging disabled: {e}");
        }

        let mut frames = Vec::with_capacity(args.frames.len());
        for spec in &args.frames {
            let rgb = match std::fs::read(&spec.path) {
                Ok(b) => b,
                Err(e) => {
                    eprintln!("Error: cannot read {}: {e}", spec.path.display());
                    return 1;
                }
            };
            match PreparedFrame::from_rgb(rgb, spec.width, spec.height) {
                Ok(f) => frames.push(f),
                Err(e) => {
                    eprintln!("Error: {}: {e}", spec.path.display());
                    return 1;
                }
            }
        }

        let session = match VisionSession::load(
            LlamaCppBackend::new(),
            env.session.clone(),
            &args.model,
            &args.projector,
        ) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error: {e}");
                return 1;
            }
        };

        let prompt = args.effective_prompt().to_string();
        if args.stream {
            run_streaming(session, frames, prompt).await
        } else {
            run_blocking(session, frames, prompt).await
        }
    }

    async fn run_blocking(mut session: GgufSession, frames: Vec<PreparedFrame>, prompt: String) -> i32 {
        let result = tokio::task::spawn_blocking(move || {
            let views: Vec<_> = frames.iter().map(PreparedFrame::as_frame).collect();
            session.describe_frames(&views, &prompt)
        })
        .await;
        match result {
            Ok(Ok(generation)) => {
                println!("{}", generation.text);
                0
            }
            Ok(Err(e)) => {
                eprintln!("Error: {e}");
                1
            }
            Err(e) => {
                error!(error = %e, "inference task failed");
                1
            }
        }
    }

    async fn run_streaming(mut session: GgufSession, frames: Vec<PreparedFrame>, prompt: String) -> i32 {
        let (mut sink, mut stream) = TokenStream::new(64);
        let worker = tokio::task::spawn_blocking(move || {
            let views: Vec<_> = frames.iter().map(PreparedFrame::as_frame).collect();
            session.describe_frames_streaming(&views, &prompt, &mut sink)
        });

        let mut stdout = std::io::stdout();
        let mut failed = false;
        while let Some(event) = stream.next().await {
            match event {
                StreamEvent::Token(t) => {
                    let _ = write!(stdout, "{t}");
                    let _ = stdout.flush();
                }
                StreamEvent::Complete(_) => {
                    let _ = writeln!(stdout);
                }
                StreamEvent::Error(e) => {
                    eprintln!("Error: {e}");
                    failed = true;
                }
            }
        }

        match worker.await {
            Ok(Ok(_)) if !failed => 0,
            Ok(Ok(_)) => 1,
            Ok(Err(e)) => {
                if !failed {
                    eprintln!("Error: {e}");
                }
                1
            }
            Err(e) => {
                error!(error = %e, "inference task failed");
                1
            }
        }
    }
}
