// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Orchestration throughput benchmarks.
//!
//! Runs whole calls over a no-op backend, so the numbers measure the session
//! pipeline (prompt formatting, text assembly, sink delivery) and frame
//! preparation, not model compute.

use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use visionai_core::engine::{
    BackendError, ChatMessage, ContextParams, EvalParams, Frame, ModelParams, PreparedFrame,
    ProjectorParams, SamplerConfig, SessionConfig, TokenSink, TokenizeText, VisionBackend,
    VisionSession,
};

/// Emits `len` pieces of "tok " and then stops.
struct NopBackend {
    len: u32,
}

struct Counter(u32);

impl VisionBackend for NopBackend {
    type Model = ();
    type Context = ();
    type Sampler = Counter;
    type Projector = ();
    type Bitmap = ();
    type Chunks = ();
    type Token = u32;

    fn load_model(&self, _: &Path, _: &ModelParams) -> Result<(), BackendError> {
        Ok(())
    }
    fn create_context(&self, _: &(), _: &ContextParams) -> Result<(), BackendError> {
        Ok(())
    }
    fn load_projector(&self, _: &(), _: &Path, _: &ProjectorParams) -> Result<(), BackendError> {
        Ok(())
    }
    fn build_sampler(&self, _: &SamplerConfig) -> Result<Counter, BackendError> {
        Ok(Counter(0))
    }
    fn supports_vision(&self, _: &()) -> bool {
        true
    }
    fn has_chat_template(&self, _: &()) -> bool {
        true
    }
    fn apply_chat_template(&self, _: &(), messages: &[ChatMessage], _: bool) -> Result<String, BackendError> {
        Ok(messages.iter().map(|m| m.content.as_str()).collect())
    }
    fn media_marker(&self) -> String {
        "<__media__>".into()
    }
    fn create_bitmap(&self, _: &Frame<'_>) -> Result<(), BackendError> {
        Ok(())
    }
    fn tokenize(&self, _: &(), _: &TokenizeText, _: &[&()]) -> Result<(), BackendError> {
        Ok(())
    }
    fn chunk_tokens(&self, _: &()) -> usize {
        0
    }
    fn clear_memory(&self, _: &mut ()) {}
    fn eval_chunks(&self, _: &(), _: &mut (), _: &(), _: &EvalParams) -> Result<i32, BackendError> {
        Ok(64)
    }
    fn sample(&self, sampler: &mut Counter, _: &()) -> u32 {
        sampler.0 += 1;
        sampler.0
    }
    fn is_end_of_generation(&self, _: &(), token: u32) -> bool {
        token > self.len
    }
    fn token_to_piece(&self, _: &(), _: u32, _: usize) -> Result<Vec<u8>, BackendError> {
        Ok(b"tok ".to_vec())
    }
    fn decode_token(&self, _: &mut (), _: u32, _: i32) -> Result<(), BackendError> {
        Ok(())
    }
}

struct CountingSink(usize);

impl TokenSink for CountingSink {
    fn on_token(&mut self, fragment: &str) {
        self.0 += fragment.len();
    }
    fn on_complete(&mut self, _: &str) {}
    fn on_error(&mut self, _: &str) {}
}

fn session(len: u32, dir: &tempfile::TempDir) -> VisionSession<NopBackend> {
    let model = dir.path().join("model.gguf");
    let projector = dir.path().join("mmproj.gguf");
    std::fs::write(&model, b"GGUF").unwrap();
    std::fs::write(&projector, b"GGUF").unwrap();
    VisionSession::load(NopBackend { len }, SessionConfig::default(), &model, &projector).unwrap()
}

fn bench_blocking_call(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let rgb = vec![0u8; 8 * 8 * 3];
    let mut group = c.benchmark_group("describe_image");

    for len in [16u32, 128, 400] {
        let mut s = session(len, &dir);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_function(BenchmarkId::new("tokens", len), |b| {
            b.iter(|| black_box(s.describe_image(Frame::new(&rgb, 8, 8), "Describe").unwrap()))
        });
    }
    group.finish();
}

fn bench_streaming_call(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let rgb: Vec<Vec<u8>> = (0..3).map(|_| vec![0u8; 8 * 8 * 3]).collect();
    let frames: Vec<Frame<'_>> = rgb.iter().map(|b| Frame::new(b, 8, 8)).collect();
    let mut s = session(400, &dir);

    let mut group = c.benchmark_group("describe_frames_streaming");
    group.throughput(Throughput::Elements(400));
    group.bench_function("3_frames_400_tokens", |b| {
        b.iter(|| {
            let mut sink = CountingSink(0);
            s.describe_frames_streaming(&frames, "Summarize", &mut sink).unwrap();
            black_box(sink.0)
        })
    });
    group.finish();
}

fn bench_frame_preparation(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_preparation");

    for (name, w, h) in [("640x480", 640u32, 480u32), ("1920x1080", 1920, 1080)] {
        let argb: Vec<u32> = (0..w * h).map(|i| 0xFF00_0000 | i).collect();
        group.throughput(Throughput::Elements((w * h) as u64));
        group.bench_function(BenchmarkId::new("argb", name), |b| {
            b.iter(|| black_box(PreparedFrame::from_argb(&argb, w, h).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_blocking_call, bench_streaming_call, bench_frame_preparation);
criterion_main!(benches);
