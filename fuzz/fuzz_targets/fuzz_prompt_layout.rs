// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for user-message layout.

#![no_main]

use libfuzzer_sys::fuzz_target;
use visionai_core::engine::prompt::{user_content, CallKind};

const MARKER: &str = "<__media__>";

fuzz_target!(|data: (u8, &str)| {
    let (frames, prompt) = data;
    let kind = CallKind::for_frames(usize::from(frames % 8).max(1));
    let content = user_content(kind, MARKER, prompt);
    let markers = content.matches(MARKER).count() - prompt.matches(MARKER).count();
    assert_eq!(markers, kind.frame_count());
});
