// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for frame conversion and resizing.
//!
//! Mismatched dimensions and buffers must be rejected, never panic or index
//! out of bounds.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use visionai_core::engine::frames::{resize_rgb, rgba_to_rgb};
use visionai_core::engine::PreparedFrame;

#[derive(Debug, Arbitrary)]
struct Input {
    width: u8,
    height: u8,
    new_width: u8,
    new_height: u8,
    pixels: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let (w, h) = (u32::from(input.width), u32::from(input.height));

    if let Ok(out) = resize_rgb(&input.pixels, w, h, u32::from(input.new_width), u32::from(input.new_height)) {
        assert_eq!(out.len(), input.new_width as usize * input.new_height as usize * 3);
    }

    let _ = rgba_to_rgb(&input.pixels);
    if let Ok(frame) = PreparedFrame::from_rgba(&input.pixels, w, h) {
        let view = frame.as_frame();
        assert!(view.validate(0).is_ok());
    }
    if let Ok(frame) = PreparedFrame::from_rgb(input.pixels, w, h) {
        assert!(frame.width() <= w.max(1) && frame.height() <= h.max(1));
    }
});
