// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Host-side frame preparation: pixel packing, downscaling, and video frame
//! sampling, done before frames are handed to a session.

use thiserror::Error;

use super::input::{Frame, RGB_CHANNELS};

/// Longest side a frame is scaled to before inference.
pub const FRAME_MAX_DIM: u32 = 512;

/// Frames sampled from a video clip.
pub const VIDEO_NUM_FRAMES: usize = 3;

/// Span of a clip that frames are sampled from, in milliseconds.
pub const VIDEO_DURATION_MS: u64 = 3000;

/// Errors from frame preparation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("zero dimension {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    #[error("buffer is {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// Dimensions after fitting `width x height` inside `max_dim`, preserving
/// aspect ratio. Frames already within bounds are unchanged. Scaled sides are
/// truncated, never below 1.
pub fn scaled_dims(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    if width <= max_dim && height <= max_dim {
        return (width, height);
    }
    let scale = max_dim as f32 / width.max(height) as f32;
    let w = ((width as f32 * scale) as u32).max(1);
    let h = ((height as f32 * scale) as u32).max(1);
    (w, h)
}

/// Pack `0xAARRGGBB` pixels into RGB bytes, dropping alpha.
pub fn argb_to_rgb(pixels: &[u32]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(pixels.len() * RGB_CHANNELS);
    for &p in pixels {
        rgb.push((p >> 16) as u8);
        rgb.push((p >> 8) as u8);
        rgb.push(p as u8);
    }
    rgb
}

/// Pack RGBA bytes into RGB bytes, dropping alpha. A trailing partial pixel
/// is ignored.
pub fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * RGB_CHANNELS);
    for px in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }
    rgb
}

/// Bilinear resize of a packed RGB buffer.
pub fn resize_rgb(
    rgb: &[u8],
    width: u32,
    height: u32,
    new_width: u32,
    new_height: u32,
) -> Result<Vec<u8>, FrameError> {
    check_buffer(rgb, width, height)?;
    if new_width == 0 || new_height == 0 {
        return Err(FrameError::ZeroDimension { width: new_width, height: new_height });
    }
    if new_width == width && new_height == height {
        return Ok(rgb.to_vec());
    }

    let (sw, sh) = (width as usize, height as usize);
    let (dw, dh) = (new_width as usize, new_height as usize);
    let x_ratio = sw as f32 / dw as f32;
    let y_ratio = sh as f32 / dh as f32;
    let mut out = vec![0u8; dw * dh * RGB_CHANNELS];

    for y in 0..dh {
        let fy = ((y as f32 + 0.5) * y_ratio - 0.5).max(0.0);
        let y0 = (fy as usize).min(sh - 1);
        let y1 = (y0 + 1).min(sh - 1);
        let wy = fy - y0 as f32;
        for x in 0..dw {
            let fx = ((x as f32 + 0.5) * x_ratio - 0.5).max(0.0);
            let x0 = (fx as usize).min(sw - 1);
            let x1 = (x0 + 1).min(sw - 1);
            let wx = fx - x0 as f32;
            for c in 0..RGB_CHANNELS {
                let px = |xx: usize, yy: usize| rgb[(yy * sw + xx) * RGB_CHANNELS + c] as f32;
                let top = px(x0, y0) * (1.0 - wx) + px(x1, y0) * wx;
                let bottom = px(x0, y1) * (1.0 - wx) + px(x1, y1) * wx;
                let v = top * (1.0 - wy) + bottom * wy;
                out[(y * dw + x) * RGB_CHANNELS + c] = v.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    Ok(out)
}

/// Timestamps, in microseconds, of the frames sampled from a clip.
///
/// Frames are evenly spaced across `min(duration, 3000 ms)`, starting at 0.
/// An unknown duration is treated as 3000 ms.
pub fn sample_timestamps(duration_ms: Option<u64>) -> Vec<u64> {
    let span = duration_ms.unwrap_or(VIDEO_DURATION_MS).min(VIDEO_DURATION_MS);
    let interval = span / VIDEO_NUM_FRAMES as u64;
    (0..VIDEO_NUM_FRAMES as u64).map(|i| i * interval * 1000).collect()
}

/// An owned RGB frame ready for a session call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedFrame {
    rgb: Vec<u8>,
    width: u32,
    height: u32,
}

impl PreparedFrame {
    /// Wrap an RGB buffer, downscaling it to fit `FRAME_MAX_DIM`.
    pub fn from_rgb(rgb: Vec<u8>, width: u32, height: u32) -> Result<Self, FrameError> {
        check_buffer(&rgb, width, height)?;
        let (w, h) = scaled_dims(width, height, FRAME_MAX_DIM);
        if (w, h) == (width, height) {
            return Ok(Self { rgb, width, height });
        }
        let rgb = resize_rgb(&rgb, width, height, w, h)?;
        Ok(Self { rgb, width: w, height: h })
    }

    /// From `0xAARRGGBB` pixels, as produced by most platform bitmap APIs.
    pub fn from_argb(pixels: &[u32], width: u32, height: u32) -> Result<Self, FrameError> {
        Self::from_rgb(argb_to_rgb(pixels), width, height)
    }

    /// From RGBA bytes.
    pub fn from_rgba(rgba: &[u8], width: u32, height: u32) -> Result<Self, FrameError> {
        Self::from_rgb(rgba_to_rgb(rgba), width, height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_frame(&self) -> Frame<'_> {
        Frame::new(&self.rgb, self.width, self.height)
    }

    pub fn into_rgb(self) -> Vec<u8> {
        self.rgb
    }
}

fn check_buffer(rgb: &[u8], width: u32, height: u32) -> Result<(), FrameError> {
    if width == 0 || height == 0 {
        return Err(FrameError::ZeroDimension { width, height });
    }
    let expected = width as usize * height as usize * RGB_CHANNELS;
    if rgb.len() != expected {
        return Err(FrameError::BufferSize { expected, actual: rgb.len() });
    }
    Ok(())
}
