// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Session lifecycle and inference functions for FFI.

use std::ffi::{c_char, c_void, CStr, CString};
use std::path::Path;

use parking_lot::Mutex;
use tracing::warn;

use super::error::{set_last_error, VisionErrorCode};
use crate::engine::{
    Frame, GgufSession, InferenceError, LlamaCppBackend, SessionConfig, TokenSink, VisionSession,
};

/// Opaque session handle owned by the caller between `visionai_load_model`
/// and `visionai_free_model`. Calls on one handle are serialized.
pub struct VisionSessionHandle {
    inner: Mutex<GgufSession>,
}

/// One packed RGB frame (`width * height * 3` bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VisionFrame {
    pub rgb: *const u8,
    pub rgb_len: usize,
    pub width: u32,
    pub height: u32,
}

/// Streaming notifications. `on_token` fires per fragment; exactly one of
/// `on_complete` or `on_error` fires last. Strings are valid only for the
/// duration of the callback.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VisionTokenCallbacks {
    pub user_data: *mut c_void,
    pub on_token: Option<unsafe extern "C" fn(user_data: *mut c_void, token: *const c_char)>,
    pub on_complete: Option<unsafe extern "C" fn(user_data: *mut c_void, full_text: *const c_char)>,
    pub on_error: Option<unsafe extern "C" fn(user_data: *mut c_void, message: *const c_char)>,
}

/// Forwards sink notifications to C callbacks.
struct CallbackSink {
    callbacks: VisionTokenCallbacks,
}

impl CallbackSink {
    fn emit(
        &self,
        f: Option<unsafe extern "C" fn(*mut c_void, *const c_char)>,
        text: &str,
    ) {
        let Some(f) = f else { return };
        let c = to_c_string(text);
        // SAFETY: the caller guaranteed the callbacks and user_data are valid
        // for the duration of the streaming call.
        unsafe { f(self.callbacks.user_data, c.as_ptr()) };
    }
}

impl TokenSink for CallbackSink {
    fn on_token(&mut self, fragment: &str) {
        self.emit(self.callbacks.on_token, fragment);
    }

    fn on_complete(&mut self, full_text: &str) {
        self.emit(self.callbacks.on_complete, full_text);
    }

    fn on_error(&mut self, message: &str) {
        self.emit(self.callbacks.on_error, message);
    }
}

fn to_c_string(text: &str) -> CString {
    CString::new(text.replace('\0', "")).unwrap_or_default()
}

unsafe fn read_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, VisionErrorCode> {
    CStr::from_ptr(ptr).to_str().map_err(|_| {
        set_last_error(format!("invalid UTF-8 in {what}"));
        VisionErrorCode::InvalidParams
    })
}

unsafe fn read_frames<'a>(
    frames: *const VisionFrame,
    n_frames: usize,
) -> Result<Vec<Frame<'a>>, VisionErrorCode> {
    if n_frames == 0 {
        set_last_error("no frames supplied");
        return Err(VisionErrorCode::InvalidParams);
    }
    let raw = std::slice::from_raw_parts(frames, n_frames);
    let mut out = Vec::with_capacity(n_frames);
    for (i, f) in raw.iter().enumerate() {
        if f.rgb.is_null() {
            set_last_error(format!("frame {i} has a null buffer"));
            return Err(VisionErrorCode::NullPointer);
        }
        out.push(Frame::new(std::slice::from_raw_parts(f.rgb, f.rgb_len), f.width, f.height));
    }
    Ok(out)
}

fn boundary_config(n_threads: i32, n_ctx: i32) -> Result<SessionConfig, VisionErrorCode> {
    if n_threads < 0 || n_ctx <= 0 {
        set_last_error(format!("invalid thread count {n_threads} or context length {n_ctx}"));
        return Err(VisionErrorCode::InvalidParams);
    }
    let mut cfg = match crate::config::load() {
        Ok(env) => env.session,
        Err(e) => {
            warn!(error = %e, "ignoring config file");
            SessionConfig::default()
        }
    };
    cfg.context.n_threads = n_threads as u32;
    cfg.projector.n_threads = n_threads as u32;
    cfg.context.n_ctx = n_ctx as u32;
    Ok(cfg)
}

fn finish(
    result: Result<crate::engine::GenerationResult, InferenceError>,
    out_text: *mut *mut c_char,
) -> VisionErrorCode {
    match result {
        Ok(generation) => {
            if !out_text.is_null() {
                // SAFETY: checked non-null; the caller owns the slot.
                unsafe { *out_text = to_c_string(&generation.text).into_raw() };
            }
            VisionErrorCode::Ok
        }
        Err(e) => e.into(),
    }
}

/// Load model, context, projector and sampler into a new session.
///
/// `n_threads` of 0 picks a count for this machine.
#[no_mangle]
pub unsafe extern "C" fn visionai_load_model(
    model_path: *const c_char,
    projector_path: *const c_char,
    n_threads: i32,
    n_ctx: i32,
    out_session: *mut *mut VisionSessionHandle,
) -> VisionErrorCode {
    if model_path.is_null() || projector_path.is_null() || out_session.is_null() {
        set_last_error("null pointer argument");
        return VisionErrorCode::NullPointer;
    }
    let model = match read_str(model_path, "model_path") {
        Ok(s) => s,
        Err(code) => return code,
    };
    let projector = match read_str(projector_path, "projector_path") {
        Ok(s) => s,
        Err(code) => return code,
    };
    let config = match boundary_config(n_threads, n_ctx) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match VisionSession::load(LlamaCppBackend::new(), config, Path::new(model), Path::new(projector)) {
        Ok(session) => {
            let handle = Box::new(VisionSessionHandle { inner: Mutex::new(session) });
            *out_session = Box::into_raw(handle);
            VisionErrorCode::Ok
        }
        Err(e) => e.into(),
    }
}

/// Describe one RGB frame. On success `*out_text` receives a string to be
/// freed with `visionai_free_string`.
#[no_mangle]
pub unsafe extern "C" fn visionai_run_inference(
    session: *mut VisionSessionHandle,
    frame: *const VisionFrame,
    prompt: *const c_char,
    out_text: *mut *mut c_char,
) -> VisionErrorCode {
    visionai_run_video_inference(session, frame, 1, prompt, out_text)
}

/// Describe an ordered set of RGB frames.
#[no_mangle]
pub unsafe extern "C" fn visionai_run_video_inference(
    session: *mut VisionSessionHandle,
    frames: *const VisionFrame,
    n_frames: usize,
    prompt: *const c_char,
    out_text: *mut *mut c_char,
) -> VisionErrorCode {
    if session.is_null() {
        return InferenceError::SessionNotReady.into();
    }
    if frames.is_null() || prompt.is_null() || out_text.is_null() {
        set_last_error("null pointer argument");
        return VisionErrorCode::NullPointer;
    }
    let prompt = match read_str(prompt, "prompt") {
        Ok(s) => s,
        Err(code) => return code,
    };
    let frames = match read_frames(frames, n_frames) {
        Ok(f) => f,
        Err(code) => return code,
    };
    let mut guard = (*session).inner.lock();
    finish(guard.describe_frames(&frames, prompt), out_text)
}

/// Streaming variant of `visionai_run_inference`.
#[no_mangle]
pub unsafe extern "C" fn visionai_run_inference_streaming(
    session: *mut VisionSessionHandle,
    frame: *const VisionFrame,
    prompt: *const c_char,
    callbacks: *const VisionTokenCallbacks,
) -> VisionErrorCode {
    visionai_run_video_inference_streaming(session, frame, 1, prompt, callbacks)
}

/// Streaming variant of `visionai_run_video_inference`. Fragments go to
/// `on_token`; the full text goes to `on_complete`. Tokenize and evaluate
/// failures go to `on_error` and are also returned as a code.
#[no_mangle]
pub unsafe extern "C" fn visionai_run_video_inference_streaming(
    session: *mut VisionSessionHandle,
    frames: *const VisionFrame,
    n_frames: usize,
    prompt: *const c_char,
    callbacks: *const VisionTokenCallbacks,
) -> VisionErrorCode {
    if session.is_null() {
        return InferenceError::SessionNotReady.into();
    }
    if frames.is_null() || prompt.is_null() || callbacks.is_null() {
        set_last_error("null pointer argument");
        return VisionErrorCode::NullPointer;
    }
    let prompt = match read_str(prompt, "prompt") {
        Ok(s) => s,
        Err(code) => return code,
    };
    let frames = match read_frames(frames, n_frames) {
        Ok(f) => f,
        Err(code) => return code,
    };
    let mut sink = CallbackSink { callbacks: *callbacks };
    let mut guard = (*session).inner.lock();
    finish(guard.describe_frames_streaming(&frames, prompt, &mut sink), std::ptr::null_mut())
}

/// Release every native handle and free the session. Null is a no-op.
#[no_mangle]
pub unsafe extern "C" fn visionai_free_model(session: *mut VisionSessionHandle) {
    if session.is_null() {
        return;
    }
    let handle = Box::from_raw(session);
    handle.inner.lock().release();
}

/// Free a string returned by this library. Null is a no-op.
#[no_mangle]
pub unsafe extern "C" fn visionai_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
