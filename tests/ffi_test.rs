// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! C API tests that need no model files: codes, null handling, last error.

#![cfg(feature = "ffi")]

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use visionai_core::ffi::{
    visionai_clear_last_error, visionai_free_model, visionai_free_string, visionai_get_last_error,
    visionai_load_model, visionai_run_inference, visionai_run_inference_streaming,
    visionai_run_video_inference, VisionErrorCode, VisionFrame, VisionSessionHandle,
    VisionTokenCallbacks,
};

fn last_error() -> Option<String> {
    let p = visionai_get_last_error();
    if p.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(p) }.to_string_lossy().into_owned())
    }
}

#[test]
fn error_codes_have_stable_values() {
    assert_eq!(VisionErrorCode::Ok as i32, 0);
    assert_eq!(VisionErrorCode::NullPointer as i32, -1);
    assert_eq!(VisionErrorCode::InvalidParams as i32, -2);
    assert_eq!(VisionErrorCode::ModelNotFound as i32, -3);
    assert_eq!(VisionErrorCode::ModelLoadFailed as i32, -4);
    assert_eq!(VisionErrorCode::ContextCreateFailed as i32, -5);
    assert_eq!(VisionErrorCode::ProjectorLoadFailed as i32, -6);
    assert_eq!(VisionErrorCode::SessionNotReady as i32, -7);
    assert_eq!(VisionErrorCode::TokenizeFailed as i32, -8);
    assert_eq!(VisionErrorCode::EvalFailed as i32, -9);
    assert_eq!(VisionErrorCode::Internal as i32, -99);
}

#[test]
fn last_error_is_null_after_clear() {
    visionai_clear_last_error();
    assert!(visionai_get_last_error().is_null());
}

#[test]
fn load_rejects_null_paths() {
    visionai_clear_last_error();
    let mut out: *mut VisionSessionHandle = ptr::null_mut();
    let code = unsafe { visionai_load_model(ptr::null(), ptr::null(), 4, 2048, &mut out) };
    assert_eq!(code, VisionErrorCode::NullPointer);
    assert!(out.is_null());
    assert!(last_error().is_some());
}

#[test]
fn load_rejects_invalid_context_length() {
    let model = CString::new("/nonexistent/model.gguf").unwrap();
    let proj = CString::new("/nonexistent/mmproj.gguf").unwrap();
    let mut out: *mut VisionSessionHandle = ptr::null_mut();
    let code = unsafe { visionai_load_model(model.as_ptr(), proj.as_ptr(), 4, 0, &mut out) };
    assert_eq!(code, VisionErrorCode::InvalidParams);
    assert!(out.is_null());
}

#[test]
fn load_missing_model_reports_not_found() {
    visionai_clear_last_error();
    let model = CString::new("/nonexistent/model.gguf").unwrap();
    let proj = CString::new("/nonexistent/mmproj.gguf").unwrap();
    let mut out: *mut VisionSessionHandle = ptr::null_mut();
    let code = unsafe { visionai_load_model(model.as_ptr(), proj.as_ptr(), 4, 2048, &mut out) };
    assert_eq!(code, VisionErrorCode::ModelNotFound);
    assert!(out.is_null());
    assert!(last_error().unwrap().contains("Model file not found"));
}

#[test]
fn inference_on_null_session_is_not_ready() {
    visionai_clear_last_error();
    let rgb = vec![0u8; 12];
    let frame = VisionFrame { rgb: rgb.as_ptr(), rgb_len: rgb.len(), width: 2, height: 2 };
    let prompt = CString::new("Describe").unwrap();
    let mut out: *mut c_char = ptr::null_mut();

    let code = unsafe { visionai_run_inference(ptr::null_mut(), &frame, prompt.as_ptr(), &mut out) };
    assert_eq!(code, VisionErrorCode::SessionNotReady);
    assert!(out.is_null());
    assert_eq!(last_error().as_deref(), Some("Model not loaded"));

    let code = unsafe {
        visionai_run_video_inference(ptr::null_mut(), &frame, 1, prompt.as_ptr(), &mut out)
    };
    assert_eq!(code, VisionErrorCode::SessionNotReady);
}

unsafe extern "C" fn count_error(user_data: *mut std::ffi::c_void, _message: *const c_char) {
    *(user_data as *mut u32) += 1;
}

#[test]
fn streaming_on_null_session_skips_callbacks() {
    let mut errors = 0u32;
    let callbacks = VisionTokenCallbacks {
        user_data: &mut errors as *mut u32 as *mut std::ffi::c_void,
        on_token: None,
        on_complete: None,
        on_error: Some(count_error),
    };
    let rgb = vec![0u8; 12];
    let frame = VisionFrame { rgb: rgb.as_ptr(), rgb_len: rgb.len(), width: 2, height: 2 };
    let prompt = CString::new("Describe").unwrap();

    let code = unsafe {
        visionai_run_inference_streaming(ptr::null_mut(), &frame, prompt.as_ptr(), &callbacks)
    };
    assert_eq!(code, VisionErrorCode::SessionNotReady);
    assert_eq!(errors, 0);
}

#[test]
fn free_functions_accept_null() {
    unsafe {
        visionai_free_model(ptr::null_mut());
        visionai_free_string(ptr::null_mut());
    }
}
