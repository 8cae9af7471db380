// Copyright 2024-2026 VisionAI CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error codes and thread-local last-error message for the C API.

use std::cell::RefCell;
use std::ffi::{c_char, CString};

use crate::engine::InferenceError;

/// Result code returned by every fallible C API function.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisionErrorCode {
    Ok = 0,
    NullPointer = -1,
    InvalidParams = -2,
    ModelNotFound = -3,
    ModelLoadFailed = -4,
    ContextCreateFailed = -5,
    ProjectorLoadFailed = -6,
    SessionNotReady = -7,
    TokenizeFailed = -8,
    EvalFailed = -9,
    Internal = -99,
}

impl From<&InferenceError> for VisionErrorCode {
    fn from(e: &InferenceError) -> Self {
        match e {
            InferenceError::ModelNotFound(_) | InferenceError::ProjectorNotFound(_) => {
                Self::ModelNotFound
            }
            InferenceError::ModelLoad(_) => Self::ModelLoadFailed,
            InferenceError::ContextCreate(_) => Self::ContextCreateFailed,
            InferenceError::ProjectorLoad(_) => Self::ProjectorLoadFailed,
            InferenceError::SessionNotReady => Self::SessionNotReady,
            InferenceError::InvalidFrame { .. } | InferenceError::InvalidConfig(_) => {
                Self::InvalidParams
            }
            InferenceError::Tokenization(_) => Self::TokenizeFailed,
            InferenceError::Evaluation(_) => Self::EvalFailed,
            InferenceError::SamplerInit(_) => Self::Internal,
        }
    }
}

impl From<InferenceError> for VisionErrorCode {
    fn from(e: InferenceError) -> Self {
        set_last_error(e.to_string());
        Self::from(&e)
    }
}

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Store a message for `visionai_get_last_error` on this thread.
pub(crate) fn set_last_error(msg: impl Into<String>) {
    let msg = msg.into().replace('\0', " ");
    let c = CString::new(msg).ok();
    LAST_ERROR.with(|e| *e.borrow_mut() = c);
}

/// Last error message on the calling thread, or null.
///
/// The pointer stays valid until the next failing call or
/// `visionai_clear_last_error` on the same thread.
#[no_mangle]
pub extern "C" fn visionai_get_last_error() -> *const c_char {
    LAST_ERROR.with(|e| e.borrow().as_ref().map_or(std::ptr::null(), |s| s.as_ptr()))
}

/// Clear the calling thread's last error.
#[no_mangle]
pub extern "C" fn visionai_clear_last_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = None);
}
