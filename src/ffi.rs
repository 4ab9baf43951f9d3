//! FFI bindings for sleepbin
//!
//! This module provides C-compatible functions for calling sleepbin from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `sleepbin_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::AnalysisConfig;
use crate::pipeline::analyze_json;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => {
            set_last_error("Result contains an interior NUL byte");
            ptr::null_mut()
        }
    }
}

/// Run a full analysis from a JSON request and return the JSON result.
///
/// The request is an object with `cohorts`, `animals` and an optional
/// `config`; the result is the serialized analysis output.
///
/// # Safety
/// - `request_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `sleepbin_free_string`.
/// - Returns NULL on error; call `sleepbin_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepbin_analyze_json(request_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let request = match cstr_to_string(request_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid request string pointer");
            return ptr::null_mut();
        }
    };

    match analyze_json(&request) {
        Ok(output) => string_to_cstr(&output),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Return the default analysis configuration as JSON.
///
/// A non-zero `zero_based` selects the bin ladder starting at 0 seconds.
///
/// # Safety
/// - Returns a newly allocated string that must be freed with `sleepbin_free_string`.
/// - Returns NULL on error; call `sleepbin_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepbin_default_config(zero_based: i32) -> *mut c_char {
    clear_last_error();

    let config = if zero_based != 0 {
        AnalysisConfig::zero_based()
    } else {
        AnalysisConfig::default()
    };

    match config.to_json() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a static error string, or NULL if no error.
/// - The returned pointer is valid until the next sleepbin function call on the same thread.
/// - Do NOT free this pointer.
#[no_mangle]
pub unsafe extern "C" fn sleepbin_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by sleepbin functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a sleepbin function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn sleepbin_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}
