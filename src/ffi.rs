//! FFI bindings for Neuromode
//!
//! This module provides C-compatible functions for calling the engine from a
//! dashboard written in another language. All functions use C strings
//! (null-terminated) and return allocated memory that must be freed by the
//! caller using `neuromode_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::engine::{snapshots_to_results, ModeEngine};
use crate::window::DEFAULT_WINDOW_SIZE;

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
        Err(_) => ptr::null_mut(),
    }
}

/// Join already-serialized JSON values into a JSON array
fn vec_to_json_array(vec: Vec<String>) -> String {
    format!("[{}]", vec.join(","))
}

// ============================================================================
// Stateless API
// ============================================================================

/// Run a JSON array of snapshots through a fresh engine and return a JSON
/// array of results.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `neuromode_free_string`.
/// - Returns NULL on error; call `neuromode_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn neuromode_process_snapshots(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match snapshots_to_results(json_str) {
        Ok(results) => string_to_cstr(&vec_to_json_array(results)),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful API
// ============================================================================

/// Opaque handle to a per-session engine
pub struct ModeEngineHandle {
    engine: ModeEngine,
}

/// Create a new engine.
///
/// # Arguments
/// * `window_size` - Snapshots to average over (0 uses the default of 6)
///
/// # Safety
/// - Returns a pointer that must be freed with `neuromode_engine_free`.
#[no_mangle]
pub unsafe extern "C" fn neuromode_engine_new(window_size: i32) -> *mut ModeEngineHandle {
    let window = if window_size <= 0 {
        DEFAULT_WINDOW_SIZE
    } else {
        window_size as usize
    };

    let handle = Box::new(ModeEngineHandle {
        engine: ModeEngine::with_window(window),
    });
    Box::into_raw(handle)
}

/// Free an engine.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `neuromode_engine_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn neuromode_engine_free(engine: *mut ModeEngineHandle) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// Push one snapshot JSON and return the result JSON.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `neuromode_engine_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `neuromode_free_string`.
/// - Returns NULL on error; call `neuromode_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn neuromode_engine_push_snapshot(
    engine: *mut ModeEngineHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }

    let handle = &mut *engine;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match handle.engine.process_json(&json_str) {
        Ok(result) => string_to_cstr(&result),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Merge a partial baseline update given as JSON.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `neuromode_engine_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
#[no_mangle]
pub unsafe extern "C" fn neuromode_engine_update_baselines(
    engine: *mut ModeEngineHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }

    let handle = &mut *engine;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    match handle.engine.update_baselines_json(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Save engine baselines to JSON.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `neuromode_engine_new`.
/// - Returns a newly allocated string that must be freed with `neuromode_free_string`.
/// - Returns NULL on error; call `neuromode_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn neuromode_engine_save_baselines(
    engine: *mut ModeEngineHandle,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }

    let handle = &*engine;

    match handle.engine.save_baselines() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Load engine baselines from JSON produced by `neuromode_engine_save_baselines`.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `neuromode_engine_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
#[no_mangle]
pub unsafe extern "C" fn neuromode_engine_load_baselines(
    engine: *mut ModeEngineHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }

    let handle = &mut *engine;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    match handle.engine.load_baselines(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Neuromode functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Neuromode function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn neuromode_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Neuromode call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn neuromode_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Neuromode library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn neuromode_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
