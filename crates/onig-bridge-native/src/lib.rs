#![allow(clippy::missing_safety_doc)]

//! # onig-bridge-native
//!
//! The per-platform native artifact: Oniguruma behind the C ABI defined in
//! `onig-bridge-sys`.
//!
//! Every export contains panics and reports failures through the `char** error`
//! out-parameter instead of unwinding into the caller. Handles are boxed Rust
//! values leaked as `void*`; each free function must receive a pointer produced
//! by its matching constructor, exactly once.

pub mod error;
pub mod search;

use std::ffi::CString;
use std::os::raw::{c_char, c_void};
use std::panic::{self, UnwindSafe};
use std::{ptr, slice, str};

use onig::Regex;
use onig_bridge_sys::{CaptureBuffer, ABI_VERSION, SEARCH_ERROR, SEARCH_MATCHED, SEARCH_NO_MATCH};

pub use error::{NativeError, Result};

#[no_mangle]
pub extern "C" fn onig_bridge_abi_version() -> u32 {
    ABI_VERSION
}

#[no_mangle]
pub unsafe extern "C" fn onig_bridge_compile(
    pattern: *const u8,
    len: usize,
    error: *mut *mut c_char,
) -> *mut c_void {
    guard(error, ptr::null_mut(), || {
        let pattern = bytes(pattern, len, "pattern")?;
        let regex = search::compile(pattern)?;
        Ok(Box::into_raw(Box::new(regex)) as *mut c_void)
    })
}

#[no_mangle]
pub unsafe extern "C" fn onig_bridge_free_regex(regex: *mut c_void) {
    // Restore the exact owned type that was leaked
    free::<Regex>(regex);
}

#[no_mangle]
pub unsafe extern "C" fn onig_bridge_create_string(
    utf8: *const u8,
    len: usize,
    error: *mut *mut c_char,
) -> *mut c_void {
    guard(error, ptr::null_mut(), || {
        let text = str::from_utf8(bytes(utf8, len, "text")?)?.to_string();
        Ok(Box::into_raw(Box::new(text)) as *mut c_void)
    })
}

#[no_mangle]
pub unsafe extern "C" fn onig_bridge_free_string(text: *mut c_void) {
    free::<String>(text);
}

#[no_mangle]
pub unsafe extern "C" fn onig_bridge_search(
    regex: *const c_void,
    text: *const u8,
    len: usize,
    byte_offset: usize,
    begin_position: bool,
    begin_string: bool,
    out: *mut CaptureBuffer,
    error: *mut *mut c_char,
) -> i32 {
    guard(error, SEARCH_ERROR, || {
        let regex = regex_ref(regex)?;
        let text = str::from_utf8(bytes(text, len, "text")?)?;
        let found = search::search(regex, text, byte_offset, begin_position, begin_string)?;
        write_captures(out, found)
    })
}

#[no_mangle]
pub unsafe extern "C" fn onig_bridge_search_string(
    regex: *const c_void,
    text: *const c_void,
    byte_offset: usize,
    begin_position: bool,
    begin_string: bool,
    out: *mut CaptureBuffer,
    error: *mut *mut c_char,
) -> i32 {
    guard(error, SEARCH_ERROR, || {
        let regex = regex_ref(regex)?;
        if text.is_null() {
            return Err(NativeError::NullPointer("text handle"));
        }
        let text = &*(text as *const String);
        let found = search::search(regex, text, byte_offset, begin_position, begin_string)?;
        write_captures(out, found)
    })
}

#[no_mangle]
pub unsafe extern "C" fn onig_bridge_free_captures(captures: *mut CaptureBuffer) {
    if captures.is_null() {
        return;
    }
    let captures = &mut *captures;
    if !captures.offsets.is_null() {
        let offsets = ptr::slice_from_raw_parts_mut(captures.offsets, captures.len);
        drop(Box::<[i32]>::from_raw(offsets));
    }
    *captures = CaptureBuffer::empty();
}

#[no_mangle]
pub unsafe extern "C" fn onig_bridge_free_error(message: *mut c_char) {
    if !message.is_null() {
        drop(CString::from_raw(message));
    }
}

unsafe fn free<T>(ptr: *mut c_void) {
    if !ptr.is_null() {
        drop(Box::<T>::from_raw(ptr as *mut T));
    }
}

unsafe fn regex_ref<'a>(regex: *const c_void) -> Result<&'a Regex> {
    if regex.is_null() {
        return Err(NativeError::NullPointer("pattern handle"));
    }
    Ok(&*(regex as *const Regex))
}

// A zero-length input may legitimately come with a dangling or null pointer.
unsafe fn bytes<'a>(data: *const u8, len: usize, what: &'static str) -> Result<&'a [u8]> {
    if len == 0 {
        return Ok(&[]);
    }
    if data.is_null() {
        return Err(NativeError::NullPointer(what));
    }
    Ok(slice::from_raw_parts(data, len))
}

unsafe fn write_captures(out: *mut CaptureBuffer, found: Option<Vec<i32>>) -> Result<i32> {
    let Some(offsets) = found else {
        return Ok(SEARCH_NO_MATCH);
    };
    if out.is_null() {
        return Err(NativeError::NullPointer("capture buffer"));
    }
    let offsets = offsets.into_boxed_slice();
    let len = offsets.len();
    *out = CaptureBuffer {
        offsets: Box::into_raw(offsets) as *mut i32,
        len,
    };
    Ok(SEARCH_MATCHED)
}

// Runs `f`, turning both errors and panics into a message in `*error`.
fn guard<T>(error: *mut *mut c_char, fallback: T, f: impl FnOnce() -> Result<T> + UnwindSafe) -> T {
    let outcome = panic::catch_unwind(f).unwrap_or_else(|payload| Err(NativeError::from_panic(payload)));
    match outcome {
        Ok(value) => value,
        Err(err) => {
            report(error, &err);
            fallback
        }
    }
}

fn report(error: *mut *mut c_char, err: &NativeError) {
    if error.is_null() {
        return;
    }
    let message = err.to_string().replace('\0', " ");
    if let Ok(message) = CString::new(message) {
        unsafe { *error = message.into_raw() };
    }
}
