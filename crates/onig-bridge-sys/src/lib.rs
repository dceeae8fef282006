//! # onig-bridge-sys
//!
//! Raw C ABI spoken between the `onig-bridge-native` artifact and the loader in
//! `onig-bridge`.
//!
//! Both sides compile against this crate, so the function-pointer types below
//! are the single source of truth for the exported signatures. Handles cross
//! the boundary as untyped pointers; the native side owns what they point to.
//!
//! ## Memory ownership
//!
//! - Pattern handles: free with `onig_bridge_free_regex`
//! - Text handles: free with `onig_bridge_free_string`
//! - Capture buffers filled by a search: free with `onig_bridge_free_captures`
//! - Error messages written through `char** error`: free with `onig_bridge_free_error`

use std::os::raw::{c_char, c_void};

/// Version of the exported ABI. Bumped on any signature change.
pub const ABI_VERSION: u32 = 1;

/// Crate name of the native artifact, before platform prefix/extension rules.
pub const LIBRARY_NAME: &str = "onig_bridge_native";

/// Search found a match; the capture buffer is populated.
pub const SEARCH_MATCHED: i32 = 1;
/// Search reached the end of text without a match.
pub const SEARCH_NO_MATCH: i32 = 0;
/// Search failed; an error message was written.
pub const SEARCH_ERROR: i32 = -1;

/// Offset reported for both ends of a group that did not participate.
pub const UNMATCHED_GROUP: i32 = -1;

/// Flat `[start0, end0, start1, end1, ...]` byte offsets of a match.
///
/// Allocated by the native library; release with `onig_bridge_free_captures`.
#[repr(C)]
#[derive(Debug)]
pub struct CaptureBuffer {
    /// Pointer to `len` offsets
    pub offsets: *mut i32,
    /// Number of `i32` values (twice the number of captures)
    pub len: usize,
}

impl CaptureBuffer {
    /// Buffer that owns nothing
    pub const fn empty() -> Self {
        Self {
            offsets: std::ptr::null_mut(),
            len: 0,
        }
    }
}

impl Default for CaptureBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

pub type AbiVersionFn = unsafe extern "C" fn() -> u32;

pub type CompileFn =
    unsafe extern "C" fn(pattern: *const u8, len: usize, error: *mut *mut c_char) -> *mut c_void;

pub type FreeRegexFn = unsafe extern "C" fn(regex: *mut c_void);

pub type CreateStringFn =
    unsafe extern "C" fn(utf8: *const u8, len: usize, error: *mut *mut c_char) -> *mut c_void;

pub type FreeStringFn = unsafe extern "C" fn(text: *mut c_void);

pub type SearchFn = unsafe extern "C" fn(
    regex: *const c_void,
    text: *const u8,
    len: usize,
    byte_offset: usize,
    begin_position: bool,
    begin_string: bool,
    out: *mut CaptureBuffer,
    error: *mut *mut c_char,
) -> i32;

pub type SearchStringFn = unsafe extern "C" fn(
    regex: *const c_void,
    text: *const c_void,
    byte_offset: usize,
    begin_position: bool,
    begin_string: bool,
    out: *mut CaptureBuffer,
    error: *mut *mut c_char,
) -> i32;

pub type FreeCapturesFn = unsafe extern "C" fn(captures: *mut CaptureBuffer);

pub type FreeErrorFn = unsafe extern "C" fn(message: *mut c_char);

/// NUL-terminated export names, ready for symbol lookup.
pub mod symbols {
    pub const ABI_VERSION: &[u8] = b"onig_bridge_abi_version\0";
    pub const COMPILE: &[u8] = b"onig_bridge_compile\0";
    pub const FREE_REGEX: &[u8] = b"onig_bridge_free_regex\0";
    pub const CREATE_STRING: &[u8] = b"onig_bridge_create_string\0";
    pub const FREE_STRING: &[u8] = b"onig_bridge_free_string\0";
    pub const SEARCH: &[u8] = b"onig_bridge_search\0";
    pub const SEARCH_STRING: &[u8] = b"onig_bridge_search_string\0";
    pub const FREE_CAPTURES: &[u8] = b"onig_bridge_free_captures\0";
    pub const FREE_ERROR: &[u8] = b"onig_bridge_free_error\0";
}
