//! Native engine facade
//!
//! [`NativeEngine`] drives the C ABI of `onig-bridge-native` through a table of
//! function pointers. The table is filled either from a dynamically loaded
//! artifact or, with the `linked` feature, from the statically linked crate.
//! Either way an engine is only reachable through the [`loader`](crate::loader)
//! gate once it reports `Loaded`. Offsets at this level are UTF-8 bytes.
//!
//! # Handle contract
//!
//! Handles are released explicitly and exactly once, through the engine that
//! created them. Releasing through another engine, or using a handle rebuilt
//! with `from_raw` after release, is undefined behavior at the native boundary
//! and is not checked here.

use std::ffi::CStr;
use std::fmt;
use std::os::raw::{c_char, c_void};
use std::path::Path;
use std::ptr::{self, NonNull};
use std::slice;

use libloading::Library;
use onig_bridge_sys::{
    symbols, AbiVersionFn, CaptureBuffer, CompileFn, CreateStringFn, FreeCapturesFn, FreeErrorFn,
    FreeRegexFn, FreeStringFn, SearchFn, SearchStringFn, ABI_VERSION, SEARCH_MATCHED,
    SEARCH_NO_MATCH,
};
use tracing::{debug, trace};

use crate::capture::MatchResult;
use crate::error::{BridgeError, Result};

/// Anchor controls for a search; both permissive by default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// When false, `\G` (start of this search) never succeeds
    pub begin_position: bool,
    /// When false, `\A` (start of string) never succeeds
    pub begin_string: bool,
}

impl SearchOptions {
    pub const fn new() -> Self {
        Self {
            begin_position: true,
            begin_string: true,
        }
    }

    /// Enable/disable the `\G` anchor
    pub fn begin_position(mut self, allowed: bool) -> Self {
        self.begin_position = allowed;
        self
    }

    /// Enable/disable the `\A` anchor
    pub fn begin_string(mut self, allowed: bool) -> Self {
        self.begin_string = allowed;
        self
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Owned reference to a compiled pattern in native memory
#[derive(Debug)]
pub struct PatternHandle {
    raw: NonNull<c_void>,
}

/// Owned reference to an interned UTF-8 text in native memory
#[derive(Debug)]
pub struct TextHandle {
    raw: NonNull<c_void>,
    len: usize,
}

// Handles may move between threads; sharing one needs external locking.
unsafe impl Send for PatternHandle {}
unsafe impl Send for TextHandle {}

impl PatternHandle {
    pub fn as_ptr(&self) -> *const c_void {
        self.raw.as_ptr()
    }

    /// Give up ownership without releasing
    pub fn into_raw(self) -> *mut c_void {
        self.raw.as_ptr()
    }

    /// Take ownership of a pointer returned by `into_raw`
    ///
    /// # Safety
    /// `raw` must come from [`PatternHandle::into_raw`] and must not be owned
    /// by any other handle.
    pub unsafe fn from_raw(raw: *mut c_void) -> Option<Self> {
        NonNull::new(raw).map(|raw| Self { raw })
    }
}

impl TextHandle {
    pub fn as_ptr(&self) -> *const c_void {
        self.raw.as_ptr()
    }

    /// Length of the interned text in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Give up ownership without releasing, returning the pointer and length
    pub fn into_raw(self) -> (*mut c_void, usize) {
        (self.raw.as_ptr(), self.len)
    }

    /// Take ownership of a pointer returned by `into_raw`
    ///
    /// # Safety
    /// `raw` and `len` must come from [`TextHandle::into_raw`] and the pointer
    /// must not be owned by any other handle.
    pub unsafe fn from_raw(raw: *mut c_void, len: usize) -> Option<Self> {
        NonNull::new(raw).map(|raw| Self { raw, len })
    }
}

#[derive(Clone, Copy)]
struct EngineApi {
    compile: CompileFn,
    free_regex: FreeRegexFn,
    create_string: CreateStringFn,
    free_string: FreeStringFn,
    search: SearchFn,
    search_string: SearchStringFn,
    free_captures: FreeCapturesFn,
    free_error: FreeErrorFn,
}

impl EngineApi {
    /// Resolve every export from an opened artifact.
    ///
    /// The pointers stay valid only while `library` is loaded.
    unsafe fn resolve(library: &Library) -> std::result::Result<Self, libloading::Error> {
        Ok(Self {
            compile: *library.get::<CompileFn>(symbols::COMPILE)?,
            free_regex: *library.get::<FreeRegexFn>(symbols::FREE_REGEX)?,
            create_string: *library.get::<CreateStringFn>(symbols::CREATE_STRING)?,
            free_string: *library.get::<FreeStringFn>(symbols::FREE_STRING)?,
            search: *library.get::<SearchFn>(symbols::SEARCH)?,
            search_string: *library.get::<SearchStringFn>(symbols::SEARCH_STRING)?,
            free_captures: *library.get::<FreeCapturesFn>(symbols::FREE_CAPTURES)?,
            free_error: *library.get::<FreeErrorFn>(symbols::FREE_ERROR)?,
        })
    }

    #[cfg(feature = "linked")]
    fn linked() -> Self {
        use onig_bridge_native as native;

        Self {
            compile: native::onig_bridge_compile,
            free_regex: native::onig_bridge_free_regex,
            create_string: native::onig_bridge_create_string,
            free_string: native::onig_bridge_free_string,
            search: native::onig_bridge_search,
            search_string: native::onig_bridge_search_string,
            free_captures: native::onig_bridge_free_captures,
            free_error: native::onig_bridge_free_error,
        }
    }
}

/// Matching facade over the native engine
pub struct NativeEngine {
    api: EngineApi,
    // Keeps the artifact mapped for as long as `api` is reachable
    library: Option<Library>,
}

impl fmt::Debug for NativeEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeEngine")
            .field("dynamic", &self.library.is_some())
            .finish()
    }
}

impl NativeEngine {
    /// Open an artifact, check its ABI version and resolve its exports.
    ///
    /// This performs the native load; callers go through the loader so that
    /// it happens once per process.
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let library = unsafe { Library::new(path) }
            .map_err(|err| BridgeError::load_failure(path, err))?;

        let version = unsafe {
            let version = library
                .get::<AbiVersionFn>(symbols::ABI_VERSION)
                .map_err(|err| BridgeError::load_failure(path, err))?;
            version()
        };
        if version != ABI_VERSION {
            return Err(BridgeError::load_failure(
                path,
                format!("ABI version {version}, expected {ABI_VERSION}"),
            ));
        }

        let api = unsafe { EngineApi::resolve(&library) }
            .map_err(|err| BridgeError::load_failure(path, err))?;
        debug!(path = %path.display(), abi = version, "Resolved native engine exports");

        Ok(Self {
            api,
            library: Some(library),
        })
    }

    /// Engine backed by the statically linked native crate.
    ///
    /// Handed out only through the loader's gate, see
    /// [`ensure_loaded_linked`](crate::loader::ensure_loaded_linked).
    #[cfg(feature = "linked")]
    pub(crate) fn linked() -> Self {
        Self {
            api: EngineApi::linked(),
            library: None,
        }
    }

    /// Compile a pattern
    ///
    /// # Errors
    /// [`BridgeError::Compile`] with the engine's diagnostic text.
    pub fn compile(&self, pattern: &[u8]) -> Result<PatternHandle> {
        let mut error = ptr::null_mut();
        let raw = unsafe { (self.api.compile)(pattern.as_ptr(), pattern.len(), &mut error) };
        match NonNull::new(raw) {
            Some(raw) => Ok(PatternHandle { raw }),
            None => {
                let message = self.take_error(error);
                debug!(error = %message, "Pattern rejected");
                Err(BridgeError::Compile(message))
            }
        }
    }

    /// Release a compiled pattern
    pub fn release(&self, handle: PatternHandle) {
        unsafe { (self.api.free_regex)(handle.into_raw()) }
    }

    /// Copy `text` into native memory for repeated searches
    pub fn intern_text(&self, text: &str) -> Result<TextHandle> {
        let mut error = ptr::null_mut();
        let raw = unsafe { (self.api.create_string)(text.as_ptr(), text.len(), &mut error) };
        match NonNull::new(raw) {
            Some(raw) => Ok(TextHandle {
                raw,
                len: text.len(),
            }),
            None => Err(BridgeError::Native(self.take_error(error))),
        }
    }

    /// Release an interned text
    pub fn release_text(&self, handle: TextHandle) {
        let (raw, _) = handle.into_raw();
        unsafe { (self.api.free_string)(raw) }
    }

    /// Leftmost-first search of `text` starting at `byte_offset`.
    ///
    /// Returns `Ok(None)` when the end of text is reached without a match.
    pub fn search(
        &self,
        pattern: &PatternHandle,
        text: &str,
        byte_offset: usize,
        options: SearchOptions,
    ) -> Result<Option<MatchResult>> {
        check_offset(byte_offset, text.len())?;
        let mut buffer = CaptureBuffer::empty();
        let mut error = ptr::null_mut();
        let status = unsafe {
            (self.api.search)(
                pattern.as_ptr(),
                text.as_ptr(),
                text.len(),
                byte_offset,
                options.begin_position,
                options.begin_string,
                &mut buffer,
                &mut error,
            )
        };
        self.collect(status, buffer, error)
    }

    /// Same as [`search`](Self::search) over an interned text
    pub fn search_text(
        &self,
        pattern: &PatternHandle,
        text: &TextHandle,
        byte_offset: usize,
        options: SearchOptions,
    ) -> Result<Option<MatchResult>> {
        check_offset(byte_offset, text.len())?;
        let mut buffer = CaptureBuffer::empty();
        let mut error = ptr::null_mut();
        let status = unsafe {
            (self.api.search_string)(
                pattern.as_ptr(),
                text.as_ptr(),
                byte_offset,
                options.begin_position,
                options.begin_string,
                &mut buffer,
                &mut error,
            )
        };
        self.collect(status, buffer, error)
    }

    fn collect(
        &self,
        status: i32,
        mut buffer: CaptureBuffer,
        error: *mut c_char,
    ) -> Result<Option<MatchResult>> {
        match status {
            SEARCH_MATCHED => {
                let result = if buffer.offsets.is_null() {
                    MatchResult::default()
                } else {
                    let offsets = unsafe { slice::from_raw_parts(buffer.offsets, buffer.len) };
                    MatchResult::from_flat(offsets)
                };
                unsafe { (self.api.free_captures)(&mut buffer) };
                trace!(captures = result.len(), "Search matched");
                Ok(Some(result))
            }
            SEARCH_NO_MATCH => Ok(None),
            _ => Err(BridgeError::Native(self.take_error(error))),
        }
    }

    fn take_error(&self, error: *mut c_char) -> String {
        if error.is_null() {
            return "unknown native error".to_string();
        }
        let message = unsafe { CStr::from_ptr(error) }.to_string_lossy().into_owned();
        unsafe { (self.api.free_error)(error) };
        message
    }
}

fn check_offset(offset: usize, len: usize) -> Result<()> {
    if offset > len {
        Err(BridgeError::OffsetOutOfBounds { offset, len })
    } else {
        Ok(())
    }
}
