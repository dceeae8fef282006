//! Scoped wrappers that release native resources on drop
//!
//! [`Regex`] and [`InternedText`] borrow the engine that created them, so a
//! handle can never outlive or be released through a different engine.
//! Searches through [`Regex::search`] and [`Regex::search_interned`] use
//! UTF-16 code-unit offsets on both input and output.

use crate::capture::MatchResult;
use crate::engine::{NativeEngine, PatternHandle, SearchOptions, TextHandle};
use crate::error::{BridgeError, Result};
use crate::offsets::{captures_to_char_offsets, Utf16String};

/// A compiled pattern released when dropped
#[derive(Debug)]
pub struct Regex<'e> {
    engine: &'e NativeEngine,
    handle: Option<PatternHandle>,
}

impl<'e> Regex<'e> {
    /// Compile `pattern` on `engine`
    pub fn new(engine: &'e NativeEngine, pattern: &str) -> Result<Self> {
        let handle = engine.compile(pattern.as_bytes())?;
        Ok(Self::from_handle(engine, handle))
    }

    /// Adopt a handle compiled by `engine`
    pub fn from_handle(engine: &'e NativeEngine, handle: PatternHandle) -> Self {
        Self {
            engine,
            handle: Some(handle),
        }
    }

    /// Stop managing the handle; the caller must release it
    pub fn into_handle(mut self) -> PatternHandle {
        match self.handle.take() {
            Some(handle) => handle,
            None => unreachable!("handle is only taken on drop or here"),
        }
    }

    fn handle(&self) -> &PatternHandle {
        match &self.handle {
            Some(handle) => handle,
            None => unreachable!("handle is only taken on drop or here"),
        }
    }

    /// Search `text` from `char_offset` code units.
    ///
    /// # Errors
    /// [`BridgeError::OffsetOutOfBounds`] if `char_offset` exceeds the text
    /// length in code units.
    pub fn search(
        &self,
        text: &Utf16String,
        char_offset: usize,
        options: SearchOptions,
    ) -> Result<Option<MatchResult>> {
        check_char_offset(char_offset, text.len())?;
        let byte_offset = text.byte_offset(char_offset);
        let found = self
            .engine
            .search(self.handle(), text.as_str(), byte_offset, options)?;
        Ok(found.map(|result| captures_to_char_offsets(text.as_bytes(), &result)))
    }

    /// Search UTF-8 `text` from `byte_offset`; captures stay in bytes
    pub fn search_bytes(
        &self,
        text: &str,
        byte_offset: usize,
        options: SearchOptions,
    ) -> Result<Option<MatchResult>> {
        self.engine.search(self.handle(), text, byte_offset, options)
    }

    /// Same as [`search`](Self::search) over an interned text
    ///
    /// # Errors
    /// [`BridgeError::EngineMismatch`] if `text` was interned by another engine.
    pub fn search_interned(
        &self,
        text: &InternedText<'_>,
        char_offset: usize,
        options: SearchOptions,
    ) -> Result<Option<MatchResult>> {
        if !std::ptr::eq(self.engine, text.engine) {
            return Err(BridgeError::EngineMismatch);
        }
        check_char_offset(char_offset, text.text.len())?;
        let byte_offset = text.text.byte_offset(char_offset);
        let found = self
            .engine
            .search_text(self.handle(), text.handle(), byte_offset, options)?;
        Ok(found.map(|result| captures_to_char_offsets(text.text.as_bytes(), &result)))
    }

    /// Every non-overlapping match from the start of `text`, in code units.
    ///
    /// An empty match advances by one code point so the scan always ends.
    pub fn find_iter(&self, text: &Utf16String, options: SearchOptions) -> Result<Vec<MatchResult>> {
        let mut matches = Vec::new();
        let mut offset = 0;
        while offset <= text.len() {
            let Some(found) = self.search(text, offset, options)? else {
                break;
            };
            let Some(range) = found.whole().and_then(|whole| whole.range()) else {
                break;
            };
            offset = if range.is_empty() {
                next_boundary(text.units(), range.end)
            } else {
                range.end
            };
            matches.push(found);
        }
        Ok(matches)
    }
}

impl Drop for Regex<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.engine.release(handle);
        }
    }
}

/// Text interned in native memory, released when dropped
#[derive(Debug)]
pub struct InternedText<'e> {
    engine: &'e NativeEngine,
    handle: Option<TextHandle>,
    text: Utf16String,
}

impl<'e> InternedText<'e> {
    pub fn new(engine: &'e NativeEngine, text: impl Into<Utf16String>) -> Result<Self> {
        let text = text.into();
        let handle = engine.intern_text(text.as_str())?;
        Ok(Self {
            engine,
            handle: Some(handle),
            text,
        })
    }

    pub fn text(&self) -> &Utf16String {
        &self.text
    }

    fn handle(&self) -> &TextHandle {
        match &self.handle {
            Some(handle) => handle,
            None => unreachable!("handle is only taken on drop"),
        }
    }
}

impl Drop for InternedText<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.engine.release_text(handle);
        }
    }
}

fn check_char_offset(offset: usize, len: usize) -> Result<()> {
    if offset > len {
        Err(BridgeError::OffsetOutOfBounds { offset, len })
    } else {
        Ok(())
    }
}

// One past `offset`, stepping over a whole surrogate pair
fn next_boundary(units: &[u16], offset: usize) -> usize {
    match units.get(offset) {
        Some(unit) if (0xD800..=0xDBFF).contains(unit) => offset + 2,
        _ => offset + 1,
    }
}
