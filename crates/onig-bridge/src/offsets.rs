//! UTF-16 code unit <-> UTF-8 byte offset translation
//!
//! Callers index text in 16-bit code units while the engine reports byte
//! offsets. A supplementary-plane code point is 2 code units but 4 bytes, so no
//! fixed ratio exists and every translation walks the text.

use crate::capture::MatchResult;

const HIGH_SURROGATES: std::ops::RangeInclusive<u16> = 0xD800..=0xDBFF;
const LOW_SURROGATES: std::ops::RangeInclusive<u16> = 0xDC00..=0xDFFF;

fn utf8_len(code_point: u32) -> usize {
    match code_point {
        0..=0x7F => 1,
        0x80..=0x7FF => 2,
        0x800..=0xFFFF => 3,
        _ => 4,
    }
}

fn combine(high: u16, low: u16) -> u32 {
    (((high as u32 - 0xD800) << 10) | (low as u32 - 0xDC00)) + 0x10000
}

/// Byte offset of `char_offset` code units into `units`.
///
/// A surrogate pair counts as one 4-byte code point; any other unit, including
/// a lone surrogate, counts on its own. An offset that falls between the two
/// halves of a pair includes the whole pair. Offsets past the end clamp to the
/// full encoded length.
///
/// # Examples
/// ```
/// use onig_bridge::offsets::char_offset_to_byte_offset;
///
/// let units: Vec<u16> = "a\u{1F6A7}b".encode_utf16().collect();
/// assert_eq!(char_offset_to_byte_offset(&units, 3), 5);
/// ```
pub fn char_offset_to_byte_offset(units: &[u16], char_offset: usize) -> usize {
    if char_offset == 0 {
        return 0;
    }
    let mut bytes = 0;
    let mut i = 0;
    while i < char_offset && i < units.len() {
        let unit = units[i];
        match units.get(i + 1) {
            Some(&next) if HIGH_SURROGATES.contains(&unit) && LOW_SURROGATES.contains(&next) => {
                bytes += utf8_len(combine(unit, next));
                i += 2;
            }
            _ => {
                bytes += utf8_len(unit as u32);
                i += 1;
            }
        }
    }
    bytes
}

/// Code-unit offset of `byte_offset` bytes into `utf8`.
///
/// The prefix is decoded lossily, so an offset inside a multi-byte sequence
/// counts the partial sequence as one replacement character.
pub fn byte_offset_to_char_offset(utf8: &[u8], byte_offset: usize) -> usize {
    let prefix = &utf8[..byte_offset.min(utf8.len())];
    match std::str::from_utf8(prefix) {
        Ok(prefix) => prefix.chars().map(char::len_utf16).sum(),
        Err(_) => String::from_utf8_lossy(prefix).encode_utf16().count(),
    }
}

/// Translate byte captures over `utf8` into code-unit captures.
///
/// `start` and `end` are translated independently; unmatched groups keep their
/// sentinel.
pub fn captures_to_char_offsets(utf8: &[u8], result: &MatchResult) -> MatchResult {
    result.map_offsets(|offset| byte_offset_to_char_offset(utf8, offset as usize) as i32)
}

/// Text held both as UTF-16 code units and as its UTF-8 encoding
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Utf16String {
    units: Vec<u16>,
    utf8: String,
}

impl Utf16String {
    /// Wrap code units, replacing lone surrogates with U+FFFD in the UTF-8 side
    pub fn from_units(units: Vec<u16>) -> Self {
        let utf8 = String::from_utf16_lossy(&units);
        Self { units, utf8 }
    }

    pub fn units(&self) -> &[u16] {
        &self.units
    }

    pub fn as_str(&self) -> &str {
        &self.utf8
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.utf8.as_bytes()
    }

    /// Length in code units
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn byte_offset(&self, char_offset: usize) -> usize {
        char_offset_to_byte_offset(&self.units, char_offset)
    }

    pub fn char_offset(&self, byte_offset: usize) -> usize {
        byte_offset_to_char_offset(self.as_bytes(), byte_offset)
    }

    /// Code units in `range`, decoded
    pub fn substring(&self, range: std::ops::Range<usize>) -> String {
        String::from_utf16_lossy(&self.units[range])
    }
}

impl From<&str> for Utf16String {
    fn from(text: &str) -> Self {
        Self {
            units: text.encode_utf16().collect(),
            utf8: text.to_string(),
        }
    }
}

impl From<String> for Utf16String {
    fn from(text: String) -> Self {
        Self {
            units: text.encode_utf16().collect(),
            utf8: text,
        }
    }
}

impl From<Vec<u16>> for Utf16String {
    fn from(units: Vec<u16>) -> Self {
        Self::from_units(units)
    }
}
