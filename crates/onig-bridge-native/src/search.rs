//! Oniguruma compile and search, independent of the C ABI

use std::str;

use onig::{Regex, RegexOptions, Region, SearchOptions, Syntax};
use onig_bridge_sys::UNMATCHED_GROUP;
use onig_sys::{ONIG_OPTION_NOT_BEGIN_POSITION, ONIG_OPTION_NOT_BEGIN_STRING};

use crate::error::{NativeError, Result};

/// Compile a pattern with capture-group semantics and the default syntax
pub fn compile(pattern: &[u8]) -> Result<Regex> {
    let pattern = str::from_utf8(pattern)?;
    let regex = Regex::with_options(
        pattern,
        RegexOptions::REGEX_OPTION_CAPTURE_GROUP,
        Syntax::default(),
    )?;
    Ok(regex)
}

/// Search options for the two start anchors.
///
/// `begin_position = false` makes `\G` fail, `begin_string = false` makes `\A` fail.
fn anchor_options(begin_position: bool, begin_string: bool) -> SearchOptions {
    let mut options = SearchOptions::SEARCH_OPTION_NONE;
    if !begin_position {
        options |= unsafe { SearchOptions::from_bits_unchecked(ONIG_OPTION_NOT_BEGIN_POSITION) };
    }
    if !begin_string {
        options |= unsafe { SearchOptions::from_bits_unchecked(ONIG_OPTION_NOT_BEGIN_STRING) };
    }
    options
}

/// Leftmost-first search from `byte_offset` to the end of `text`.
///
/// Returns flat `[start, end]` pairs for the whole match and every group, or
/// `None` when nothing matched.
pub fn search(
    regex: &Regex,
    text: &str,
    byte_offset: usize,
    begin_position: bool,
    begin_string: bool,
) -> Result<Option<Vec<i32>>> {
    if text.len() > i32::MAX as usize {
        return Err(NativeError::TextTooLarge { len: text.len() });
    }
    if byte_offset > text.len() {
        return Err(NativeError::OffsetOutOfBounds {
            offset: byte_offset,
            len: text.len(),
        });
    }

    let mut region = Region::new();
    let matched = regex.search_with_options(
        text,
        byte_offset,
        text.len(),
        anchor_options(begin_position, begin_string),
        Some(&mut region),
    );
    Ok(matched.map(|_| flatten(&region)))
}

// Region::pos yields None for groups that did not participate; those keep the
// -1 sentinel so every group index still has a slot.
fn flatten(region: &Region) -> Vec<i32> {
    (0..region.len())
        .map(|group| {
            region
                .pos(group)
                .map(|(start, end)| (start as i32, end as i32))
                .unwrap_or((UNMATCHED_GROUP, UNMATCHED_GROUP))
        })
        .flat_map(|(start, end)| [start, end])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(pattern: &str, text: &str, offset: usize) -> Option<Vec<i32>> {
        let regex = compile(pattern.as_bytes()).unwrap();
        search(&regex, text, offset, true, true).unwrap()
    }

    #[test]
    fn test_simple_match() {
        assert_eq!(find("[0-9]+", "12:00pm", 0), Some(vec![0, 2]));
    }

    #[test]
    fn test_match_from_offset() {
        assert_eq!(find("[0-9]+", "12:00pm", 2), Some(vec![3, 5]));
    }

    #[test]
    fn test_groups() {
        assert_eq!(
            find("([0-9]+):([0-9]+)", "12:00pm", 0),
            Some(vec![0, 5, 0, 2, 3, 5])
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(find("[0-9]+", "noon", 0), None);
    }

    #[test]
    fn test_unmatched_group_keeps_sentinel() {
        assert_eq!(find("(a)|(b)", "b", 0), Some(vec![0, 1, -1, -1, 0, 1]));
    }

    #[test]
    fn test_begin_position_anchor() {
        let regex = compile(br"\Gbar").unwrap();
        assert_eq!(search(&regex, "foo bar", 4, false, true).unwrap(), None);
        assert_eq!(
            search(&regex, "foo bar", 4, true, true).unwrap(),
            Some(vec![4, 7])
        );
    }

    #[test]
    fn test_begin_string_anchor() {
        let regex = compile(br"\Afoo").unwrap();
        assert_eq!(search(&regex, "foo bar", 0, true, false).unwrap(), None);
        assert_eq!(
            search(&regex, "foo bar", 0, true, true).unwrap(),
            Some(vec![0, 3])
        );
    }

    #[test]
    fn test_anchor_flags_are_independent() {
        let regex = compile(br"\Afoo").unwrap();
        assert_eq!(
            search(&regex, "foo bar", 0, false, true).unwrap(),
            Some(vec![0, 3])
        );

        let regex = compile(br"\Gfoo").unwrap();
        assert_eq!(
            search(&regex, "foo bar", 0, true, false).unwrap(),
            Some(vec![0, 3])
        );
    }

    #[test]
    fn test_multibyte_offsets_are_bytes() {
        // "привет, " is 6 * 2 + 2 bytes
        assert_eq!(find("мир", "привет, мир!", 0), Some(vec![14, 20]));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = compile(b"(unclosed").unwrap_err();
        assert!(matches!(err, NativeError::Oniguruma(_)));
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn test_invalid_utf8_pattern() {
        let err = compile(&[0x66, 0xff]).unwrap_err();
        assert!(matches!(err, NativeError::Utf8(_)));
    }

    #[test]
    fn test_offset_out_of_bounds() {
        let regex = compile(b"a").unwrap();
        let err = search(&regex, "abc", 4, true, true).unwrap_err();
        assert!(matches!(
            err,
            NativeError::OffsetOutOfBounds { offset: 4, len: 3 }
        ));
    }

    #[test]
    fn test_offset_at_end() {
        let regex = compile(b"$").unwrap();
        assert_eq!(search(&regex, "abc", 3, true, true).unwrap(), Some(vec![3, 3]));
    }
}
