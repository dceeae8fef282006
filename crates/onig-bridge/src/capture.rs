//! Match results

use std::ops::Range;

use onig_bridge_sys::UNMATCHED_GROUP;

/// A matched subrange `(start, end)`.
///
/// Offsets are bytes when produced by [`NativeEngine`](crate::NativeEngine)
/// and UTF-16 code units when produced by [`Regex::search`](crate::Regex::search).
/// A group that did not take part in the match is `(-1, -1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capture {
    pub start: i32,
    pub end: i32,
}

impl Capture {
    /// Marker for a group that did not participate
    pub const UNMATCHED: Capture = Capture {
        start: UNMATCHED_GROUP,
        end: UNMATCHED_GROUP,
    };

    pub const fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// Whether the group participated in the match
    pub fn is_matched(&self) -> bool {
        self.start >= 0 && self.end >= 0
    }

    /// Offsets as a range, `None` for an unmatched group
    pub fn range(&self) -> Option<Range<usize>> {
        self.is_matched()
            .then(|| self.start as usize..self.end as usize)
    }

    pub fn len(&self) -> usize {
        self.range().map_or(0, |range| range.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Captures of one match: index 0 is the whole match, then groups in order.
///
/// A search that finds nothing yields `None` rather than an empty result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchResult {
    captures: Vec<Capture>,
}

impl MatchResult {
    pub fn new(captures: Vec<Capture>) -> Self {
        Self { captures }
    }

    /// Build from the flat `[start, end, start, end, ...]` wire layout.
    ///
    /// A trailing odd offset is ignored.
    pub fn from_flat(offsets: &[i32]) -> Self {
        let captures = offsets
            .chunks_exact(2)
            .map(|pair| Capture::new(pair[0], pair[1]))
            .collect();
        Self { captures }
    }

    /// The whole match
    pub fn whole(&self) -> Option<&Capture> {
        self.captures.first()
    }

    /// Capture by group number (0 is the whole match)
    pub fn group(&self, index: usize) -> Option<&Capture> {
        self.captures.get(index)
    }

    pub fn captures(&self) -> &[Capture] {
        &self.captures
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Capture> {
        self.captures.iter()
    }

    pub fn len(&self) -> usize {
        self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    /// Apply `f` to every matched capture, leaving unmatched groups untouched
    pub fn map_offsets(&self, mut f: impl FnMut(i32) -> i32) -> Self {
        let captures = self
            .captures
            .iter()
            .map(|capture| {
                if capture.is_matched() {
                    Capture::new(f(capture.start), f(capture.end))
                } else {
                    *capture
                }
            })
            .collect();
        Self { captures }
    }

    pub fn into_captures(self) -> Vec<Capture> {
        self.captures
    }
}

impl<'a> IntoIterator for &'a MatchResult {
    type Item = &'a Capture;
    type IntoIter = std::slice::Iter<'a, Capture>;

    fn into_iter(self) -> Self::IntoIter {
        self.captures.iter()
    }
}
