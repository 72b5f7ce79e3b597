//! Line-break scanning for snippet sources.
//!
//! Snippets arrive from chat clients and terminals, so a single source may
//! mix `\n`, `\r\n` and bare `\r` terminators. Everything here scans the
//! actual break sequences instead of assuming one terminator or fixed-width
//! characters.
//!
//! ## Performance
//!
//! For repeated lookups on the same source, use [`LineOffsetTable`] which
//! pre-computes line offsets for O(log L) lookup instead of O(n) scanning.

/// A line-break sequence found in source text.
///
/// `start..end` covers the terminator itself: one byte for `\n` or `\r`,
/// two bytes for `\r\n`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LineBreak {
    pub start: usize,
    pub end: usize,
}

/// Iterate over every line-break sequence in `source`, in order.
pub fn line_breaks(source: &str) -> impl Iterator<Item = LineBreak> + '_ {
    let bytes = source.as_bytes();
    let mut i = 0;
    std::iter::from_fn(move || {
        while i < bytes.len() {
            let start = i;
            match bytes[i] {
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                    i += 2;
                    return Some(LineBreak { start, end: i });
                }
                b'\r' | b'\n' => {
                    i += 1;
                    return Some(LineBreak { start, end: i });
                }
                _ => i += 1,
            }
        }
        None
    })
}

/// Byte bounds of one source line, terminator excluded.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LineBounds {
    pub start: usize,
    pub end: usize,
}

impl LineBounds {
    /// The text of the line within `source`.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or_default()
    }
}

/// Find the line containing byte `offset`.
///
/// The line ends at the first break that starts at or after `offset`, or at
/// the end of the source. Offsets past the end clamp to the last line.
pub fn line_bounds(source: &str, offset: usize) -> LineBounds {
    let offset = offset.min(source.len());
    let mut start = 0;
    for brk in line_breaks(source) {
        if brk.start >= offset {
            return LineBounds {
                start,
                end: brk.start,
            };
        }
        start = brk.end;
    }
    LineBounds {
        start,
        end: source.len(),
    }
}

/// Count the characters in `source[from..to]`.
///
/// Falls back to the byte distance when the range does not land on character
/// boundaries, so a sloppy span never panics the renderer.
pub fn char_width(source: &str, from: usize, to: usize) -> usize {
    if to <= from {
        return 0;
    }
    source
        .get(from..to)
        .map_or(to - from, |text| text.chars().count())
}

/// Pre-computed line offset table for efficient line lookup.
///
/// Builds a table of byte offsets for each line start, enabling O(log L)
/// binary search lookups instead of O(n) linear scans.
///
/// # Example
///
/// ```
/// use kiln_diagnostic::span_utils::LineOffsetTable;
///
/// let table = LineOffsetTable::build("line1\r\nline2\nline3");
///
/// assert_eq!(table.line_from_offset(0), 1);
/// assert_eq!(table.line_from_offset(7), 2);
/// assert_eq!(table.line_from_offset(13), 3);
/// ```
#[derive(Clone, Debug, Default)]
pub struct LineOffsetTable {
    /// Byte offset of each line start; `offsets[0] == 0`.
    offsets: Vec<u32>,
}

impl LineOffsetTable {
    /// Build a line offset table from source text.
    pub fn build(source: &str) -> Self {
        let mut offsets = vec![0u32];
        offsets.extend(
            line_breaks(source).map(|brk| u32::try_from(brk.end).unwrap_or(u32::MAX)),
        );
        LineOffsetTable { offsets }
    }

    /// Get 1-based line number from a byte offset using binary search.
    #[inline]
    pub fn line_from_offset(&self, offset: u32) -> u32 {
        let line_idx = match self.offsets.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert) => insert.saturating_sub(1),
        };
        u32::try_from(line_idx).unwrap_or(u32::MAX - 1) + 1
    }

    /// Get the number of lines in the source.
    pub fn line_count(&self) -> usize {
        self.offsets.len()
    }
}

/// Compute the 1-based line number of a byte offset.
///
/// Note: For repeated lookups, use [`LineOffsetTable`] instead.
pub fn line_from_offset(source: &str, offset: u32) -> u32 {
    LineOffsetTable::build(source).line_from_offset(offset)
}
