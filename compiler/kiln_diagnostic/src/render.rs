//! Underlined source excerpts for rejected snippets.
//!
//! Output shape, one `String` per line:
//!
//! ```text
//! incompatible types: String cannot be converted to int     <- message lines
//! int x = "five";                                           <- source line
//!         ^-----^                                           <- marker
//! ```
//!
//! A span that runs past the end of its first line is marked up to the end
//! of that line and closed with [`CONTINUATION_MARKER`] instead of a caret.

use crate::span_utils::{char_width, line_bounds};
use crate::Diag;

/// Message lines starting (after trimming) with one of these are dropped.
///
/// Compilers append a `location:` line naming the synthetic wrapper class
/// that hosts the snippet; it means nothing to the user.
pub const NOISE_PREFIXES: &[&str] = &["location:"];

/// Terminates the marker of a span that continues past the shown line.
pub const CONTINUATION_MARKER: &str = "-...";

/// Render `diag` against the source of the snippet it was reported for.
pub fn render_diag(source: &str, diag: &Diag) -> Vec<String> {
    let mut lines: Vec<String> = diag
        .message
        .lines()
        .filter(|line| !line.is_empty())
        .filter(|line| {
            let trimmed = line.trim_start();
            !NOISE_PREFIXES.iter().any(|p| trimmed.starts_with(p))
        })
        .map(str::to_owned)
        .collect();

    let start = (diag.span.start as usize).min(source.len());
    let end = (diag.span.end as usize).clamp(start, source.len());
    let line = line_bounds(source, start);

    lines.push(line.text(source).to_owned());

    let start_col = char_width(source, line.start, start);
    let mut marker = " ".repeat(start_col);
    marker.push('^');
    if end > line.end {
        let line_width = char_width(source, line.start, line.end);
        let dashes = line_width.saturating_sub(start_col + 1);
        marker.push_str(&"-".repeat(dashes));
        marker.push_str(CONTINUATION_MARKER);
    } else {
        let end_col = char_width(source, line.start, end);
        if end_col > start_col {
            marker.push_str(&"-".repeat(end_col - start_col - 1));
            marker.push('^');
        }
    }
    lines.push(marker);

    lines
}

#[cfg(test)]
mod tests;
