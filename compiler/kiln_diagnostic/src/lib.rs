//! Diagnostic spans and source-excerpt rendering.
//!
//! The compiler behind the REPL reports errors as a message plus a byte-offset
//! span into the source of the unit it rejected. This crate turns that pair
//! into the text a user sees in a chat window:
//!
//! ```text
//! cannot find symbol
//!   symbol:   variable y
//! int x = y + 1;
//!         ^^
//! ```
//!
//! - [`Span`]: compact byte range into a unit's source
//! - [`Diag`]: a compiler diagnostic (message + span)
//! - [`span_utils`]: line-break scanning and line lookup
//! - [`render_diag`]: the message/excerpt/marker rendering

mod render;
mod span;
pub mod span_utils;

pub use render::{render_diag, CONTINUATION_MARKER, NOISE_PREFIXES};
pub use span::Span;

/// A compiler diagnostic attached to one rejected snippet.
///
/// `span` is measured in bytes against the source of that snippet, not the
/// whole session input.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Diag {
    /// Message text, possibly several lines (`symbol:`/`location:` details).
    pub message: String,
    /// Location of the problem in the snippet source.
    pub span: Span,
}

impl Diag {
    /// Create a diagnostic.
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Diag {
            message: message.into(),
            span,
        }
    }
}
