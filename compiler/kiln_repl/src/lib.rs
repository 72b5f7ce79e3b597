//! Kiln REPL core: incremental compile-and-run evaluation.
//!
//! An [`Evaluator`] takes one line of user input at a time. Input that does
//! not yet form a complete unit is held until later lines complete it;
//! complete units are compiled, their classes installed into the session's
//! [`ClassLoader`](kiln_runtime::ClassLoader), and executed. Each call yields
//! at most one piece of display text.
//!
//! # Architecture
//!
//! ```text
//! text ─→ PendingInput ─→ CompilerFacade ──(loop per unit)──→ ExecutionOutcome*
//!                            │      │                              │
//!                        Compiler  ClassLoader              format_outcomes
//!                                                         (reconstitute, render_diag)
//! ```
//!
//! The compiler itself is a black box behind the [`Compiler`] trait.

mod buffer;
mod compiler;
mod errors;
mod evaluator;
mod facade;
mod format;
mod outcome;
mod reconstitute;

#[cfg(test)]
mod test_helpers;

pub use buffer::PendingInput;
pub use compiler::{
    Compiled, Compiler, CompilerFailure, Completeness, CompletionInfo, Snippet, SnippetEvent,
    SnippetId, SnippetKind, SnippetStatus,
};
pub use errors::EngineError;
pub use evaluator::{Evaluator, EvaluatorConfig};
pub use facade::{Classification, CompilerFacade};
pub use format::{
    format_outcome, format_outcomes, format_rejection, format_stack_trace, MARKER,
    TRACE_CONTINUATION,
};
pub use outcome::{DeclarationKind, ExecutionOutcome};
pub use reconstitute::reconstitute;
