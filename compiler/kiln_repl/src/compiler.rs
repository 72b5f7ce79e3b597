//! The black-box compiler the engine drives.
//!
//! A compiler classifies source completeness, compiles complete units to
//! bytecode plus a private executable form, runs that form against the
//! session's class space and reports what happened as [`SnippetEvent`]s.

use std::fmt;
use std::sync::Arc;

use kiln_diagnostic::Diag;
use kiln_runtime::{ClassBytes, ClassDefiner, ClassLoader, ExceptionDescriptor};
use thiserror::Error;

/// How much of a source string forms a unit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Completeness {
    /// A complete unit is available; the rest goes back into the loop.
    Complete,
    /// More input is needed before anything can run.
    Incomplete,
    /// Only whitespace and comments.
    Empty,
}

/// Result of [`Compiler::analyze_completion`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionInfo {
    pub completeness: Completeness,
    /// The complete unit; empty unless `completeness` is `Complete`.
    pub source: String,
    /// Text after the unit.
    pub remaining: String,
}

impl CompletionInfo {
    pub fn complete(source: impl Into<String>, remaining: impl Into<String>) -> Self {
        CompletionInfo {
            completeness: Completeness::Complete,
            source: source.into(),
            remaining: remaining.into(),
        }
    }

    pub fn incomplete() -> Self {
        CompletionInfo {
            completeness: Completeness::Incomplete,
            source: String::new(),
            remaining: String::new(),
        }
    }

    pub fn empty() -> Self {
        CompletionInfo {
            completeness: Completeness::Empty,
            source: String::new(),
            remaining: String::new(),
        }
    }
}

/// Output of [`Compiler::compile`].
#[derive(Debug)]
pub struct Compiled<U> {
    /// Classes to install before `unit` runs.
    pub classes: Vec<ClassBytes>,
    pub unit: U,
}

/// Hard internal compiler failure.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CompilerFailure {
    pub message: String,
}

impl CompilerFailure {
    pub fn new(message: impl Into<String>) -> Self {
        CompilerFailure {
            message: message.into(),
        }
    }
}

/// Session-unique snippet number.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnippetId(pub u32);

impl fmt::Display for SnippetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SnippetKind {
    Variable,
    Method,
    TypeDecl,
    Expression,
    /// A valid unit that binds nothing.
    Statement,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SnippetStatus {
    Valid,
    Rejected,
}

/// One named entity of a unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snippet {
    pub id: SnippetId,
    pub kind: SnippetKind,
    pub name: String,
    pub source: String,
}

/// What happened to one snippet when its unit ran.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnippetEvent {
    pub snippet: Snippet,
    pub status: SnippetStatus,
    /// Rendered value of a variable or value-producing expression.
    pub value: Option<String>,
    pub exception: Option<ExceptionDescriptor>,
}

impl SnippetEvent {
    pub fn valid(snippet: Snippet, value: Option<String>) -> Self {
        SnippetEvent {
            snippet,
            status: SnippetStatus::Valid,
            value,
            exception: None,
        }
    }

    pub fn rejected(snippet: Snippet) -> Self {
        SnippetEvent {
            snippet,
            status: SnippetStatus::Rejected,
            value: None,
            exception: None,
        }
    }

    pub fn threw(snippet: Snippet, exception: ExceptionDescriptor) -> Self {
        SnippetEvent {
            snippet,
            status: SnippetStatus::Valid,
            value: None,
            exception: Some(exception),
        }
    }
}

/// A compiler the engine can drive.
pub trait Compiler {
    /// Compiler-private executable form of one unit.
    type Unit;

    fn analyze_completion(&self, source: &str) -> CompletionInfo;

    fn compile(&mut self, source: &str) -> Result<Compiled<Self::Unit>, CompilerFailure>;

    /// Run `unit`. Its classes are already installed in `loader`.
    fn execute(
        &mut self,
        unit: Self::Unit,
        loader: &mut ClassLoader,
    ) -> Result<Vec<SnippetEvent>, CompilerFailure>;

    /// Diagnostics recorded for a rejected snippet.
    fn diagnostics(&self, snippet: &Snippet) -> Vec<Diag>;

    fn class_definer(&self) -> Arc<dyn ClassDefiner>;

    fn close(&mut self) {}
}
