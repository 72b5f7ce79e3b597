//! Engine failures.
//!
//! These are fatal to the current evaluation call only. Compile rejections
//! and runtime exceptions are not errors here; they become outcomes.

use kiln_runtime::{ClassInstallError, LoaderError};
use thiserror::Error;

use crate::compiler::{CompilerFailure, SnippetId};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("compiler failure: {0}")]
    Compiler(#[from] CompilerFailure),

    #[error(transparent)]
    ClassInstall(#[from] ClassInstallError),

    #[error("rejected snippet {snippet} has no diagnostics")]
    MissingDiagnostics { snippet: SnippetId },

    #[error("classpath: {0}")]
    Classpath(#[from] LoaderError),

    #[error("evaluator is closed")]
    Closed,
}
