//! Execution outcomes: what a unit did, in display-ready terms.

use kiln_diagnostic::Diag;
use kiln_runtime::ExceptionDescriptor;

use crate::compiler::{Compiler, SnippetEvent, SnippetKind, SnippetStatus};
use crate::errors::EngineError;
use crate::facade::CompilerFacade;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeclarationKind {
    Method,
    Type,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Declaration { name: String, kind: DeclarationKind },
    ValueResult { name: String, value: String },
    SilentExpression,
    RuntimeFailure(ExceptionDescriptor),
    /// `source` is the rejected snippet's text, which the spans index into.
    Rejected { source: String, diagnostics: Vec<Diag> },
}

impl ExecutionOutcome {
    /// Failures stop the evaluation loop and win formatting.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ExecutionOutcome::RuntimeFailure(_) | ExecutionOutcome::Rejected { .. }
        )
    }
}

/// Translate raw events, fetching diagnostics for rejected snippets.
///
/// Valid statements yield nothing.
pub(crate) fn from_events<C: Compiler>(
    events: Vec<SnippetEvent>,
    facade: &CompilerFacade<C>,
) -> Result<Vec<ExecutionOutcome>, EngineError> {
    let mut outcomes = Vec::with_capacity(events.len());
    for event in events {
        if let Some(exception) = event.exception {
            outcomes.push(ExecutionOutcome::RuntimeFailure(exception));
            continue;
        }
        let snippet = event.snippet;
        let outcome = match event.status {
            SnippetStatus::Rejected => {
                let diagnostics = facade.diagnostics_for(&snippet)?;
                ExecutionOutcome::Rejected {
                    source: snippet.source,
                    diagnostics,
                }
            }
            SnippetStatus::Valid => match snippet.kind {
                SnippetKind::Variable => ExecutionOutcome::ValueResult {
                    name: snippet.name,
                    value: event.value.unwrap_or_default(),
                },
                SnippetKind::Method => ExecutionOutcome::Declaration {
                    name: snippet.name,
                    kind: DeclarationKind::Method,
                },
                SnippetKind::TypeDecl => ExecutionOutcome::Declaration {
                    name: snippet.name,
                    kind: DeclarationKind::Type,
                },
                SnippetKind::Expression => ExecutionOutcome::SilentExpression,
                SnippetKind::Statement => continue,
            },
        };
        outcomes.push(outcome);
    }
    Ok(outcomes)
}
