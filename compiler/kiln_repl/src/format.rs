//! Outcome formatting: one display string per evaluation call.

use kiln_diagnostic::{render_diag, Diag};
use kiln_runtime::{HostRegistry, Throwable};

use crate::outcome::{DeclarationKind, ExecutionOutcome};
use crate::reconstitute::reconstitute;

/// Prefix of every line of a rejection report.
pub const MARKER: &str = "|  ";

/// Replaces the tab that opens each stack-trace frame line.
pub const TRACE_CONTINUATION: &str = "|        ";

/// Text for a whole call: the first failure, else the last outcome.
///
/// `None` when there are no outcomes.
pub fn format_outcomes(outcomes: &[ExecutionOutcome], host: &HostRegistry) -> Option<String> {
    let mut last = None;
    for outcome in outcomes {
        let text = format_outcome(outcome, host);
        if outcome.is_failure() {
            return Some(text);
        }
        last = Some(text);
    }
    last
}

pub fn format_outcome(outcome: &ExecutionOutcome, host: &HostRegistry) -> String {
    match outcome {
        ExecutionOutcome::Declaration {
            name,
            kind: DeclarationKind::Method,
        } => format!("created method {name}()"),
        ExecutionOutcome::Declaration {
            name,
            kind: DeclarationKind::Type,
        } => format!("created class {name}"),
        ExecutionOutcome::ValueResult { name, value } => format!("{name} ==> {value}"),
        ExecutionOutcome::SilentExpression => String::new(),
        ExecutionOutcome::RuntimeFailure(descriptor) => {
            format_stack_trace(&reconstitute(descriptor, host))
        }
        ExecutionOutcome::Rejected {
            source,
            diagnostics,
        } => format_rejection(source, diagnostics),
    }
}

/// `|  Error:` followed by every rendered diagnostic line.
pub fn format_rejection(source: &str, diagnostics: &[Diag]) -> String {
    let mut out = format!("{MARKER}Error:");
    for diag in diagnostics {
        for line in render_diag(source, diag) {
            out.push('\n');
            out.push_str(MARKER);
            out.push_str(&line);
        }
    }
    out
}

/// Printed stack trace with frame lines re-indented under the marker.
pub fn format_stack_trace(throwable: &Throwable) -> String {
    let trace = throwable
        .print_stack_trace()
        .replace("\r\n", "\n")
        .replace('\r', "\n");
    let continuation = format!("\n{TRACE_CONTINUATION}");
    trace
        .replace("\n\t", &continuation)
        .trim_end_matches('\n')
        .to_owned()
}
