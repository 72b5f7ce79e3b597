//! One user's REPL session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use kiln_repl::{EngineError, Evaluator, EvaluatorConfig};
use kiln_snippet::{buffer_handler, standard_host_registry, SnippetCompiler};
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::errors::SessionError;
use crate::prompt::{PromptStyle, EXIT_COMMAND};

/// Shown in place of a result when the engine itself failed.
pub const INTERNAL_ERROR_PREFIX: &str = "|  Internal error: ";

/// What to show the user after one line of input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    /// The session continues; show this and wait for more input.
    Prompt(String),
    /// The session is over; show this farewell.
    End(String),
}

/// A live evaluator plus its presentation.
///
/// Input is serialised through the evaluator lock. [`ReplSession::end`] may
/// race with an in-flight call: it waits for the lock, so the call finishes
/// first and teardown still happens exactly once.
pub struct ReplSession {
    evaluator: Mutex<Evaluator<SnippetCompiler>>,
    style: PromptStyle,
    ended: AtomicBool,
}

impl ReplSession {
    /// Start an engine over the standard host classes, capturing `println`
    /// output so it can be shown in replies.
    pub fn new(config: &EvaluatorConfig, style: PromptStyle) -> Result<Self, SessionError> {
        let host = standard_host_registry();
        let compiler = SnippetCompiler::with_print_handler(Arc::clone(&host), buffer_handler());
        let evaluator = Evaluator::new(compiler, host, config)?;
        Ok(ReplSession::with_evaluator(evaluator, style))
    }

    pub fn with_evaluator(evaluator: Evaluator<SnippetCompiler>, style: PromptStyle) -> Self {
        ReplSession {
            evaluator: Mutex::new(evaluator),
            style,
            ended: AtomicBool::new(false),
        }
    }

    pub fn style(&self) -> PromptStyle {
        self.style
    }

    pub fn greeting(&self) -> String {
        self.style.greeting()
    }

    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }

    pub fn is_holding_incomplete_input(&self) -> bool {
        self.evaluator.lock().is_holding_incomplete_input()
    }

    /// Handle one line typed by the user.
    pub fn accept_input(&self, input: &str) -> Result<Reply, SessionError> {
        if self.is_ended() {
            return Err(SessionError::Closed);
        }
        if input == EXIT_COMMAND {
            self.end();
            return Ok(Reply::End(self.style.goodbye()));
        }

        let mut evaluator = self.evaluator.lock();
        let result = match evaluator.evaluate(input) {
            Ok(result) => result,
            Err(EngineError::Closed) => return Err(SessionError::Closed),
            Err(e) => {
                error!(error = %e, "evaluation failed");
                Some(format!("{INTERNAL_ERROR_PREFIX}{e}"))
            }
        };
        let printed = evaluator.facade().compiler().take_output();
        let holding = evaluator.is_holding_incomplete_input();
        drop(evaluator);

        let shown = join_shown(&printed, result.as_deref());
        Ok(Reply::Prompt(self.style.reply(holding, input, shown.as_deref())))
    }

    /// Close the engine. Returns `false` if the session had already ended.
    pub fn end(&self) -> bool {
        if self.ended.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.evaluator.lock().close();
        debug!("session closed");
        true
    }
}

/// Printed output comes before the engine's own text.
fn join_shown(printed: &str, result: Option<&str>) -> Option<String> {
    let printed = printed.trim_end_matches('\n');
    match (printed.is_empty(), result) {
        (true, None) => None,
        (true, Some(result)) => Some(result.to_owned()),
        (false, None) => Some(printed.to_owned()),
        (false, Some(result)) => Some(format!("{printed}\n{result}")),
    }
}
