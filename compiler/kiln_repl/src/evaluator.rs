//! The evaluation loop.

use std::path::PathBuf;

use kiln_runtime::{scan_archives, SharedHostRegistry, ARCHIVE_EXTENSION};
use tracing::{debug, info, trace};

use crate::buffer::PendingInput;
use crate::compiler::Compiler;
use crate::errors::EngineError;
use crate::facade::{Classification, CompilerFacade};
use crate::format::format_outcomes;
use crate::outcome::{self, ExecutionOutcome};

/// Construction-time settings for an [`Evaluator`].
#[derive(Clone, Debug)]
pub struct EvaluatorConfig {
    /// Directories scanned for class archives at startup.
    pub classpath_roots: Vec<PathBuf>,
    /// Extension (without the dot) that marks an archive.
    pub archive_extension: String,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        EvaluatorConfig {
            classpath_roots: Vec::new(),
            archive_extension: ARCHIVE_EXTENSION.to_string(),
        }
    }
}

impl EvaluatorConfig {
    #[must_use]
    pub fn with_classpath_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.classpath_roots.push(root.into());
        self
    }

    #[must_use]
    pub fn with_archive_extension(mut self, extension: impl Into<String>) -> Self {
        self.archive_extension = extension.into();
        self
    }
}

/// One session's evaluator: held input plus a compiler and its class space.
///
/// Not shared between sessions and never called concurrently.
pub struct Evaluator<C: Compiler> {
    facade: CompilerFacade<C>,
    pending: PendingInput,
}

impl<C: Compiler> Evaluator<C> {
    /// Create an evaluator, adding every archive under the configured roots
    /// to the search path in directory-listing order.
    pub fn new(
        compiler: C,
        host: SharedHostRegistry,
        config: &EvaluatorConfig,
    ) -> Result<Self, EngineError> {
        let mut facade = CompilerFacade::new(compiler, host);
        for root in &config.classpath_roots {
            for archive in scan_archives(root, &config.archive_extension)? {
                info!(archive = %archive.display(), "adding archive to search path");
                facade.add_search_entry(archive);
            }
        }
        Ok(Evaluator {
            facade,
            pending: PendingInput::new(),
        })
    }

    /// Evaluate `input` and return the text to show, if any.
    pub fn evaluate(&mut self, input: &str) -> Result<Option<String>, EngineError> {
        let outcomes = self.evaluate_outcomes(input)?;
        Ok(format_outcomes(&outcomes, self.facade.host()).filter(|text| !text.is_empty()))
    }

    /// Run every complete unit in held input plus `input`, in order.
    ///
    /// Stops after the first unit that fails; text after it is dropped.
    /// A trailing incomplete unit is held for the next call.
    pub fn evaluate_outcomes(&mut self, input: &str) -> Result<Vec<ExecutionOutcome>, EngineError> {
        let mut candidate = self.pending.merge(input);
        let mut outcomes = Vec::new();
        loop {
            match self.facade.classify(&candidate)? {
                Classification::Empty => return Ok(outcomes),
                Classification::Incomplete => {
                    trace!(held = candidate.len(), "holding incomplete input");
                    self.pending.hold(candidate);
                    return Ok(outcomes);
                }
                Classification::Complete { unit, remainder } => {
                    debug!(unit = %unit, "evaluating unit");
                    let events = self.facade.evaluate(&unit)?;
                    let unit_outcomes = outcome::from_events(events, &self.facade)?;
                    let failed = unit_outcomes.iter().any(ExecutionOutcome::is_failure);
                    outcomes.extend(unit_outcomes);
                    if failed {
                        if !remainder.trim().is_empty() {
                            debug!("unit failed, dropping remaining input");
                        }
                        return Ok(outcomes);
                    }
                    if remainder.is_empty() {
                        return Ok(outcomes);
                    }
                    candidate = remainder;
                }
            }
        }
    }

    pub fn is_holding_incomplete_input(&self) -> bool {
        self.pending.is_holding()
    }

    pub fn pending_input(&self) -> &str {
        self.pending.as_str()
    }

    pub fn extend_search_path(&mut self, paths: &str) -> Result<(), EngineError> {
        self.facade.extend_search_path(paths)
    }

    pub fn facade(&self) -> &CompilerFacade<C> {
        &self.facade
    }

    /// Release the compiler. Idempotent; later evaluations fail with
    /// [`EngineError::Closed`].
    pub fn close(&mut self) {
        self.pending.clear();
        self.facade.close();
    }

    pub fn is_closed(&self) -> bool {
        self.facade.is_closed()
    }
}
