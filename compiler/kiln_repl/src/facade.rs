//! Compiler facade: one place that sequences compile, install and execute.

use std::path::PathBuf;

use kiln_diagnostic::Diag;
use kiln_runtime::{ClassBytes, ClassLoader, SharedHostRegistry};
use tracing::debug;

use crate::compiler::{Compiled, Compiler, Completeness, Snippet, SnippetEvent};
use crate::errors::EngineError;

/// How a candidate string splits into a unit and the rest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    Empty,
    Incomplete,
    Complete { unit: String, remainder: String },
}

/// Wraps a [`Compiler`] together with the class space its code runs in.
pub struct CompilerFacade<C: Compiler> {
    compiler: C,
    loader: ClassLoader,
    closed: bool,
}

impl<C: Compiler> CompilerFacade<C> {
    pub fn new(compiler: C, host: SharedHostRegistry) -> Self {
        let loader = ClassLoader::new(compiler.class_definer(), host);
        CompilerFacade {
            compiler,
            loader,
            closed: false,
        }
    }

    pub fn classify(&self, source: &str) -> Result<Classification, EngineError> {
        self.ensure_open()?;
        let info = self.compiler.analyze_completion(source);
        Ok(match info.completeness {
            Completeness::Empty => Classification::Empty,
            Completeness::Incomplete => Classification::Incomplete,
            Completeness::Complete => Classification::Complete {
                unit: info.source,
                remainder: info.remaining,
            },
        })
    }

    /// Compile `unit`, install any classes it defines, then run it.
    pub fn evaluate(&mut self, unit: &str) -> Result<Vec<SnippetEvent>, EngineError> {
        self.ensure_open()?;
        let Compiled { classes, unit } = self.compiler.compile(unit)?;
        if !classes.is_empty() {
            self.install_classes(&classes)?;
        }
        Ok(self.compiler.execute(unit, &mut self.loader)?)
    }

    /// Diagnostics of a rejected snippet; a rejection always carries one.
    pub fn diagnostics_for(&self, snippet: &Snippet) -> Result<Vec<Diag>, EngineError> {
        let diagnostics = self.compiler.diagnostics(snippet);
        if diagnostics.is_empty() {
            return Err(EngineError::MissingDiagnostics {
                snippet: snippet.id,
            });
        }
        Ok(diagnostics)
    }

    pub fn install_classes(&mut self, classes: &[ClassBytes]) -> Result<(), EngineError> {
        debug!(count = classes.len(), "installing classes");
        self.loader.install(classes)?;
        Ok(())
    }

    pub fn extend_search_path(&mut self, paths: &str) -> Result<(), EngineError> {
        self.ensure_open()?;
        self.loader.extend_search_path(paths)?;
        Ok(())
    }

    pub fn add_search_entry(&mut self, path: PathBuf) {
        self.loader.add_search_entry(path);
    }

    pub fn loader(&self) -> &ClassLoader {
        &self.loader
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    pub fn host(&self) -> &SharedHostRegistry {
        self.loader.host()
    }

    /// Shut the compiler down. Later calls are no-ops.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.compiler.close();
        debug!("compiler closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), EngineError> {
        if self.closed {
            Err(EngineError::Closed)
        } else {
            Ok(())
        }
    }
}
