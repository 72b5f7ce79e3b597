//! [`SnippetCompiler`]: the reference [`Compiler`] the engine drives.
//!
//! Compiling a unit parses and checks it against the session's declared
//! signatures and commits what it declares; class declarations also yield a
//! class file for the engine to install. Executing the unit runs it in the
//! interpreter and reports one [`SnippetEvent`].

use std::sync::Arc;

use kiln_diagnostic::Diag;
use kiln_repl::{
    Compiled, Compiler, CompilerFailure, CompletionInfo, Snippet, SnippetEvent, SnippetId,
    SnippetKind,
};
use kiln_runtime::{ClassDefiner, ClassLoader, SharedHostRegistry};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::ast::{Expr, ExprKind, Item, Stmt, VarDecl};
use crate::checker::{check_item, Checked, Env, Ty};
use crate::classfile::{ClassFile, SnippetClassDefiner};
use crate::completeness::analyze;
use crate::interp::{wrapper_class, Globals, Interpreter, MethodDef, Unwind};
use crate::parser::parse_unit;
use crate::print_handler::{stdout_handler, SharedPrintHandler};
use crate::value::Value;

/// Executable form of one compiled unit.
#[derive(Debug)]
pub struct SnippetUnit {
    snippet: Snippet,
    body: UnitBody,
}

impl SnippetUnit {
    pub fn snippet(&self) -> &Snippet {
        &self.snippet
    }
}

#[derive(Debug)]
enum UnitBody {
    Rejected,
    /// Installed by the engine before execution.
    Class,
    Method(Arc<MethodDef>),
    Var {
        decl: VarDecl,
        ty: Ty,
    },
    /// `auto` names the `$N` variable a value-producing expression binds.
    Expr {
        value: Expr,
        line: u32,
        auto: Option<(String, Ty)>,
    },
    Throw {
        value: Expr,
        line: u32,
    },
}

pub struct SnippetCompiler {
    host: SharedHostRegistry,
    env: Env,
    globals: Globals,
    print: SharedPrintHandler,
    next_id: u32,
    next_auto: u32,
    diagnostics: FxHashMap<SnippetId, Vec<Diag>>,
}

impl SnippetCompiler {
    /// A compiler writing `println` output to stdout.
    pub fn new(host: SharedHostRegistry) -> Self {
        SnippetCompiler::with_print_handler(host, stdout_handler())
    }

    pub fn with_print_handler(host: SharedHostRegistry, print: SharedPrintHandler) -> Self {
        SnippetCompiler {
            host,
            env: Env::default(),
            globals: Globals::default(),
            print,
            next_id: 0,
            next_auto: 0,
            diagnostics: FxHashMap::default(),
        }
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.print
    }

    /// Output printed since the last call; empty when printing to stdout.
    pub fn take_output(&self) -> String {
        self.print.take_output()
    }

    /// Current value of a session variable.
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.globals.vars.get(name)
    }

    fn reject(&mut self, snippet: Snippet, diags: Vec<Diag>) -> Compiled<SnippetUnit> {
        debug!(snippet = %snippet.id, errors = diags.len(), "snippet rejected");
        self.diagnostics.insert(snippet.id, diags);
        Compiled {
            classes: Vec::new(),
            unit: SnippetUnit {
                snippet,
                body: UnitBody::Rejected,
            },
        }
    }

    fn next_auto_name(&mut self) -> String {
        self.next_auto += 1;
        format!("${}", self.next_auto)
    }

    /// Bind a top-level variable, falling back to its default when the
    /// initializer threw.
    fn bind(&mut self, name: &str, result: &Result<Value, Unwind>, ty: &Ty) {
        let value = match result {
            Ok(value) => value.clone(),
            Err(_) => Value::default_for(ty),
        };
        self.globals.vars.insert(name.to_owned(), value);
    }
}

fn snippet_for(id: SnippetId, item: &Item, source: &str) -> Snippet {
    let (kind, name) = match item {
        Item::Class(class) => (SnippetKind::TypeDecl, class.name.clone()),
        Item::Method(method) => (SnippetKind::Method, method.name.clone()),
        Item::Stmt(Stmt::Var(decl)) => (SnippetKind::Variable, decl.name.clone()),
        Item::Stmt(Stmt::Expr { .. }) => (SnippetKind::Expression, String::new()),
        Item::Stmt(Stmt::Return { .. } | Stmt::Throw { .. }) => {
            (SnippetKind::Statement, String::new())
        }
    };
    Snippet {
        id,
        kind,
        name,
        source: source.to_owned(),
    }
}

/// Turn an interpreter result into the snippet's event.
fn event_for(
    snippet: Snippet,
    result: Result<Option<String>, Unwind>,
) -> Result<SnippetEvent, CompilerFailure> {
    match result {
        Ok(value) => Ok(SnippetEvent::valid(snippet, value)),
        Err(Unwind::Throw(thrown)) => {
            debug!(snippet = %snippet.id, exception = %thrown, "snippet threw");
            Ok(SnippetEvent::threw(snippet, thrown.to_descriptor()))
        }
        Err(Unwind::Fault(fault)) => Err(CompilerFailure::new(fault.to_string())),
    }
}

impl Compiler for SnippetCompiler {
    type Unit = SnippetUnit;

    fn analyze_completion(&self, source: &str) -> CompletionInfo {
        analyze(source)
    }

    fn compile(&mut self, source: &str) -> Result<Compiled<SnippetUnit>, CompilerFailure> {
        self.next_id += 1;
        let id = SnippetId(self.next_id);

        let item = match parse_unit(source) {
            Ok(item) => item,
            Err(diag) => {
                let snippet = Snippet {
                    id,
                    kind: SnippetKind::Statement,
                    name: String::new(),
                    source: source.to_owned(),
                };
                return Ok(self.reject(snippet, vec![diag]));
            }
        };
        let mut snippet = snippet_for(id, &item, source);
        let checked = match check_item(&item, &self.env, &self.host, &wrapper_class(id.0)) {
            Ok(checked) => checked,
            Err(diags) => return Ok(self.reject(snippet, diags)),
        };

        let mut classes = Vec::new();
        let body = match (item, checked) {
            (Item::Class(decl), Checked::Class(sig)) => {
                let bytes = ClassFile::from_decl(&decl, id.0)
                    .encode()
                    .map_err(|e| CompilerFailure::new(format!("cannot encode {}: {e}", decl.name)))?;
                classes.push(bytes);
                self.env.classes.insert(decl.name, sig);
                UnitBody::Class
            }
            (Item::Method(decl), Checked::Method(sig)) => {
                self.env.methods.insert(decl.name.clone(), sig);
                UnitBody::Method(Arc::new(MethodDef {
                    decl,
                    snippet: id.0,
                }))
            }
            (Item::Stmt(Stmt::Var(decl)), Checked::Var(ty)) => {
                self.env.vars.insert(decl.name.clone(), ty.clone());
                UnitBody::Var { decl, ty }
            }
            (Item::Stmt(Stmt::Expr { value, line }), Checked::Expr(ty)) => {
                let silent = ty == Ty::Void || matches!(value.kind, ExprKind::Name(_));
                let auto = if silent {
                    None
                } else {
                    let name = self.next_auto_name();
                    self.env.vars.insert(name.clone(), ty.clone());
                    snippet.kind = SnippetKind::Variable;
                    snippet.name.clone_from(&name);
                    Some((name, ty))
                };
                UnitBody::Expr { value, line, auto }
            }
            (Item::Stmt(Stmt::Throw { value, line, .. }), Checked::Stmt) => {
                UnitBody::Throw { value, line }
            }
            (item, checked) => {
                return Err(CompilerFailure::new(format!(
                    "checker returned {checked:?} for {item:?}"
                )));
            }
        };
        debug!(snippet = %id, kind = ?snippet.kind, name = %snippet.name, "compiled");
        Ok(Compiled {
            classes,
            unit: SnippetUnit { snippet, body },
        })
    }

    fn execute(
        &mut self,
        unit: SnippetUnit,
        loader: &mut ClassLoader,
    ) -> Result<Vec<SnippetEvent>, CompilerFailure> {
        let SnippetUnit { snippet, body } = unit;
        let id = snippet.id.0;
        trace!(snippet = %snippet.id, "execute");
        let event = match body {
            UnitBody::Rejected => SnippetEvent::rejected(snippet),
            UnitBody::Class => SnippetEvent::valid(snippet, None),
            UnitBody::Method(def) => {
                self.globals.methods.insert(def.decl.name.clone(), def);
                SnippetEvent::valid(snippet, None)
            }
            UnitBody::Var { decl, ty } => {
                let result = match &decl.init {
                    Some(init) => Interpreter::new(&mut self.globals, loader, &self.print)
                        .eval_top_level(id, decl.line, init),
                    None => Ok(Value::default_for(&ty)),
                };
                self.bind(&decl.name, &result, &ty);
                event_for(snippet, result.map(|v| Some(v.render())))?
            }
            UnitBody::Expr { value, line, auto } => {
                let result = Interpreter::new(&mut self.globals, loader, &self.print)
                    .eval_top_level(id, line, &value);
                match auto {
                    Some((name, ty)) => {
                        self.bind(&name, &result, &ty);
                        event_for(snippet, result.map(|v| Some(v.render())))?
                    }
                    None => event_for(snippet, result.map(|_| None))?,
                }
            }
            UnitBody::Throw { value, line } => {
                let unwind = Interpreter::new(&mut self.globals, loader, &self.print)
                    .throw_top_level(id, line, &value);
                event_for(snippet, Err(unwind))?
            }
        };
        Ok(vec![event])
    }

    fn diagnostics(&self, snippet: &Snippet) -> Vec<Diag> {
        self.diagnostics
            .get(&snippet.id)
            .cloned()
            .unwrap_or_default()
    }

    fn class_definer(&self) -> Arc<dyn ClassDefiner> {
        Arc::new(SnippetClassDefiner)
    }

    fn close(&mut self) {
        debug!(snippets = self.next_id, "closing snippet compiler");
        self.globals = Globals::default();
        self.env = Env::default();
        self.diagnostics.clear();
    }
}
