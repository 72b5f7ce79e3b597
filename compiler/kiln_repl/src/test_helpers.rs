//! A scripted compiler for exercising the engine without a real language.
//!
//! Units end at a top-level `;` or at the brace that closes a top-level
//! block. A trailing `+` or an open brace makes input incomplete. Each unit is one command:
//!
//! | unit                | event                                        |
//! |---------------------|----------------------------------------------|
//! | `class Name {..}`   | installs `Name`, then a `TypeDecl`           |
//! | `fn name`           | `Method`                                     |
//! | `let name = value`  | `Variable` with `value`                      |
//! | `throw Class msg`   | exception descriptor for `Class`             |
//! | `bad ...`           | rejected, with one diagnostic                |
//! | `bad! ...`          | rejected, with no diagnostics                |
//! | `log word`          | appends `word` to the shared log, `Expression` |
//! | `nop`               | `Statement`                                  |
//! | `crash`             | hard compiler failure                        |
//! | anything else       | `Variable` named `$N` holding the text       |

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use kiln_diagnostic::{Diag, Span};
use kiln_runtime::{
    ClassBody, ClassBytes, ClassDefiner, ClassLoader, DefineError, ExceptionDescriptor, LinkError,
    StackFrame,
};

use crate::compiler::{
    Compiled, Compiler, CompilerFailure, CompletionInfo, Snippet, SnippetEvent, SnippetId,
    SnippetKind,
};

pub type Log = Rc<RefCell<Vec<String>>>;

#[derive(Default)]
pub struct ScriptCompiler {
    pub log: Log,
    next_id: u32,
    next_auto: u32,
    diagnostics: HashMap<SnippetId, Vec<Diag>>,
}

pub struct ScriptUnit {
    id: SnippetId,
    text: String,
    source: String,
}

impl ScriptCompiler {
    pub fn new() -> Self {
        ScriptCompiler::default()
    }

    fn snippet(unit: &ScriptUnit, kind: SnippetKind, name: &str) -> Snippet {
        Snippet {
            id: unit.id,
            kind,
            name: name.to_owned(),
            source: unit.source.clone(),
        }
    }
}

impl Compiler for ScriptCompiler {
    type Unit = ScriptUnit;

    fn analyze_completion(&self, source: &str) -> CompletionInfo {
        if source.trim().is_empty() {
            return CompletionInfo::empty();
        }
        let mut depth = 0i32;
        for (i, c) in source.char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return CompletionInfo::complete(&source[..=i], &source[i + 1..]);
                    }
                }
                ';' if depth == 0 => {
                    return CompletionInfo::complete(&source[..=i], &source[i + 1..]);
                }
                _ => {}
            }
        }
        if depth > 0 || source.trim_end().ends_with('+') {
            CompletionInfo::incomplete()
        } else {
            CompletionInfo::complete(source, "")
        }
    }

    fn compile(&mut self, source: &str) -> Result<Compiled<ScriptUnit>, CompilerFailure> {
        let text = source.trim().trim_end_matches(';').trim().to_owned();
        if text == "crash" {
            return Err(CompilerFailure::new("compiler crashed"));
        }
        self.next_id += 1;
        let mut classes = Vec::new();
        if let Some(rest) = text.strip_prefix("class ") {
            let name = rest.split_whitespace().next().unwrap_or_default();
            classes.push(ClassBytes::new(name, text.clone().into_bytes()));
        }
        Ok(Compiled {
            classes,
            unit: ScriptUnit {
                id: SnippetId(self.next_id),
                text,
                source: source.trim().to_owned(),
            },
        })
    }

    fn execute(
        &mut self,
        unit: ScriptUnit,
        loader: &mut ClassLoader,
    ) -> Result<Vec<SnippetEvent>, CompilerFailure> {
        let mut words = unit.text.split_whitespace();
        let head = words.next().unwrap_or_default();
        let event = match head {
            "class" => {
                let name = words.next().unwrap_or_default();
                loader
                    .find_class(name)
                    .map_err(|e| CompilerFailure::new(e.to_string()))?;
                SnippetEvent::valid(Self::snippet(&unit, SnippetKind::TypeDecl, name), None)
            }
            "fn" => {
                let name = words.next().unwrap_or_default();
                SnippetEvent::valid(Self::snippet(&unit, SnippetKind::Method, name), None)
            }
            "let" => {
                let name = words.next().unwrap_or_default();
                let value = words.nth(1).unwrap_or_default();
                SnippetEvent::valid(
                    Self::snippet(&unit, SnippetKind::Variable, name),
                    Some(value.to_owned()),
                )
            }
            "throw" => {
                let class = words.next().unwrap_or_default();
                let message = words.collect::<Vec<_>>().join(" ");
                let file = unit.id.to_string();
                let descriptor = ExceptionDescriptor::new(class, Some(message))
                    .with_stack_trace(vec![StackFrame::new(
                        file.clone(),
                        "do_it$",
                        Some(file),
                        Some(1),
                    )]);
                SnippetEvent::threw(Self::snippet(&unit, SnippetKind::Statement, ""), descriptor)
            }
            "bad" | "bad!" => {
                if head == "bad" {
                    let diag = Diag::new(
                        "illegal start of expression\n  location: class $Wrap",
                        Span::new(0, 3),
                    );
                    self.diagnostics.insert(unit.id, vec![diag]);
                }
                SnippetEvent::rejected(Self::snippet(&unit, SnippetKind::Statement, ""))
            }
            "log" => {
                self.log
                    .borrow_mut()
                    .push(words.next().unwrap_or_default().to_owned());
                SnippetEvent::valid(Self::snippet(&unit, SnippetKind::Expression, ""), None)
            }
            "nop" => SnippetEvent::valid(Self::snippet(&unit, SnippetKind::Statement, ""), None),
            _ => {
                self.next_auto += 1;
                let name = format!("${}", self.next_auto);
                SnippetEvent::valid(
                    Self::snippet(&unit, SnippetKind::Variable, &name),
                    Some(unit.text.clone()),
                )
            }
        };
        Ok(vec![event])
    }

    fn diagnostics(&self, snippet: &Snippet) -> Vec<Diag> {
        self.diagnostics.get(&snippet.id).cloned().unwrap_or_default()
    }

    fn class_definer(&self) -> Arc<dyn ClassDefiner> {
        Arc::new(ScriptDefiner)
    }

    fn close(&mut self) {
        self.log.borrow_mut().push("closed".to_owned());
    }
}

struct ScriptDefiner;

#[derive(Debug)]
struct ScriptBody;

impl ClassBody for ScriptBody {
    fn declared_members(&self) -> Result<Vec<String>, LinkError> {
        Ok(Vec::new())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ClassDefiner for ScriptDefiner {
    fn define(&self, _name: &str, _bytes: &[u8]) -> Result<Arc<dyn ClassBody>, DefineError> {
        Ok(Arc::new(ScriptBody))
    }
}
