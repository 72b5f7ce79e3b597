//! Reference snippet compiler for the Kiln REPL engine.
//!
//! A small statically checked language with Java-flavoured syntax: classes
//! with methods, top-level methods and variables, integer and string
//! arithmetic, `new`, method calls, `throw` and a builtin `println`.
//!
//! # Pipeline
//!
//! ```text
//! source ─→ lexer ─→ completeness::analyze        (Compiler::analyze_completion)
//! unit   ─→ parser ─→ checker ─→ ClassFile bytes  (Compiler::compile)
//! unit   ─→ interp (classes via ClassLoader)      (Compiler::execute)
//! ```
//!
//! [`SnippetCompiler`] is the entry point; [`standard_host_registry`] builds
//! the host classes it expects (`lang.Object` and the `lang.*` exceptions).

mod ast;
mod checker;
mod classfile;
mod compiler;
mod completeness;
mod host;
mod interp;
mod lexer;
mod parser;
mod print_handler;
mod stack;
mod value;

pub use checker::{Ty, LANG_PACKAGE, OBJECT_CLASS};
pub use classfile::{ClassFile, SnippetClass, SnippetClassDefiner};
pub use compiler::{SnippetCompiler, SnippetUnit};
pub use completeness::analyze as analyze_completion;
pub use host::{
    register_standard_classes, standard_host_registry, ARITHMETIC_EXCEPTION,
    NULL_POINTER_EXCEPTION, STACK_OVERFLOW_ERROR, STANDARD_EXCEPTIONS,
};
pub use interp::{MAX_CALL_DEPTH, TOP_LEVEL_METHOD};
pub use print_handler::{
    buffer_handler, stdout_handler, BufferPrintHandler, PrintHandlerImpl, SharedPrintHandler,
};
pub use value::Value;
