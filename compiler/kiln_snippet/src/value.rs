//! Runtime values of snippet code.

use std::fmt;
use std::sync::Arc;

use kiln_runtime::{Class, ExceptionDescriptor, StackFrame};

use crate::checker::Ty;

#[derive(Clone, Debug)]
pub enum Value {
    Int(i32),
    Bool(bool),
    Str(Arc<str>),
    Null,
    /// Result of a `void` call.
    Void,
    Object(Arc<Instance>),
    Exception(Arc<Thrown>),
}

impl Value {
    /// Value of a variable that was declared but never assigned.
    pub fn default_for(ty: &Ty) -> Value {
        match ty {
            Ty::Int => Value::Int(0),
            Ty::Boolean => Value::Bool(false),
            _ => Value::Null,
        }
    }

    pub fn str(s: &str) -> Value {
        Value::Str(Arc::from(s))
    }

    /// How the REPL shows a value: strings quoted and escaped.
    pub fn render(&self) -> String {
        match self {
            Value::Str(s) => quote(s),
            other => other.to_string(),
        }
    }
}

/// `toString()` semantics; used by `println` and string concatenation.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => f.write_str(s),
            Value::Null => f.write_str("null"),
            Value::Void => Ok(()),
            Value::Object(instance) => write!(f, "{instance}"),
            Value::Exception(thrown) => write!(f, "{thrown}"),
        }
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// An object of a snippet or host class.
#[derive(Debug)]
pub struct Instance {
    pub class: Arc<Class>,
    pub identity: u32,
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:x}", self.class.name(), self.identity)
    }
}

/// A live exception inside the interpreter.
#[derive(Debug, PartialEq, Eq)]
pub struct Thrown {
    pub class_name: String,
    pub message: Option<String>,
    pub cause: Option<Arc<Thrown>>,
    /// Innermost frame first, captured where the exception was created.
    pub stack_trace: Vec<StackFrame>,
}

impl Thrown {
    /// Transport form handed back to the engine.
    pub fn to_descriptor(&self) -> ExceptionDescriptor {
        let descriptor = ExceptionDescriptor::new(&self.class_name, self.message.clone())
            .with_stack_trace(self.stack_trace.clone());
        match &self.cause {
            Some(cause) => descriptor.with_cause(cause.to_descriptor()),
            None => descriptor,
        }
    }
}

impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {message}", self.class_name),
            None => f.write_str(&self.class_name),
        }
    }
}
