//! Exceptions, their transport form, and the constructors that rebuild them.
//!
//! Snippet code throws an [`Exception`]. When a compiler cannot hand the live
//! value across its execution boundary it reports an [`ExceptionDescriptor`]
//! instead: class name, message, cause and stack trace as plain data. The
//! evaluator turns descriptors back into real exceptions by probing the
//! constructors an [`ExceptionType`] exposes, in [`ConstructorShape::PROBE_ORDER`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::class::ClassBody;
use crate::errors::LinkError;

/// Class name used to print a descriptor that could not be rebuilt.
pub const GENERIC_EXCEPTION_NAME: &str = "kiln.EvalException";

/// One stack-trace element.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackFrame {
    pub declaring_class: String,
    pub method: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl StackFrame {
    pub fn new(
        declaring_class: impl Into<String>,
        method: impl Into<String>,
        file: Option<String>,
        line: Option<u32>,
    ) -> Self {
        StackFrame {
            declaring_class: declaring_class.into(),
            method: method.into(),
            file,
            line,
        }
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.declaring_class, self.method)?;
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{file}:{line})"),
            (Some(file), None) => write!(f, "{file})"),
            (None, _) => f.write_str("Unknown Source)"),
        }
    }
}

/// An exception in transport form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExceptionDescriptor {
    pub class_name: String,
    pub message: Option<String>,
    pub cause: Option<Box<ExceptionDescriptor>>,
    pub stack_trace: Vec<StackFrame>,
}

impl ExceptionDescriptor {
    pub fn new(class_name: impl Into<String>, message: Option<String>) -> Self {
        ExceptionDescriptor {
            class_name: class_name.into(),
            message,
            cause: None,
            stack_trace: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_cause(mut self, cause: ExceptionDescriptor) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    #[must_use]
    pub fn with_stack_trace(mut self, stack_trace: Vec<StackFrame>) -> Self {
        self.stack_trace = stack_trace;
        self
    }
}

/// A live exception value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Exception {
    class_name: String,
    message: Option<String>,
    cause: Option<Box<Throwable>>,
    stack_trace: Vec<StackFrame>,
}

impl Exception {
    pub fn new(class_name: impl Into<String>, message: Option<String>, cause: Option<Throwable>) -> Self {
        Exception {
            class_name: class_name.into(),
            message,
            cause: cause.map(Box::new),
            stack_trace: Vec::new(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn cause(&self) -> Option<&Throwable> {
        self.cause.as_deref()
    }

    pub fn stack_trace(&self) -> &[StackFrame] {
        &self.stack_trace
    }

    pub fn set_stack_trace(&mut self, stack_trace: Vec<StackFrame>) {
        self.stack_trace = stack_trace;
    }
}

/// Either a live exception or the descriptor of one that could not be
/// rebuilt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Throwable {
    Native(Exception),
    Descriptor(ExceptionDescriptor),
}

impl Throwable {
    /// Class name as printed in traces.
    pub fn display_name(&self) -> &str {
        match self {
            Throwable::Native(e) => e.class_name(),
            Throwable::Descriptor(_) => GENERIC_EXCEPTION_NAME,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Throwable::Native(e) => e.message(),
            Throwable::Descriptor(d) => d.message.as_deref(),
        }
    }

    pub fn stack_trace(&self) -> &[StackFrame] {
        match self {
            Throwable::Native(e) => e.stack_trace(),
            Throwable::Descriptor(d) => &d.stack_trace,
        }
    }

    /// The full printed trace: header, `\tat` frames, then each cause.
    ///
    /// ```text
    /// lang.IllegalStateException: boom
    /// 	at $Snippet$1.do_it$(#1:1)
    /// Caused by: lang.ArithmeticException: / by zero
    /// 	at $Snippet$1.do_it$(#1:1)
    /// ```
    pub fn print_stack_trace(&self) -> String {
        let mut out = String::new();
        let mut node: Option<&dyn TraceNode> = Some(self);
        let mut first = true;
        while let Some(current) = node {
            if !first {
                out.push_str("Caused by: ");
            }
            first = false;
            out.push_str(&header(current.name(), current.text()));
            out.push('\n');
            for frame in current.frames() {
                out.push_str("\tat ");
                out.push_str(&frame.to_string());
                out.push('\n');
            }
            node = current.next();
        }
        out
    }
}

impl fmt::Display for Throwable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&header(self.display_name(), self.message()))
    }
}

fn header(name: &str, message: Option<&str>) -> String {
    match message {
        Some(message) => format!("{name}: {message}"),
        None => name.to_owned(),
    }
}

/// One link of a cause chain, whichever form it takes.
trait TraceNode {
    fn name(&self) -> &str;
    fn text(&self) -> Option<&str>;
    fn frames(&self) -> &[StackFrame];
    fn next(&self) -> Option<&dyn TraceNode>;
}

impl TraceNode for Throwable {
    fn name(&self) -> &str {
        self.display_name()
    }

    fn text(&self) -> Option<&str> {
        self.message()
    }

    fn frames(&self) -> &[StackFrame] {
        self.stack_trace()
    }

    fn next(&self) -> Option<&dyn TraceNode> {
        match self {
            Throwable::Native(e) => e.cause().map(|c| c as &dyn TraceNode),
            Throwable::Descriptor(d) => d.cause.as_deref().map(|c| c as &dyn TraceNode),
        }
    }
}

impl TraceNode for ExceptionDescriptor {
    fn name(&self) -> &str {
        GENERIC_EXCEPTION_NAME
    }

    fn text(&self) -> Option<&str> {
        self.message.as_deref()
    }

    fn frames(&self) -> &[StackFrame] {
        &self.stack_trace
    }

    fn next(&self) -> Option<&dyn TraceNode> {
        self.cause.as_deref().map(|c| c as &dyn TraceNode)
    }
}

/// Parameter lists an exception constructor can have.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConstructorShape {
    MessageCause,
    Message,
    Cause,
    NoArgs,
}

impl ConstructorShape {
    /// Order in which reconstitution tries constructors.
    pub const PROBE_ORDER: [ConstructorShape; 4] = [
        ConstructorShape::MessageCause,
        ConstructorShape::Message,
        ConstructorShape::Cause,
        ConstructorShape::NoArgs,
    ];

    pub fn signature(self) -> &'static str {
        match self {
            ConstructorShape::MessageCause => "<init>(String, Throwable)",
            ConstructorShape::Message => "<init>(String)",
            ConstructorShape::Cause => "<init>(Throwable)",
            ConstructorShape::NoArgs => "<init>()",
        }
    }
}

impl fmt::Display for ConstructorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.signature())
    }
}

/// Why a constructor produced no exception.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConstructError {
    #[error("{class} has no constructor {shape}")]
    NoSuchConstructor {
        class: String,
        shape: ConstructorShape,
    },
    #[error("constructor {shape} of {class} failed: {message}")]
    Failed {
        class: String,
        shape: ConstructorShape,
        message: String,
    },
}

/// Arguments handed to a constructor; unused slots are `None`.
#[derive(Clone, Debug, Default)]
pub struct ConstructorArgs {
    pub message: Option<String>,
    pub cause: Option<Throwable>,
}

pub type ConstructorFn =
    Arc<dyn Fn(&str, ConstructorArgs) -> Result<Exception, ConstructError> + Send + Sync>;

/// A throwable class: its name and the constructors it declares.
#[derive(Clone)]
pub struct ExceptionType {
    name: String,
    constructors: Vec<(ConstructorShape, ConstructorFn)>,
}

impl ExceptionType {
    /// A type with no constructors; add them with [`with_constructor`](Self::with_constructor).
    pub fn new(name: impl Into<String>) -> Self {
        ExceptionType {
            name: name.into(),
            constructors: Vec::new(),
        }
    }

    /// A type declaring all four conventional constructors.
    pub fn standard(name: impl Into<String>) -> Self {
        let mut ty = ExceptionType::new(name);
        for shape in ConstructorShape::PROBE_ORDER {
            ty = ty.with_constructor(
                shape,
                Arc::new(
                    |class: &str, args: ConstructorArgs| -> Result<Exception, ConstructError> {
                        Ok(Exception::new(class, args.message, args.cause))
                    },
                ),
            );
        }
        ty
    }

    #[must_use]
    pub fn with_constructor(mut self, shape: ConstructorShape, ctor: ConstructorFn) -> Self {
        self.constructors.retain(|(s, _)| *s != shape);
        self.constructors.push((shape, ctor));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_constructor(&self, shape: ConstructorShape) -> bool {
        self.constructors.iter().any(|(s, _)| *s == shape)
    }

    /// Invoke the constructor of `shape`.
    ///
    /// Only the arguments the shape takes are passed on.
    pub fn instantiate(
        &self,
        shape: ConstructorShape,
        message: Option<String>,
        cause: Option<Throwable>,
    ) -> Result<Exception, ConstructError> {
        let Some((_, ctor)) = self.constructors.iter().find(|(s, _)| *s == shape) else {
            return Err(ConstructError::NoSuchConstructor {
                class: self.name.clone(),
                shape,
            });
        };
        let args = match shape {
            ConstructorShape::MessageCause => ConstructorArgs { message, cause },
            ConstructorShape::Message => ConstructorArgs {
                message,
                cause: None,
            },
            ConstructorShape::Cause => ConstructorArgs {
                message: None,
                cause,
            },
            ConstructorShape::NoArgs => ConstructorArgs::default(),
        };
        ctor(&self.name, args)
    }
}

impl fmt::Debug for ExceptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shapes: Vec<_> = self.constructors.iter().map(|(s, _)| *s).collect();
        f.debug_struct("ExceptionType")
            .field("name", &self.name)
            .field("constructors", &shapes)
            .finish()
    }
}

impl ClassBody for ExceptionType {
    fn declared_members(&self) -> Result<Vec<String>, LinkError> {
        Ok(self
            .constructors
            .iter()
            .map(|(shape, _)| shape.signature().to_owned())
            .collect())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
