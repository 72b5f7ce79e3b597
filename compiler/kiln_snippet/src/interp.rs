//! Tree-walking interpreter for checked snippet code.
//!
//! Top-level code runs in a synthetic `do_it$` frame of the snippet's
//! wrapper class; declared methods and class methods get frames of their
//! own. Frames record the line of the statement they are executing so
//! exceptions can capture an accurate stack trace where they are created.
//!
//! Classes are looked up through the session's [`ClassLoader`] on every
//! `new`, so redefined classes are picked up while old instances keep the
//! class they were created with.

use std::convert::Infallible;
use std::sync::Arc;

use kiln_runtime::{Class, ClassLoader, ExceptionType, LoaderError, StackFrame};
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::trace;

use crate::ast::{BinaryOp, Expr, ExprKind, MethodDecl, Stmt};
use crate::checker::LANG_PACKAGE;
use crate::classfile::SnippetClass;
use crate::host::{ARITHMETIC_EXCEPTION, NULL_POINTER_EXCEPTION, STACK_OVERFLOW_ERROR};
use crate::print_handler::SharedPrintHandler;
use crate::stack::ensure_sufficient_stack;
use crate::value::{Instance, Thrown, Value};

/// Frames allowed before `lang.StackOverflowError`.
pub const MAX_CALL_DEPTH: usize = 512;

/// Method name of the frame top-level code runs in.
pub const TOP_LEVEL_METHOD: &str = "do_it$";

/// Name of the class wrapping the code of snippet `id`.
pub fn wrapper_class(id: u32) -> String {
    format!("$Snippet${id}")
}

/// Source file name stack frames report for snippet `id`.
pub fn snippet_file(id: u32) -> String {
    format!("#{id}")
}

/// A method declared at top level.
#[derive(Debug)]
pub struct MethodDef {
    pub decl: MethodDecl,
    pub snippet: u32,
}

/// Session state that outlives a single unit.
#[derive(Debug, Default)]
pub struct Globals {
    pub vars: FxHashMap<String, Value>,
    pub methods: FxHashMap<String, Arc<MethodDef>>,
    next_identity: u32,
}

impl Globals {
    fn fresh_identity(&mut self) -> u32 {
        self.next_identity = self.next_identity.wrapping_add(1);
        self.next_identity.wrapping_mul(0x9E37_79B9)
    }
}

/// Something the interpreter cannot express as a snippet exception.
#[derive(Debug, Error)]
pub enum RuntimeFault {
    #[error("class {name} could not be loaded: {source}")]
    ClassLoad {
        name: String,
        #[source]
        source: LoaderError,
    },
    #[error("unbound variable {0}")]
    UnboundVariable(String),
    #[error("no method {method} on {receiver}")]
    NoSuchMethod { receiver: String, method: String },
    #[error("{0} is not throwable")]
    NotThrowable(String),
}

/// Why evaluation stopped early.
#[derive(Debug)]
pub enum Unwind {
    Throw(Arc<Thrown>),
    Fault(RuntimeFault),
}

impl From<RuntimeFault> for Unwind {
    fn from(fault: RuntimeFault) -> Self {
        Unwind::Fault(fault)
    }
}

enum Flow {
    Next,
    Return(Value),
}

struct Frame {
    class: String,
    method: String,
    file: String,
    line: u32,
    locals: FxHashMap<String, Value>,
}

impl Frame {
    fn to_stack_frame(&self) -> StackFrame {
        StackFrame::new(
            self.class.as_str(),
            self.method.as_str(),
            Some(self.file.clone()),
            Some(self.line),
        )
    }
}

pub struct Interpreter<'a> {
    globals: &'a mut Globals,
    loader: &'a mut ClassLoader,
    print: &'a SharedPrintHandler,
    frames: Vec<Frame>,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        globals: &'a mut Globals,
        loader: &'a mut ClassLoader,
        print: &'a SharedPrintHandler,
    ) -> Self {
        Interpreter {
            globals,
            loader,
            print,
            frames: Vec::new(),
        }
    }

    /// Evaluate a top-level expression of snippet `snippet`.
    pub fn eval_top_level(&mut self, snippet: u32, line: u32, expr: &Expr) -> Result<Value, Unwind> {
        self.in_top_level_frame(snippet, line, |interp| interp.eval(expr))
    }

    /// Run a top-level `throw`.
    pub fn throw_top_level(&mut self, snippet: u32, line: u32, expr: &Expr) -> Unwind {
        let result: Result<Infallible, Unwind> =
            self.in_top_level_frame(snippet, line, |interp| {
                let value = interp.eval(expr)?;
                Err(interp.throw_value(value))
            });
        match result {
            Err(unwind) => unwind,
            Ok(never) => match never {},
        }
    }

    fn in_top_level_frame<T>(
        &mut self,
        snippet: u32,
        line: u32,
        f: impl FnOnce(&mut Self) -> Result<T, Unwind>,
    ) -> Result<T, Unwind> {
        self.frames.push(Frame {
            class: wrapper_class(snippet),
            method: TOP_LEVEL_METHOD.to_owned(),
            file: snippet_file(snippet),
            line,
            locals: FxHashMap::default(),
        });
        let result = f(self);
        self.frames.pop();
        result
    }

    // === Exceptions ===

    fn capture_stack(&self) -> Vec<StackFrame> {
        self.frames.iter().rev().map(Frame::to_stack_frame).collect()
    }

    fn raise(&self, class_name: &str, message: Option<String>) -> Unwind {
        Unwind::Throw(Arc::new(Thrown {
            class_name: class_name.to_owned(),
            message,
            cause: None,
            stack_trace: self.capture_stack(),
        }))
    }

    fn throw_value(&self, value: Value) -> Unwind {
        match value {
            Value::Exception(thrown) => Unwind::Throw(thrown),
            Value::Null => self.raise(NULL_POINTER_EXCEPTION, None),
            other => Unwind::Fault(RuntimeFault::NotThrowable(other.render())),
        }
    }

    // === Calls ===

    fn invoke(
        &mut self,
        class: String,
        file: String,
        method: &MethodDecl,
        args: Vec<Value>,
    ) -> Result<Value, Unwind> {
        if self.frames.len() >= MAX_CALL_DEPTH {
            return Err(self.raise(STACK_OVERFLOW_ERROR, None));
        }
        let locals = method
            .params
            .iter()
            .map(|p| p.name.clone())
            .zip(args)
            .collect();
        self.frames.push(Frame {
            class,
            method: method.name.clone(),
            file,
            line: method.body.first().map_or(1, Stmt::line),
            locals,
        });
        let flow = ensure_sufficient_stack(|| self.exec_block(&method.body));
        self.frames.pop();
        match flow? {
            Flow::Return(value) => Ok(value),
            Flow::Next => Ok(Value::Void),
        }
    }

    fn exec_block(&mut self, body: &[Stmt]) -> Result<Flow, Unwind> {
        for stmt in body {
            if let Some(frame) = self.frames.last_mut() {
                frame.line = stmt.line();
            }
            match stmt {
                Stmt::Var(decl) => {
                    let value = match &decl.init {
                        Some(init) => self.eval(init)?,
                        None => Value::Null,
                    };
                    if let Some(frame) = self.frames.last_mut() {
                        frame.locals.insert(decl.name.clone(), value);
                    }
                }
                Stmt::Return { value, .. } => {
                    let value = match value {
                        Some(expr) => self.eval(expr)?,
                        None => Value::Void,
                    };
                    return Ok(Flow::Return(value));
                }
                Stmt::Throw { value, .. } => {
                    let value = self.eval(value)?;
                    return Err(self.throw_value(value));
                }
                Stmt::Expr { value, .. } => {
                    self.eval(value)?;
                }
            }
        }
        Ok(Flow::Next)
    }

    fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value, Unwind> {
        let Some(def) = self.globals.methods.get(name).cloned() else {
            if name == "println" {
                let line = args.first().map(ToString::to_string).unwrap_or_default();
                self.print.println(&line);
                return Ok(Value::Void);
            }
            return Err(RuntimeFault::NoSuchMethod {
                receiver: "session".to_owned(),
                method: name.to_owned(),
            }
            .into());
        };
        self.invoke(
            wrapper_class(def.snippet),
            snippet_file(def.snippet),
            &def.decl,
            args,
        )
    }

    fn call_method(&mut self, receiver: Value, method: &str, args: Vec<Value>) -> Result<Value, Unwind> {
        match (&receiver, method) {
            (Value::Null, _) => return Err(self.raise(NULL_POINTER_EXCEPTION, None)),
            (Value::Object(instance), _) => {
                if let Some(class) = instance.class.downcast_body::<SnippetClass>() {
                    let file = class.file();
                    if let Some(decl) = file.method(method) {
                        return self.invoke(
                            file.name.clone(),
                            snippet_file(file.snippet),
                            decl,
                            args,
                        );
                    }
                }
            }
            (Value::Exception(thrown), "getMessage") => {
                return Ok(thrown.message.as_deref().map_or(Value::Null, Value::str));
            }
            (Value::Str(s), "length") => {
                let len = s.encode_utf16().count();
                return Ok(Value::Int(i32::try_from(len).unwrap_or(i32::MAX)));
            }
            _ => {}
        }
        if method == "toString" {
            return Ok(Value::str(&receiver.to_string()));
        }
        Err(RuntimeFault::NoSuchMethod {
            receiver: receiver.render(),
            method: method.to_owned(),
        }
        .into())
    }

    /// Resolve a class name as written in source, falling back to `lang.`.
    fn find_class(&mut self, name: &str) -> Result<Arc<Class>, Unwind> {
        match self.loader.find_class(name) {
            Ok(class) => Ok(class),
            Err(LoaderError::ClassNotFound(_)) if !name.starts_with(LANG_PACKAGE) => {
                let qualified = format!("{LANG_PACKAGE}{name}");
                self.loader.find_class(&qualified).map_err(|source| {
                    RuntimeFault::ClassLoad {
                        name: name.to_owned(),
                        source,
                    }
                    .into()
                })
            }
            Err(source) => Err(RuntimeFault::ClassLoad {
                name: name.to_owned(),
                source,
            }
            .into()),
        }
    }

    fn new_instance(&mut self, class_name: &str, args: Vec<Value>) -> Result<Value, Unwind> {
        let class = self.find_class(class_name)?;
        trace!(class = class.name(), origin = ?class.origin(), "new");
        if class.downcast_body::<ExceptionType>().is_some() {
            let (message, cause) = match args.as_slice() {
                [Value::Exception(cause)] => (Some(cause.to_string()), Some(Arc::clone(cause))),
                [message, Value::Exception(cause)] => {
                    (string_arg(message), Some(Arc::clone(cause)))
                }
                [message, ..] => (string_arg(message), None),
                [] => (None, None),
            };
            return Ok(Value::Exception(Arc::new(Thrown {
                class_name: class.name().to_owned(),
                message,
                cause,
                stack_trace: self.capture_stack(),
            })));
        }
        let identity = self.globals.fresh_identity();
        Ok(Value::Object(Arc::new(Instance { class, identity })))
    }

    // === Expressions ===

    fn eval(&mut self, expr: &Expr) -> Result<Value, Unwind> {
        ensure_sufficient_stack(|| self.eval_inner(expr))
    }

    fn eval_args(&mut self, args: &[Expr]) -> Result<Vec<Value>, Unwind> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }

    fn eval_inner(&mut self, expr: &Expr) -> Result<Value, Unwind> {
        match &expr.kind {
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Str(s) => Ok(Value::str(s)),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Null => Ok(Value::Null),
            ExprKind::Name(name) => self.lookup(name),
            ExprKind::Neg(operand) => match self.eval(operand)? {
                Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
                other => Err(RuntimeFault::NoSuchMethod {
                    receiver: other.render(),
                    method: "-".to_owned(),
                }
                .into()),
            },
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                self.binary(*op, &lhs, &rhs)
            }
            ExprKind::Call { name, args } => {
                let args = self.eval_args(args)?;
                self.call(name, args)
            }
            ExprKind::New { class, args } => {
                let args = self.eval_args(args)?;
                self.new_instance(class, args)
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => {
                let receiver = self.eval(receiver)?;
                let args = self.eval_args(args)?;
                self.call_method(receiver, method, args)
            }
        }
    }

    fn lookup(&self, name: &str) -> Result<Value, Unwind> {
        let local = self.frames.last().and_then(|f| f.locals.get(name));
        match local.or_else(|| self.globals.vars.get(name)) {
            Some(value) => Ok(value.clone()),
            None => Err(RuntimeFault::UnboundVariable(name.to_owned()).into()),
        }
    }

    fn binary(&self, op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, Unwind> {
        if let (Value::Int(a), Value::Int(b)) = (lhs, rhs) {
            let (a, b) = (*a, *b);
            let result = match op {
                BinaryOp::Add => a.wrapping_add(b),
                BinaryOp::Sub => a.wrapping_sub(b),
                BinaryOp::Mul => a.wrapping_mul(b),
                BinaryOp::Div | BinaryOp::Rem if b == 0 => {
                    return Err(self.raise(ARITHMETIC_EXCEPTION, Some("/ by zero".to_owned())));
                }
                BinaryOp::Div => a.wrapping_div(b),
                BinaryOp::Rem => a.wrapping_rem(b),
            };
            return Ok(Value::Int(result));
        }
        if op == BinaryOp::Add {
            return Ok(Value::str(&format!("{lhs}{rhs}")));
        }
        Err(RuntimeFault::NoSuchMethod {
            receiver: lhs.render(),
            method: op.symbol().to_owned(),
        }
        .into())
    }
}

fn string_arg(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
