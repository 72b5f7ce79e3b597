//! Name and type checking against the session's declarations.
//!
//! The checker never stops at the first problem: a bad sub-expression gets
//! type [`Ty::Error`], which is compatible with everything, so one mistake
//! yields one diagnostic.

use std::fmt;

use kiln_diagnostic::{Diag, Span};
use kiln_runtime::{ConstructorShape, ExceptionType, HostRegistry};
use rustc_hash::FxHashMap;

use crate::ast::{
    BinaryOp, ClassDecl, Expr, ExprKind, Item, MethodDecl, Stmt, TypeRef, VarDecl,
};
use crate::stack::ensure_sufficient_stack;

/// Package that simple class names fall back to.
pub const LANG_PACKAGE: &str = "lang.";

/// Root of the class hierarchy.
pub const OBJECT_CLASS: &str = "lang.Object";

/// Static type of an expression or binding.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    Int,
    Boolean,
    Str,
    Null,
    Void,
    /// Fully qualified class name.
    Class(String),
    /// Result of an expression that already produced a diagnostic.
    Error,
}

impl Ty {
    pub fn is_reference(&self) -> bool {
        matches!(self, Ty::Str | Ty::Null | Ty::Class(_))
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Int => f.write_str("int"),
            Ty::Boolean => f.write_str("boolean"),
            Ty::Str => f.write_str("String"),
            Ty::Null => f.write_str("<null>"),
            Ty::Void => f.write_str("void"),
            Ty::Class(name) => f.write_str(name.strip_prefix(LANG_PACKAGE).unwrap_or(name)),
            Ty::Error => f.write_str("<any>"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodSig {
    pub params: Vec<Ty>,
    pub ret: Ty,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassSig {
    pub methods: FxHashMap<String, MethodSig>,
}

/// Signatures of everything the session has declared so far.
#[derive(Clone, Debug, Default)]
pub struct Env {
    pub vars: FxHashMap<String, Ty>,
    pub methods: FxHashMap<String, MethodSig>,
    pub classes: FxHashMap<String, ClassSig>,
}

/// What a well-formed item declares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Checked {
    Class(ClassSig),
    Method(MethodSig),
    Var(Ty),
    /// Top-level expression and its type.
    Expr(Ty),
    Stmt,
}

/// Check `item`, declared by the snippet whose wrapper class is `wrapper`.
pub fn check_item(
    item: &Item,
    env: &Env,
    host: &HostRegistry,
    wrapper: &str,
) -> Result<Checked, Vec<Diag>> {
    let mut checker = Checker {
        env,
        host,
        wrapper,
        diags: Vec::new(),
        scope: Scope::default(),
        pending_class: None,
        pending_method: None,
    };
    let checked = match item {
        Item::Class(class) => Checked::Class(checker.class_decl(class)),
        Item::Method(method) => {
            let sig = checker.method_sig(method);
            checker.pending_method = Some((method.name.clone(), sig.clone()));
            checker.method_body(method, &sig);
            Checked::Method(sig)
        }
        Item::Stmt(Stmt::Var(decl)) => Checked::Var(checker.var_decl(decl, true)),
        Item::Stmt(Stmt::Expr { value, .. }) => Checked::Expr(checker.expr(value)),
        Item::Stmt(Stmt::Return { span, .. }) => {
            checker.error("return outside method", *span);
            Checked::Stmt
        }
        Item::Stmt(stmt @ Stmt::Throw { .. }) => {
            checker.stmt(stmt);
            Checked::Stmt
        }
    };
    if checker.diags.is_empty() {
        Ok(checked)
    } else {
        Err(checker.diags)
    }
}

#[derive(Default)]
struct Scope {
    /// Locals of the method being checked; `false` until initialized.
    locals: FxHashMap<String, (Ty, bool)>,
    ret: Option<Ty>,
    /// `method f(int)`, for "already defined" messages.
    owner: String,
}

struct Checker<'a> {
    env: &'a Env,
    host: &'a HostRegistry,
    wrapper: &'a str,
    diags: Vec<Diag>,
    scope: Scope,
    /// Class being declared, visible to its own method bodies.
    pending_class: Option<(String, ClassSig)>,
    /// Top-level method being declared, visible to itself.
    pending_method: Option<(String, MethodSig)>,
}

impl Checker<'_> {
    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.diags.push(Diag::new(message, span));
    }

    fn cannot_find(&mut self, symbol: &str, span: Span) {
        let message = format!(
            "cannot find symbol\n  symbol:   {symbol}\n  location: class {}",
            self.wrapper
        );
        self.error(message, span);
    }

    // === Types ===

    /// Qualified name of the class `name` refers to.
    fn resolve_class(&self, name: &str) -> Option<String> {
        let pending = self.pending_class.as_ref().is_some_and(|(n, _)| n == name);
        if pending || self.env.classes.contains_key(name) || self.host.contains(name) {
            return Some(name.to_owned());
        }
        let qualified = format!("{LANG_PACKAGE}{name}");
        self.host.contains(&qualified).then_some(qualified)
    }

    fn resolve_type(&mut self, ty: &TypeRef, span: Span) -> Ty {
        match ty {
            TypeRef::Int => Ty::Int,
            TypeRef::Boolean => Ty::Boolean,
            TypeRef::Str => Ty::Str,
            TypeRef::Void => Ty::Void,
            TypeRef::Infer => Ty::Error,
            TypeRef::Class(name) => match self.resolve_class(name) {
                Some(qualified) => Ty::Class(qualified),
                None => {
                    self.cannot_find(&format!("class {name}"), span);
                    Ty::Error
                }
            },
        }
    }

    fn exception_type(&self, ty: &Ty) -> Option<ExceptionType> {
        let Ty::Class(name) = ty else { return None };
        let class = self.host.exception_type(name)?;
        class.downcast_body::<ExceptionType>().cloned()
    }

    fn is_throwable(&self, ty: &Ty) -> bool {
        matches!(ty, Ty::Null | Ty::Error) || self.exception_type(ty).is_some()
    }

    fn class_sig(&self, name: &str) -> Option<&ClassSig> {
        match &self.pending_class {
            Some((pending, sig)) if pending == name => Some(sig),
            _ => self.env.classes.get(name),
        }
    }

    fn require_assignable(&mut self, from: &Ty, to: &Ty, span: Span) {
        if !assignable(from, to) {
            self.error(
                format!("incompatible types: {from} cannot be converted to {to}"),
                span,
            );
        }
    }

    // === Declarations ===

    fn class_decl(&mut self, class: &ClassDecl) -> ClassSig {
        self.pending_class = Some((class.name.clone(), ClassSig::default()));
        let mut sig = ClassSig::default();
        for method in &class.methods {
            let method_sig = self.method_sig(method);
            if sig.methods.contains_key(&method.name) {
                self.error(
                    format!(
                        "method {}() is already defined in class {}",
                        method.name, class.name
                    ),
                    method.name_span,
                );
                continue;
            }
            sig.methods.insert(method.name.clone(), method_sig);
        }
        self.pending_class = Some((class.name.clone(), sig.clone()));
        for method in &class.methods {
            if let Some(method_sig) = sig.methods.get(&method.name) {
                self.method_body(method, method_sig);
            }
        }
        sig
    }

    fn method_sig(&mut self, method: &MethodDecl) -> MethodSig {
        let params = method
            .params
            .iter()
            .map(|p| self.resolve_type(&p.ty, method.name_span))
            .collect();
        let ret = self.resolve_type(&method.ret, method.name_span);
        MethodSig { params, ret }
    }

    fn method_body(&mut self, method: &MethodDecl, sig: &MethodSig) {
        self.scope = Scope {
            locals: FxHashMap::default(),
            ret: Some(sig.ret.clone()),
            owner: format!("method {}({})", method.name, join(&sig.params)),
        };
        for (param, ty) in method.params.iter().zip(&sig.params) {
            if self.scope.locals.contains_key(&param.name) {
                let message = format!(
                    "variable {} is already defined in {}",
                    param.name, self.scope.owner
                );
                self.error(message, method.name_span);
            }
            self.scope
                .locals
                .insert(param.name.clone(), (ty.clone(), true));
        }

        let mut exited = false;
        for stmt in &method.body {
            if exited {
                self.error("unreachable statement", stmt_span(stmt));
                break;
            }
            self.stmt(stmt);
            exited = stmt.exits();
        }
        if !exited && !matches!(sig.ret, Ty::Void | Ty::Error) {
            self.error("missing return statement", method.name_span);
        }
        self.scope = Scope::default();
    }

    /// Type of the variable `decl` binds. Top-level bindings without an
    /// initializer start at their type's default value.
    fn var_decl(&mut self, decl: &VarDecl, top_level: bool) -> Ty {
        let init_ty = decl.init.as_ref().map(|init| self.expr(init));
        let ty = if decl.ty == TypeRef::Infer {
            match &init_ty {
                None => {
                    self.error(
                        format!(
                            "cannot infer type for local variable {}\n  \
                             (cannot use 'var' on variable without initializer)",
                            decl.name
                        ),
                        decl.span,
                    );
                    Ty::Error
                }
                Some(ty @ (Ty::Null | Ty::Void)) => {
                    let shown = if *ty == Ty::Null { "null" } else { "void" };
                    self.error(
                        format!(
                            "cannot infer type for local variable {}\n  \
                             (variable initializer is '{shown}')",
                            decl.name
                        ),
                        decl.span,
                    );
                    Ty::Error
                }
                Some(ty) => ty.clone(),
            }
        } else {
            let declared = self.resolve_type(&decl.ty, decl.span);
            if declared == Ty::Void {
                self.error("'void' type not allowed here", decl.span);
                return Ty::Error;
            }
            if let (Some(init), Some(init_ty)) = (&decl.init, &init_ty) {
                self.require_assignable(init_ty, &declared, init.span);
            }
            declared
        };

        if !top_level {
            if self.scope.locals.contains_key(&decl.name) {
                let message = format!(
                    "variable {} is already defined in {}",
                    decl.name, self.scope.owner
                );
                self.error(message, decl.span);
            }
            self.scope
                .locals
                .insert(decl.name.clone(), (ty.clone(), decl.init.is_some()));
        }
        ty
    }

    // === Statements ===

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Var(decl) => {
                self.var_decl(decl, false);
            }
            Stmt::Return { value, span, .. } => {
                let ret = self.scope.ret.clone().unwrap_or(Ty::Void);
                match value {
                    Some(value) => {
                        let ty = self.expr(value);
                        if ret == Ty::Void {
                            self.error("incompatible types: unexpected return value", value.span);
                        } else {
                            self.require_assignable(&ty, &ret, value.span);
                        }
                    }
                    None if !matches!(ret, Ty::Void | Ty::Error) => {
                        self.error("incompatible types: missing return value", *span);
                    }
                    None => {}
                }
            }
            Stmt::Throw { value, .. } => {
                let ty = self.expr(value);
                if !self.is_throwable(&ty) {
                    self.error(
                        format!("incompatible types: {ty} cannot be converted to Throwable"),
                        value.span,
                    );
                }
            }
            Stmt::Expr { value, .. } => {
                if !matches!(
                    value.kind,
                    ExprKind::Call { .. } | ExprKind::MethodCall { .. } | ExprKind::New { .. }
                ) {
                    self.error("not a statement", value.span);
                }
                self.expr(value);
            }
        }
    }

    // === Expressions ===

    fn expr(&mut self, expr: &Expr) -> Ty {
        ensure_sufficient_stack(|| self.expr_inner(expr))
    }

    fn expr_inner(&mut self, expr: &Expr) -> Ty {
        match &expr.kind {
            ExprKind::Int(_) => Ty::Int,
            ExprKind::Str(_) => Ty::Str,
            ExprKind::Bool(_) => Ty::Boolean,
            ExprKind::Null => Ty::Null,
            ExprKind::Name(name) => self.name(name, expr.span),
            ExprKind::Neg(operand) => {
                let ty = self.expr(operand);
                if !matches!(ty, Ty::Int | Ty::Error) {
                    self.error(
                        format!("bad operand type {ty} for unary operator '-'"),
                        expr.span,
                    );
                    return Ty::Error;
                }
                Ty::Int
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs_ty = self.expr(lhs);
                let rhs_ty = self.expr(rhs);
                self.binary(*op, &lhs_ty, &rhs_ty, expr.span)
            }
            ExprKind::Call { name, args } => self.call(name, args, expr.span),
            ExprKind::New { class, args } => self.new_instance(class, args, expr.span),
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => {
                let receiver_ty = self.expr(receiver);
                let arg_tys = self.args(args);
                self.method_call(&receiver_ty, method, &arg_tys, expr.span)
            }
        }
    }

    fn args(&mut self, args: &[Expr]) -> Vec<Ty> {
        args.iter().map(|arg| self.expr(arg)).collect()
    }

    fn name(&mut self, name: &str, span: Span) -> Ty {
        if let Some((ty, initialized)) = self.scope.locals.get(name).cloned() {
            if !initialized {
                self.error(
                    format!("variable {name} might not have been initialized"),
                    span,
                );
            }
            return ty;
        }
        if let Some(ty) = self.env.vars.get(name) {
            return ty.clone();
        }
        self.cannot_find(&format!("variable {name}"), span);
        Ty::Error
    }

    fn binary(&mut self, op: BinaryOp, lhs: &Ty, rhs: &Ty, span: Span) -> Ty {
        if *lhs == Ty::Error || *rhs == Ty::Error {
            return Ty::Error;
        }
        if *lhs == Ty::Void || *rhs == Ty::Void {
            self.error("'void' type not allowed here", span);
            return Ty::Error;
        }
        match (op, lhs, rhs) {
            (_, Ty::Int, Ty::Int) => Ty::Int,
            (BinaryOp::Add, Ty::Str, _) | (BinaryOp::Add, _, Ty::Str) => Ty::Str,
            _ => {
                self.error(
                    format!(
                        "bad operand types for binary operator '{}'\n  \
                         first type:  {lhs}\n  second type: {rhs}",
                        op.symbol()
                    ),
                    span,
                );
                Ty::Error
            }
        }
    }

    fn call(&mut self, name: &str, args: &[Expr], span: Span) -> Ty {
        let arg_tys = self.args(args);
        let sig = match &self.pending_method {
            Some((pending, sig)) if pending == name => Some(sig.clone()),
            _ => self.env.methods.get(name).cloned(),
        };
        let Some(sig) = sig else {
            if name == "println" {
                return self.println(&arg_tys, span);
            }
            self.cannot_find(&format!("method {name}({})", join(&arg_tys)), span);
            return Ty::Error;
        };
        self.apply(&format!("method {name} in class {}", self.wrapper), &sig, &arg_tys, span)
    }

    fn println(&mut self, arg_tys: &[Ty], span: Span) -> Ty {
        match arg_tys {
            [] => {}
            [Ty::Void] => self.error("'void' type not allowed here", span),
            [_] => {}
            _ => self.cannot_find(&format!("method println({})", join(arg_tys)), span),
        }
        Ty::Void
    }

    /// Check arguments against `sig`; the call's type is the return type.
    fn apply(&mut self, what: &str, sig: &MethodSig, arg_tys: &[Ty], span: Span) -> Ty {
        let fits = sig.params.len() == arg_tys.len()
            && arg_tys.iter().zip(&sig.params).all(|(a, p)| assignable(a, p));
        if !fits {
            let reason = if sig.params.len() == arg_tys.len() {
                "argument mismatch"
            } else {
                "actual and formal argument lists differ in length"
            };
            let required = if sig.params.is_empty() {
                "no arguments".to_owned()
            } else {
                join(&sig.params)
            };
            let found = if arg_tys.is_empty() {
                "no arguments".to_owned()
            } else {
                join(arg_tys)
            };
            self.error(
                format!(
                    "{what} cannot be applied to given types;\n  required: {required}\n  \
                     found:    {found}\n  reason: {reason}"
                ),
                span,
            );
        }
        sig.ret.clone()
    }

    fn new_instance(&mut self, class: &str, args: &[Expr], span: Span) -> Ty {
        let arg_tys = self.args(args);
        let Some(qualified) = self.resolve_class(class) else {
            self.cannot_find(&format!("class {class}"), span);
            return Ty::Error;
        };
        let ty = Ty::Class(qualified);
        if let Some(exception) = self.exception_type(&ty) {
            let shape = constructor_shape(&arg_tys, |t| self.is_throwable(t));
            if !shape.is_some_and(|s| exception.has_constructor(s)) {
                self.error(
                    format!("no suitable constructor found for {class}({})", join(&arg_tys)),
                    span,
                );
            }
        } else if !arg_tys.is_empty() {
            let sig = MethodSig {
                params: Vec::new(),
                ret: ty.clone(),
            };
            self.apply(&format!("constructor {class} in class {class}"), &sig, &arg_tys, span);
        }
        ty
    }

    fn method_call(&mut self, receiver: &Ty, method: &str, arg_tys: &[Ty], span: Span) -> Ty {
        let builtin = match (receiver, method) {
            (Ty::Error, _) => return Ty::Error,
            (Ty::Int | Ty::Boolean | Ty::Void | Ty::Null, _) => {
                self.error(format!("{receiver} cannot be dereferenced"), span);
                return Ty::Error;
            }
            (Ty::Str, "length") => Some(MethodSig {
                params: Vec::new(),
                ret: Ty::Int,
            }),
            (_, "toString") => Some(MethodSig {
                params: Vec::new(),
                ret: Ty::Str,
            }),
            (_, "getMessage") if self.exception_type(receiver).is_some() => Some(MethodSig {
                params: Vec::new(),
                ret: Ty::Str,
            }),
            _ => None,
        };
        let declared = match receiver {
            Ty::Class(name) => self
                .class_sig(name)
                .and_then(|sig| sig.methods.get(method))
                .cloned(),
            _ => None,
        };
        let Some(sig) = declared.or(builtin) else {
            let message = format!(
                "cannot find symbol\n  symbol:   method {method}({})\n  location: class {receiver}",
                join(arg_tys)
            );
            self.error(message, span);
            return Ty::Error;
        };
        self.apply(&format!("method {method} in class {receiver}"), &sig, arg_tys, span)
    }
}

/// Exception constructor shape matching argument types, if any.
pub fn constructor_shape(
    arg_tys: &[Ty],
    is_throwable: impl Fn(&Ty) -> bool,
) -> Option<ConstructorShape> {
    let is_string = |t: &Ty| matches!(t, Ty::Str | Ty::Null | Ty::Error);
    match arg_tys {
        [] => Some(ConstructorShape::NoArgs),
        [message] if is_string(message) => Some(ConstructorShape::Message),
        [cause] if is_throwable(cause) => Some(ConstructorShape::Cause),
        [message, cause] if is_string(message) && is_throwable(cause) => {
            Some(ConstructorShape::MessageCause)
        }
        _ => None,
    }
}

/// Can a value of type `from` be stored where `to` is expected?
pub fn assignable(from: &Ty, to: &Ty) -> bool {
    from == to
        || matches!(from, Ty::Error)
        || matches!(to, Ty::Error)
        || (*from == Ty::Null && to.is_reference())
        || (from.is_reference() && matches!(to, Ty::Class(name) if name == OBJECT_CLASS))
}

fn join(tys: &[Ty]) -> String {
    tys.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

fn stmt_span(stmt: &Stmt) -> Span {
    match stmt {
        Stmt::Var(decl) => decl.span,
        Stmt::Return { span, .. } | Stmt::Throw { span, .. } => *span,
        Stmt::Expr { value, .. } => value.span,
    }
}
