//! Snippet syntax tree.
//!
//! Method bodies travel inside class files, so the tree is serializable.
//! Statements carry the 1-based line they start on within their snippet;
//! stack frames report it.

use std::fmt;

use kiln_diagnostic::Span;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    Int,
    Boolean,
    Str,
    Void,
    /// `var`: take the initializer's type.
    Infer,
    Class(String),
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Int => f.write_str("int"),
            TypeRef::Boolean => f.write_str("boolean"),
            TypeRef::Str => f.write_str("String"),
            TypeRef::Void => f.write_str("void"),
            TypeRef::Infer => f.write_str("var"),
            TypeRef::Class(name) => f.write_str(name),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExprKind {
    Int(i32),
    Str(String),
    Bool(bool),
    Null,
    Name(String),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `f(args)`, including the builtin `println`.
    Call {
        name: String,
        args: Vec<Expr>,
    },
    New {
        class: String,
        args: Vec<Expr>,
    },
    MethodCall {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarDecl {
    pub ty: TypeRef,
    pub name: String,
    pub init: Option<Expr>,
    pub span: Span,
    pub line: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stmt {
    Var(VarDecl),
    Return {
        value: Option<Expr>,
        span: Span,
        line: u32,
    },
    Throw {
        value: Expr,
        span: Span,
        line: u32,
    },
    Expr {
        value: Expr,
        line: u32,
    },
}

impl Stmt {
    pub fn line(&self) -> u32 {
        match self {
            Stmt::Var(decl) => decl.line,
            Stmt::Return { line, .. } | Stmt::Throw { line, .. } | Stmt::Expr { line, .. } => *line,
        }
    }

    /// Whether control never falls through past this statement.
    pub fn exits(&self) -> bool {
        matches!(self, Stmt::Return { .. } | Stmt::Throw { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub ty: TypeRef,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub ret: TypeRef,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    /// Span of the name, for diagnostics.
    pub name_span: Span,
}

impl MethodDecl {
    /// `int area(int, int)`
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.ty.to_string()).collect();
        format!("{} {}({})", self.ret, self.name, params.join(", "))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    pub methods: Vec<MethodDecl>,
    pub name_span: Span,
}

/// One top-level unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Item {
    Class(ClassDecl),
    Method(MethodDecl),
    Stmt(Stmt),
}
