//! Recursive descent parser for one complete unit.
//!
//! Errors stop the parse at the first problem and come back as a [`Diag`]
//! with javac's wording, spanned against the unit source.

use kiln_diagnostic::span_utils::LineOffsetTable;
use kiln_diagnostic::{Diag, Span};

use crate::ast::{
    BinaryOp, ClassDecl, Expr, ExprKind, Item, MethodDecl, Param, Stmt, TypeRef, VarDecl,
};
use crate::lexer::{lex, Token, TokenKind};
use crate::stack::ensure_sufficient_stack;

/// Parse `source` as exactly one top-level item.
pub fn parse_unit(source: &str) -> Result<Item, Diag> {
    let mut parser = Parser::new(source);
    let item = parser.item()?;
    match parser.cursor.current() {
        None => Ok(item),
        Some(token) => Err(Diag::new(
            "class, interface, enum, or record expected",
            token.span,
        )),
    }
}

/// Token access and lookahead.
struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
    source_len: u32,
}

impl Cursor {
    fn current(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn current_kind(&self) -> Option<TokenKind> {
        self.current().map(|t| t.kind)
    }

    fn peek_kind(&self, ahead: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + ahead).map(|t| t.kind)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == Some(kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.current();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Zero-width span just after the last consumed token.
    fn after_previous(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(prev) => Span::point(prev.span.end),
            None => Span::point(0),
        }
    }

    fn previous_end(&self) -> u32 {
        self.after_previous().end
    }

    fn current_span(&self) -> Span {
        self.current()
            .map_or(Span::point(self.source_len), |t| t.span)
    }
}

struct Parser<'src> {
    source: &'src str,
    cursor: Cursor,
    lines: LineOffsetTable,
}

impl<'src> Parser<'src> {
    fn new(source: &'src str) -> Self {
        Parser {
            source,
            cursor: Cursor {
                tokens: lex(source),
                pos: 0,
                source_len: u32::try_from(source.len()).unwrap_or(u32::MAX),
            },
            lines: LineOffsetTable::build(source),
        }
    }

    fn line_at(&self, span: Span) -> u32 {
        self.lines.line_from_offset(span.start)
    }

    fn text(&self, token: Token) -> &'src str {
        token.text(self.source)
    }

    // === Errors ===

    /// Error for the current token when something else was needed.
    fn unexpected(&self, expected: &str) -> Diag {
        match self.cursor.current() {
            Some(token) if token.kind == TokenKind::Error => Diag::new(
                format!("illegal character: '{}'", self.text(token)),
                token.span,
            ),
            Some(token) if token.kind == TokenKind::UnterminatedStr => {
                Diag::new("unclosed string literal", token.span)
            }
            Some(token) if token.kind == TokenKind::UnterminatedComment => {
                Diag::new("unclosed comment", token.span)
            }
            Some(_) => Diag::new(format!("{expected} expected"), self.cursor.after_previous()),
            None => Diag::new(
                "reached end of file while parsing",
                self.cursor.after_previous(),
            ),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Diag> {
        match self.cursor.current() {
            Some(token) if token.kind == kind => {
                self.cursor.advance();
                Ok(token)
            }
            _ => Err(self.unexpected(kind.describe())),
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Span), Diag> {
        let token = self.expect(TokenKind::Ident)?;
        Ok((self.text(token).to_owned(), token.span))
    }

    // === Items ===

    fn item(&mut self) -> Result<Item, Diag> {
        let item = if self.cursor.check(TokenKind::Class) {
            Item::Class(self.class_decl()?)
        } else if self.at_declaration() && self.cursor.peek_kind(2) == Some(TokenKind::LParen) {
            Item::Method(self.method_decl()?)
        } else {
            return Ok(Item::Stmt(self.statement(true)?));
        };
        self.cursor.eat(TokenKind::Semicolon);
        Ok(item)
    }

    fn class_decl(&mut self) -> Result<ClassDecl, Diag> {
        self.expect(TokenKind::Class)?;
        let (name, name_span) = self.expect_ident()?;
        self.expect(TokenKind::LBrace)?;
        let mut methods = Vec::new();
        while !self.cursor.eat(TokenKind::RBrace) {
            if self.cursor.at_end() {
                return Err(self.unexpected("'}'"));
            }
            if !self.at_declaration() {
                return Err(Diag::new("illegal start of type", self.cursor.current_span()));
            }
            methods.push(self.method_decl()?);
        }
        Ok(ClassDecl {
            name,
            methods,
            name_span,
        })
    }

    fn method_decl(&mut self) -> Result<MethodDecl, Diag> {
        let ret = self.type_ref()?;
        let (name, name_span) = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.cursor.eat(TokenKind::RParen) {
            loop {
                let start = self.cursor.current_span();
                let ty = self.type_ref()?;
                if ty == TypeRef::Infer {
                    return Err(Diag::new("'var' is not allowed here", start));
                }
                let (name, _) = self.expect_ident()?;
                params.push(Param { ty, name });
                if self.cursor.eat(TokenKind::RParen) {
                    break;
                }
                self.expect(TokenKind::Comma)?;
            }
        }
        let body = self.block()?;
        Ok(MethodDecl {
            ret,
            name,
            params,
            body,
            name_span,
        })
    }

    fn block(&mut self) -> Result<Vec<Stmt>, Diag> {
        self.expect(TokenKind::LBrace)?;
        let mut body = Vec::new();
        while !self.cursor.eat(TokenKind::RBrace) {
            if self.cursor.at_end() {
                return Err(self.unexpected("'}'"));
            }
            body.push(self.statement(false)?);
        }
        Ok(body)
    }

    /// Does a `type name` pair start here?
    fn at_declaration(&self) -> bool {
        match self.cursor.current_kind() {
            Some(
                TokenKind::IntType
                | TokenKind::BooleanType
                | TokenKind::StringType
                | TokenKind::VoidType
                | TokenKind::Var,
            ) => true,
            Some(TokenKind::Ident) => self.cursor.peek_kind(1) == Some(TokenKind::Ident),
            _ => false,
        }
    }

    fn type_ref(&mut self) -> Result<TypeRef, Diag> {
        let ty = match self.cursor.current_kind() {
            Some(TokenKind::IntType) => TypeRef::Int,
            Some(TokenKind::BooleanType) => TypeRef::Boolean,
            Some(TokenKind::StringType) => TypeRef::Str,
            Some(TokenKind::VoidType) => TypeRef::Void,
            Some(TokenKind::Var) => TypeRef::Infer,
            Some(TokenKind::Ident) => {
                let (name, _) = self.expect_ident()?;
                return Ok(TypeRef::Class(name));
            }
            _ => return Err(self.unexpected("<identifier>")),
        };
        self.cursor.advance();
        Ok(ty)
    }

    // === Statements ===

    /// One statement. At top level the final `;` may be left off.
    fn statement(&mut self, top_level: bool) -> Result<Stmt, Diag> {
        let start = self.cursor.current_span();
        let line = self.line_at(start);
        let stmt = match self.cursor.current_kind() {
            Some(TokenKind::Return) => {
                self.cursor.advance();
                let value = if self.cursor.check(TokenKind::Semicolon) || self.cursor.at_end() {
                    None
                } else {
                    Some(self.expr()?)
                };
                let span = Span::new(start.start, self.cursor.previous_end());
                Stmt::Return { value, span, line }
            }
            Some(TokenKind::Throw) => {
                self.cursor.advance();
                let value = self.expr()?;
                let span = Span::new(start.start, self.cursor.previous_end());
                Stmt::Throw { value, span, line }
            }
            _ if self.at_declaration() => {
                let ty = self.type_ref()?;
                let (name, _) = self.expect_ident()?;
                let init = if self.cursor.eat(TokenKind::Eq) {
                    Some(self.expr()?)
                } else {
                    None
                };
                let span = Span::new(start.start, self.cursor.previous_end());
                Stmt::Var(VarDecl {
                    ty,
                    name,
                    init,
                    span,
                    line,
                })
            }
            _ => Stmt::Expr {
                value: self.expr()?,
                line,
            },
        };
        if !self.cursor.eat(TokenKind::Semicolon) && !(top_level && self.cursor.at_end()) {
            return Err(self.unexpected("';'"));
        }
        Ok(stmt)
    }

    // === Expressions ===

    fn expr(&mut self) -> Result<Expr, Diag> {
        ensure_sufficient_stack(|| self.additive())
    }

    fn additive(&mut self) -> Result<Expr, Diag> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.cursor.current_kind() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.cursor.advance();
            let rhs = self.multiplicative()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, Diag> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.cursor.current_kind() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                Some(TokenKind::Percent) => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.cursor.advance();
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn unary(&mut self) -> Result<Expr, Diag> {
        let Some(minus) = self.cursor.current().filter(|t| t.kind == TokenKind::Minus) else {
            return self.postfix();
        };
        self.cursor.advance();
        // -2147483648 only fits once the sign is attached.
        if let Some(token) = self.cursor.current() {
            if token.kind == TokenKind::Int && self.text(token) == "2147483648" {
                self.cursor.advance();
                return Ok(Expr {
                    kind: ExprKind::Int(i32::MIN),
                    span: minus.span.merge(token.span),
                });
            }
        }
        let operand = ensure_sufficient_stack(|| self.unary())?;
        let span = minus.span.merge(operand.span);
        Ok(Expr {
            kind: ExprKind::Neg(Box::new(operand)),
            span,
        })
    }

    fn postfix(&mut self) -> Result<Expr, Diag> {
        let mut expr = self.primary()?;
        while self.cursor.eat(TokenKind::Dot) {
            let (method, _) = self.expect_ident()?;
            self.expect(TokenKind::LParen)?;
            let args = self.args()?;
            let span = Span::new(expr.span.start, self.cursor.previous_end());
            expr = Expr {
                kind: ExprKind::MethodCall {
                    receiver: Box::new(expr),
                    method,
                    args,
                },
                span,
            };
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, Diag> {
        let Some(token) = self.cursor.current() else {
            return Err(self.unexpected("<expression>"));
        };
        let kind = match token.kind {
            TokenKind::Int => match self.text(token).parse::<i32>() {
                Ok(value) => ExprKind::Int(value),
                Err(_) => return Err(Diag::new("integer number too large", token.span)),
            },
            TokenKind::Str => ExprKind::Str(unescape(self.text(token), token.span)?),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Null => ExprKind::Null,
            TokenKind::Ident => {
                let name = self.text(token).to_owned();
                self.cursor.advance();
                if !self.cursor.eat(TokenKind::LParen) {
                    return Ok(Expr {
                        kind: ExprKind::Name(name),
                        span: token.span,
                    });
                }
                let args = self.args()?;
                return Ok(Expr {
                    kind: ExprKind::Call { name, args },
                    span: Span::new(token.span.start, self.cursor.previous_end()),
                });
            }
            TokenKind::New => {
                self.cursor.advance();
                let (class, _) = self.expect_ident()?;
                self.expect(TokenKind::LParen)?;
                let args = self.args()?;
                return Ok(Expr {
                    kind: ExprKind::New { class, args },
                    span: Span::new(token.span.start, self.cursor.previous_end()),
                });
            }
            TokenKind::LParen => {
                self.cursor.advance();
                let inner = self.expr()?;
                self.expect(TokenKind::RParen)?;
                return Ok(Expr {
                    kind: inner.kind,
                    span: Span::new(token.span.start, self.cursor.previous_end()),
                });
            }
            TokenKind::Error | TokenKind::UnterminatedStr | TokenKind::UnterminatedComment => {
                return Err(self.unexpected("<expression>"));
            }
            _ => return Err(Diag::new("illegal start of expression", token.span)),
        };
        self.cursor.advance();
        Ok(Expr {
            kind,
            span: token.span,
        })
    }

    /// Arguments after an already-consumed `(`, through the `)`.
    fn args(&mut self) -> Result<Vec<Expr>, Diag> {
        let mut args = Vec::new();
        if self.cursor.eat(TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            if self.cursor.eat(TokenKind::RParen) {
                return Ok(args);
            }
            self.expect(TokenKind::Comma)?;
        }
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    let span = lhs.span.merge(rhs.span);
    Expr {
        kind: ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        span,
    }
}

/// Contents of a quoted string literal with escapes resolved.
fn unescape(literal: &str, span: Span) -> Result<String, Diag> {
    let inner = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(literal);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(c @ ('"' | '\'' | '\\')) => out.push(c),
            _ => return Err(Diag::new("illegal escape character", span)),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests;
