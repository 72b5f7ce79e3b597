//! Tokenizer for snippet source, built on logos.
//!
//! Whitespace and comments are skipped. Unterminated string literals and
//! block comments come out as their own token kinds so completeness analysis
//! can tell "keep typing" apart from "this is wrong".

use kiln_diagnostic::Span;
use logos::{Filter, Logos};

#[derive(Logos, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\r\n]*")]
pub enum TokenKind {
    // === Keywords ===
    #[token("class")]
    Class,
    #[token("new")]
    New,
    #[token("return")]
    Return,
    #[token("throw")]
    Throw,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // === Type keywords ===
    #[token("int")]
    IntType,
    #[token("boolean")]
    BooleanType,
    #[token("String")]
    StringType,
    #[token("void")]
    VoidType,
    #[token("var")]
    Var,

    // === Symbols ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,
    #[token("=")]
    Eq,

    // === Operators ===
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    // === Literals ===
    #[regex(r"[0-9]+")]
    Int,
    #[regex(r#""([^"\\\r\n]|\\[^\r\n])*""#)]
    Str,
    #[regex(r#""([^"\\\r\n]|\\[^\r\n])*"#)]
    UnterminatedStr,

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Ident,

    /// `/*` with no closing `*/`; terminated block comments are skipped.
    #[token("/*", block_comment)]
    UnterminatedComment,

    /// Any character the language does not use.
    Error,
}

fn block_comment(lex: &mut logos::Lexer<TokenKind>) -> Filter<()> {
    if let Some(end) = lex.remainder().find("*/") {
        lex.bump(end + 2);
        Filter::Skip
    } else {
        lex.bump(lex.remainder().len());
        Filter::Emit(())
    }
}

impl TokenKind {
    /// Binary operators, `=`, `,` and `.` cannot end a unit.
    pub fn expects_continuation(self) -> bool {
        matches!(
            self,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Slash
                | TokenKind::Percent
                | TokenKind::Eq
                | TokenKind::Comma
                | TokenKind::Dot
        )
    }

    /// How the token reads in "expected" messages.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Class => "class",
            TokenKind::New => "new",
            TokenKind::Return => "return",
            TokenKind::Throw => "throw",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::IntType => "int",
            TokenKind::BooleanType => "boolean",
            TokenKind::StringType => "String",
            TokenKind::VoidType => "void",
            TokenKind::Var => "var",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Comma => "','",
            TokenKind::Semicolon => "';'",
            TokenKind::Dot => "'.'",
            TokenKind::Eq => "'='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Int => "<integer>",
            TokenKind::Str | TokenKind::UnterminatedStr => "<string>",
            TokenKind::Ident => "<identifier>",
            TokenKind::UnterminatedComment => "<comment>",
            TokenKind::Error => "<illegal character>",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.span.to_range()).unwrap_or_default()
    }
}

/// Tokenize `source`. Never fails; bad characters become [`TokenKind::Error`].
pub fn lex(source: &str) -> Vec<Token> {
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let kind = result.unwrap_or(TokenKind::Error);
        tokens.push(Token {
            kind,
            span: Span::from_range(lexer.span()),
        });
    }
    tokens
}

#[cfg(test)]
mod tests;
