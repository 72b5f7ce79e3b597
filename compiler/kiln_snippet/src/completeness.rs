//! Where does the first unit of some input end?
//!
//! A unit ends at the first `;` outside braces, or at the `}` that closes a
//! top-level block (plus a `;` directly after it). Input ending inside a
//! block, a parenthesised list, a string or comment, or right after an
//! operator is incomplete. Everything else is complete as typed; a missing
//! final `;` is fine.

use kiln_repl::CompletionInfo;

use crate::lexer::{lex, Token, TokenKind};

pub fn analyze(source: &str) -> CompletionInfo {
    let tokens = lex(source);
    let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
        return CompletionInfo::empty();
    };
    let start = first.span.start as usize;
    let complete_at = |end: usize| {
        CompletionInfo::complete(
            source.get(start..end).unwrap_or_default(),
            source.get(end..).unwrap_or_default(),
        )
    };

    let mut braces = 0i32;
    let mut parens = 0i32;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::UnterminatedComment => return CompletionInfo::incomplete(),
            TokenKind::UnterminatedStr if i + 1 == tokens.len() => {
                return CompletionInfo::incomplete();
            }
            TokenKind::LBrace => braces += 1,
            TokenKind::RBrace => {
                braces -= 1;
                if braces == 0 && parens <= 0 {
                    return complete_at(block_end(token, tokens.get(i + 1)));
                }
            }
            TokenKind::LParen => parens += 1,
            TokenKind::RParen => parens -= 1,
            TokenKind::Semicolon if braces <= 0 && parens <= 0 => {
                return complete_at(token.span.end as usize);
            }
            _ => {}
        }
    }

    if braces > 0 || parens > 0 || last.kind.expects_continuation() {
        return CompletionInfo::incomplete();
    }
    complete_at(source.len())
}

/// End of a block unit: after its `}`, or after a `;` that follows directly.
fn block_end(close: &Token, next: Option<&Token>) -> usize {
    match next {
        Some(next) if next.kind == TokenKind::Semicolon => next.span.end as usize,
        _ => close.span.end as usize,
    }
}
