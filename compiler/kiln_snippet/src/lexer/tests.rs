use super::*;
use pretty_assertions::assert_eq;

fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source).into_iter().map(|t| t.kind).collect()
}

#[test]
fn test_variable_declaration() {
    assert_eq!(
        kinds("int x = 5;"),
        vec![
            TokenKind::IntType,
            TokenKind::Ident,
            TokenKind::Eq,
            TokenKind::Int,
            TokenKind::Semicolon,
        ]
    );
}

#[test]
fn test_keywords_are_not_identifiers() {
    assert_eq!(kinds("class classy"), vec![TokenKind::Class, TokenKind::Ident]);
}

#[test]
fn test_dollar_identifiers() {
    let source = "$1 + x";
    let tokens = lex(source);
    assert_eq!(tokens[0].kind, TokenKind::Ident);
    assert_eq!(tokens[0].text(source), "$1");
}

#[test]
fn test_comments_are_skipped() {
    assert_eq!(
        kinds("1 // trailing\n/* block */ 2"),
        vec![TokenKind::Int, TokenKind::Int]
    );
}

#[test]
fn test_unterminated_comment() {
    assert_eq!(
        kinds("1 /* still going"),
        vec![TokenKind::Int, TokenKind::UnterminatedComment]
    );
}

#[test]
fn test_strings() {
    assert_eq!(kinds(r#""a \"b\" c""#), vec![TokenKind::Str]);
    assert_eq!(kinds(r#""open"#), vec![TokenKind::UnterminatedStr]);
}

#[test]
fn test_illegal_character() {
    assert_eq!(kinds("#exit"), vec![TokenKind::Error, TokenKind::Ident]);
}

#[test]
fn test_spans_are_byte_offsets() {
    let tokens = lex("int  y");
    assert_eq!(tokens[1].span, Span::new(5, 6));
}
