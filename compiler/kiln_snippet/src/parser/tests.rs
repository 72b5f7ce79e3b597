#![allow(clippy::unwrap_used)]

use super::*;
use pretty_assertions::assert_eq;

fn stmt(source: &str) -> Stmt {
    match parse_unit(source).unwrap() {
        Item::Stmt(stmt) => stmt,
        other => panic!("expected a statement, got {other:?}"),
    }
}

fn error(source: &str) -> Diag {
    parse_unit(source).unwrap_err()
}

#[test]
fn test_variable_declaration() {
    let Stmt::Var(decl) = stmt("int x = 5;") else {
        panic!("not a declaration");
    };
    assert_eq!(decl.ty, TypeRef::Int);
    assert_eq!(decl.name, "x");
    assert_eq!(decl.init.map(|e| e.kind), Some(ExprKind::Int(5)));
    assert_eq!(decl.span, Span::new(0, 9));
}

#[test]
fn test_trailing_semicolon_is_optional_at_top_level() {
    assert!(matches!(stmt("x + 1"), Stmt::Expr { .. }));
}

#[test]
fn test_precedence() {
    let Stmt::Expr { value, .. } = stmt("1 + 2 * 3") else {
        panic!("not an expression");
    };
    let ExprKind::Binary { op, rhs, .. } = value.kind else {
        panic!("not binary");
    };
    assert_eq!(op, BinaryOp::Add);
    assert!(matches!(
        rhs.kind,
        ExprKind::Binary {
            op: BinaryOp::Mul,
            ..
        }
    ));
}

#[test]
fn test_min_int_literal() {
    let Stmt::Expr { value, .. } = stmt("-2147483648") else {
        panic!("not an expression");
    };
    assert_eq!(value.kind, ExprKind::Int(i32::MIN));
}

#[test]
fn test_method_declaration() {
    let Item::Method(method) = parse_unit("int add(int a, int b) { return a + b; }").unwrap()
    else {
        panic!("not a method");
    };
    assert_eq!(method.signature(), "int add(int, int)");
    assert_eq!(method.body.len(), 1);
    assert_eq!(method.name_span, Span::new(4, 7));
}

#[test]
fn test_class_declaration_with_methods() {
    let source = "class Foo {\n  int one() { return 1; }\n  String hi() { return \"hi\"; }\n}";
    let Item::Class(class) = parse_unit(source).unwrap() else {
        panic!("not a class");
    };
    assert_eq!(class.name, "Foo");
    let names: Vec<&str> = class.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["one", "hi"]);
    assert_eq!(class.methods[1].body[0].line(), 3);
}

#[test]
fn test_class_typed_variable() {
    let Stmt::Var(decl) = stmt("Foo f = new Foo()") else {
        panic!("not a declaration");
    };
    assert_eq!(decl.ty, TypeRef::Class("Foo".to_string()));
}

#[test]
fn test_method_call_chain() {
    let Stmt::Expr { value, .. } = stmt("new Foo().bar(1).baz()") else {
        panic!("not an expression");
    };
    let ExprKind::MethodCall { method, receiver, .. } = value.kind else {
        panic!("not a method call");
    };
    assert_eq!(method, "baz");
    assert!(matches!(receiver.kind, ExprKind::MethodCall { .. }));
}

#[test]
fn test_string_escapes() {
    let Stmt::Expr { value, .. } = stmt(r#""a\tb\"c""#) else {
        panic!("not an expression");
    };
    assert_eq!(value.kind, ExprKind::Str("a\tb\"c".to_string()));
}

#[test]
fn test_illegal_character() {
    let diag = error("#exit");
    assert_eq!(diag.message, "illegal character: '#'");
    assert_eq!(diag.span, Span::new(0, 1));
}

#[test]
fn test_missing_semicolon_inside_block() {
    let diag = error("void f() { g() }");
    assert_eq!(diag.message, "';' expected");
    assert_eq!(diag.span, Span::point(14));
}

#[test]
fn test_illegal_start_of_expression() {
    assert_eq!(error("int x = );").message, "illegal start of expression");
}

#[test]
fn test_integer_too_large() {
    assert_eq!(error("99999999999").message, "integer number too large");
}

#[test]
fn test_var_parameter_is_rejected() {
    assert_eq!(error("int f(var a) { return 1; }").message, "'var' is not allowed here");
}

#[test]
fn test_statement_lines() {
    let Item::Method(method) = parse_unit("void f() {\n  g();\n\n  h();\n}").unwrap() else {
        panic!("not a method");
    };
    let lines: Vec<u32> = method.body.iter().map(Stmt::line).collect();
    assert_eq!(lines, vec![2, 4]);
}

#[test]
fn test_deeply_nested_parentheses() {
    let source = format!("{}1{}", "(".repeat(20_000), ")".repeat(20_000));
    let Stmt::Expr { value, .. } = stmt(&source) else {
        panic!("not an expression");
    };
    assert_eq!(value.kind, ExprKind::Int(1));
}

#[test]
fn test_long_negation_chain() {
    let source = format!("{}7", "- ".repeat(3_000));
    assert!(matches!(stmt(&source), Stmt::Expr { .. }));
}
