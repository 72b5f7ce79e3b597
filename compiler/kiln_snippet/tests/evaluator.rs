//! End-to-end evaluation through the engine with the snippet compiler.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use kiln_repl::{EngineError, Evaluator, EvaluatorConfig, ExecutionOutcome};
use kiln_runtime::{ClassArchive, ClassBytes};
use kiln_snippet::{buffer_handler, standard_host_registry, SnippetCompiler};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn evaluator() -> Evaluator<SnippetCompiler> {
    evaluator_with(&EvaluatorConfig::default()).unwrap()
}

fn evaluator_with(config: &EvaluatorConfig) -> Result<Evaluator<SnippetCompiler>, EngineError> {
    let host = standard_host_registry();
    let compiler = SnippetCompiler::with_print_handler(Arc::clone(&host), buffer_handler());
    Evaluator::new(compiler, host, config)
}

fn eval(evaluator: &mut Evaluator<SnippetCompiler>, input: &str) -> Option<String> {
    evaluator.evaluate(input).unwrap()
}

#[test]
fn test_variable_then_auto_named_value() {
    let mut ev = evaluator();
    assert_eq!(eval(&mut ev, "int x = 5;").as_deref(), Some("x ==> 5"));
    assert_eq!(eval(&mut ev, "x + 1").as_deref(), Some("$1 ==> 6"));
}

#[test]
fn test_value_result_outcome() {
    let mut ev = evaluator();
    let outcomes = ev.evaluate_outcomes("int x = 5;").unwrap();
    assert_eq!(
        outcomes,
        vec![ExecutionOutcome::ValueResult {
            name: "x".to_string(),
            value: "5".to_string(),
        }]
    );
}

#[test]
fn test_declarations() {
    let mut ev = evaluator();
    assert_eq!(
        eval(&mut ev, "int sq(int n) { return n * n; }").as_deref(),
        Some("created method sq()")
    );
    assert_eq!(
        eval(&mut ev, "class Box { int size() { return 3; } }").as_deref(),
        Some("created class Box")
    );
    assert_eq!(
        eval(&mut ev, "sq(new Box().size())").as_deref(),
        Some("$1 ==> 9")
    );
}

#[test]
fn test_class_spread_over_several_inputs() {
    let mut ev = evaluator();
    assert_eq!(eval(&mut ev, "class Foo {"), None);
    assert!(ev.is_holding_incomplete_input());
    assert_eq!(eval(&mut ev, "  int one() { return 1; }"), None);
    assert!(ev.is_holding_incomplete_input());
    assert_eq!(eval(&mut ev, "}").as_deref(), Some("created class Foo"));
    assert!(!ev.is_holding_incomplete_input());
    assert_eq!(eval(&mut ev, "new Foo().one()").as_deref(), Some("$1 ==> 1"));
}

#[test]
fn test_new_resolves_through_installed_tier_without_reloading() {
    let mut ev = evaluator();
    eval(&mut ev, "class Foo {}");
    eval(&mut ev, "new Foo()");
    let loader = ev.facade().loader();
    let defined = loader.defined_count();
    let first = Arc::clone(loader.versions("Foo")[0].resolved().unwrap());

    let shown = eval(&mut ev, "new Foo()").unwrap();
    assert!(shown.starts_with("$2 ==> Foo@"), "{shown}");

    let loader = ev.facade().loader();
    assert_eq!(loader.defined_count(), defined);
    assert_eq!(loader.versions("Foo").len(), 1);
    assert!(Arc::ptr_eq(
        &first,
        loader.versions("Foo")[0].resolved().unwrap()
    ));
}

#[test]
fn test_redeclaring_class_installs_new_version() {
    let mut ev = evaluator();
    eval(&mut ev, "class Foo { int one() { return 1; } }");
    let before = ev.facade().loader().defined_count();
    eval(&mut ev, "class Foo { int one() { return 1; } }");
    let loader = ev.facade().loader();
    // A new snippet number changes the bytes, so a second version appears.
    assert_eq!(loader.versions("Foo").len(), 2);
    assert!(loader.defined_count() > before);
}

#[test]
fn test_exit_is_rejected_source() {
    let mut ev = evaluator();
    assert_eq!(
        eval(&mut ev, "#exit").as_deref(),
        Some("|  Error:\n|  illegal character: '#'\n|  #exit\n|  ^^")
    );
}

#[test]
fn test_cannot_find_symbol_report() {
    let mut ev = evaluator();
    assert_eq!(
        eval(&mut ev, "int x = y + 1;").as_deref(),
        Some("|  Error:\n|  cannot find symbol\n|    symbol:   variable y\n|  int x = y + 1;\n|          ^^")
    );
}

#[test]
fn test_runtime_failure_trace() {
    let mut ev = evaluator();
    eval(&mut ev, "int inv(int n) { return 1 / n; }");
    assert_eq!(
        eval(&mut ev, "inv(0)").as_deref(),
        Some(
            "lang.ArithmeticException: / by zero\n\
             |        at $Snippet$1.inv(#1:1)\n\
             |        at $Snippet$2.do_it$(#2:1)"
        )
    );
}

#[test]
fn test_exception_with_cause_trace() {
    let mut ev = evaluator();
    let shown = eval(
        &mut ev,
        "throw new IllegalStateException(\"outer\", new ArithmeticException(\"inner\"));",
    )
    .unwrap();
    assert_eq!(
        shown,
        "lang.IllegalStateException: outer\n\
         |        at $Snippet$1.do_it$(#1:1)\n\
         Caused by: lang.ArithmeticException: inner\n\
         |        at $Snippet$1.do_it$(#1:1)"
    );
}

#[test]
fn test_first_failure_stops_the_rest() {
    let mut ev = evaluator();
    let shown = eval(&mut ev, "int a = 1 / 0; println(\"second\");").unwrap();
    assert!(shown.starts_with("lang.ArithmeticException: / by zero"));
    assert_eq!(ev.facade().compiler().take_output(), "");
    assert!(!ev.is_holding_incomplete_input());
}

#[test]
fn test_statements_run_left_to_right() {
    let mut ev = evaluator();
    let shown = eval(&mut ev, "println(\"a\"); println(\"b\"); int n = 2;");
    assert_eq!(shown.as_deref(), Some("n ==> 2"));
    assert_eq!(ev.facade().compiler().take_output(), "a\nb\n");
}

#[test]
fn test_deep_nesting_is_evaluated() {
    let mut ev = evaluator();
    let parens = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
    assert_eq!(eval(&mut ev, &parens).as_deref(), Some("$1 ==> 1"));
    let negations = format!("{}5", "- ".repeat(4_000));
    assert_eq!(eval(&mut ev, &negations).as_deref(), Some("$2 ==> 5"));
}

#[test]
fn test_semicolon_inside_call_rejects_whole_input() {
    let mut ev = evaluator();
    let shown = eval(&mut ev, "println(1; 2)").unwrap();
    assert!(shown.starts_with("|  Error:"), "{shown}");
    assert!(shown.contains("println(1; 2)"), "{shown}");
    assert!(!ev.is_holding_incomplete_input());
}

#[test]
fn test_rejection_keeps_earlier_declarations() {
    let mut ev = evaluator();
    eval(&mut ev, "int x = 1;");
    let shown = eval(&mut ev, "int x = \"one\";").unwrap();
    assert!(shown.starts_with("|  Error:\n|  incompatible types"));
    assert_eq!(eval(&mut ev, "x + 1").as_deref(), Some("$1 ==> 2"));
}

#[test]
fn test_silent_expression_shows_nothing() {
    let mut ev = evaluator();
    assert_eq!(eval(&mut ev, "println(1)"), None);
}

#[test]
fn test_closed_evaluator_refuses_input() {
    let mut ev = evaluator();
    ev.close();
    ev.close();
    assert!(matches!(ev.evaluate("1"), Err(EngineError::Closed)));
}

#[test]
fn test_archives_under_classpath_roots_join_search_path() {
    let dir = tempfile::tempdir().unwrap();
    let archive = ClassArchive::new(vec![ClassBytes::new("lib.Util", vec![1, 2, 3])]);
    archive.write(&dir.path().join("util.kar")).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not an archive").unwrap();

    let config = EvaluatorConfig::default().with_classpath_root(dir.path());
    let ev = evaluator_with(&config).unwrap();
    assert_eq!(ev.facade().loader().search_path().len(), 1);
}

#[test]
fn test_archive_extension_is_configurable() {
    let dir = tempfile::tempdir().unwrap();
    let archive = ClassArchive::new(vec![ClassBytes::new("lib.Util", vec![1, 2, 3])]);
    archive.write(&dir.path().join("util.kar")).unwrap();
    archive.write(&dir.path().join("util.pack")).unwrap();

    let config = EvaluatorConfig::default()
        .with_classpath_root(dir.path())
        .with_archive_extension("pack");
    let ev = evaluator_with(&config).unwrap();
    let entries = ev.facade().loader().search_path().entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].path().ends_with("util.pack"));
}

#[test]
fn test_missing_classpath_root_fails_construction() {
    let config = EvaluatorConfig::default().with_classpath_root("/nonexistent/kiln/classpath");
    assert!(matches!(
        evaluator_with(&config),
        Err(EngineError::Classpath(_))
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Feeding an incomplete head and then the rest shows what feeding the
    /// whole text at once shows.
    #[test]
    fn buffer_merge_equivalence(
        body in "( int [a-z]{1,3}\\(\\) \\{ return [0-9]{1,3}; \\}){0,3}",
        tail in " [0-9]{1,3}",
    ) {
        let head = format!("class K {{{body}");
        let rest = format!(" }}{tail}");

        let mut split = evaluator();
        prop_assert_eq!(split.evaluate(&head).unwrap(), None);
        prop_assert!(split.is_holding_incomplete_input());
        let split_result = split.evaluate(&rest).unwrap();

        let mut whole = evaluator();
        let whole_result = whole.evaluate(&format!("{head}{rest}")).unwrap();

        prop_assert_eq!(split_result, whole_result);
    }
}
