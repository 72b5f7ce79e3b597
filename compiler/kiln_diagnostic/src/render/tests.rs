use super::*;
use crate::Span;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn render(source: &str, message: &str, start: u32, end: u32) -> Vec<String> {
    render_diag(source, &Diag::new(message, Span::new(start, end)))
}

#[test]
fn test_single_line_span() {
    let lines = render("int x = \"five\";", "incompatible types", 8, 14);
    assert_eq!(
        lines,
        vec![
            "incompatible types".to_string(),
            "int x = \"five\";".to_string(),
            "        ^-----^".to_string(),
        ]
    );
}

#[test]
fn test_zero_width_span_is_single_caret() {
    let lines = render("foo(", "')' expected", 4, 4);
    assert_eq!(lines.last().map(String::as_str), Some("    ^"));
}

#[test]
fn test_location_lines_are_dropped() {
    let message = "cannot find symbol\n  symbol:   variable y\n  location: class $Snippet";
    let lines = render("y + 1", message, 0, 1);
    assert_eq!(
        lines,
        vec![
            "cannot find symbol".to_string(),
            "  symbol:   variable y".to_string(),
            "y + 1".to_string(),
            "^^".to_string(),
        ]
    );
}

#[test]
fn test_empty_message_lines_are_dropped() {
    let lines = render("x", "first\n\nsecond\r\n", 0, 0);
    assert_eq!(&lines[..2], &["first".to_string(), "second".to_string()]);
}

#[test]
fn test_multi_line_span_shows_first_line_and_continuation() {
    let source = "void f() {\n  return 1;\n}";
    let lines = render(source, "missing return type", 5, 24);
    assert_eq!(lines[1], "void f() {");
    assert_eq!(lines[2], "     ^-----...");
    assert!(lines[2].ends_with(CONTINUATION_MARKER));
}

#[test]
fn test_span_on_second_line() {
    let source = "int a = 1;\r\nint b = c;";
    // `c` sits at byte 20 (line 2, column 8)
    let lines = render(source, "cannot find symbol", 20, 21);
    assert_eq!(lines[1], "int b = c;");
    assert_eq!(lines[2], "        ^^");
}

#[test]
fn test_span_ending_at_line_end_is_single_line() {
    let source = "abc\ndef";
    let lines = render(source, "m", 0, 3);
    assert_eq!(lines[2], "^--^");
}

#[test]
fn test_columns_count_characters() {
    let source = "String s = \"αβ\" + q;";
    let q = u32::try_from(source.find('q').unwrap_or(0)).unwrap_or(0);
    let lines = render(source, "cannot find symbol", q, q);
    // two-byte Greek letters occupy one column each
    assert_eq!(lines[2], format!("{}^", " ".repeat(18)));
}

#[test]
fn test_out_of_range_span_clamps() {
    let lines = render("abc", "m", 10, 20);
    assert_eq!(lines[1], "abc");
    assert_eq!(lines[2], "   ^");
}

proptest! {
    #[test]
    fn single_line_marker_length(
        line in "[a-z ]{1,40}",
        a in 0usize..40,
        b in 0usize..40,
    ) {
        let len = line.len();
        let (start, end) = (a.min(b) % len, a.max(b) % len);
        prop_assume!(start < end);
        let lines = render(&line, "m", u32::try_from(start).unwrap_or(0), u32::try_from(end).unwrap_or(0));
        let marker = lines.last().cloned().unwrap_or_default();
        prop_assert_eq!(marker.trim_start().len(), end - start + 1);
        prop_assert!(marker.ends_with('^'));
        prop_assert_eq!(marker.len() - marker.trim_start().len(), start);
    }

    #[test]
    fn multi_line_marker_ends_with_continuation(
        first in "[a-z]{1,20}",
        second in "[a-z]{1,20}",
        a in 0usize..20,
    ) {
        let source = format!("{first}\n{second}");
        let start = a % first.len();
        let end = source.len();
        let lines = render(&source, "m", u32::try_from(start).unwrap_or(0), u32::try_from(end).unwrap_or(0));
        let marker = lines.last().cloned().unwrap_or_default();
        prop_assert!(marker.ends_with(CONTINUATION_MARKER));
        prop_assert_eq!(lines[1].as_str(), first.as_str());
    }
}
