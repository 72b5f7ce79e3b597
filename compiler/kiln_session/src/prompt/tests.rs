use pretty_assertions::assert_eq;

use super::*;

#[test]
fn test_color_mode_resolution() {
    assert!(ColorMode::Auto.should_use_colors(true));
    assert!(!ColorMode::Auto.should_use_colors(false));
    assert!(ColorMode::Always.should_use_colors(false));
    assert!(!ColorMode::Never.should_use_colors(true));
}

#[test]
fn test_plain_reply() {
    let style = PromptStyle::default();
    assert_eq!(style.reply(false, "1 + 1", Some("$1 ==> 2")), "kiln> 1 + 1\n$1 ==> 2");
    assert_eq!(style.reply(true, "class A {", None), "...> class A {");
}

#[test]
fn test_console_reply_starts_on_fresh_line() {
    let style = PromptStyle::default().with_console(true);
    assert_eq!(style.reply(false, "x", None), "\nkiln> x");
    assert!(style.greeting().starts_with("\n| You will not see"));
}

#[test]
fn test_colored_reply() {
    let style = PromptStyle::new(ColorMode::Always, false);
    assert_eq!(
        style.reply(false, "x", Some("x ==> 1")),
        "\x1b[36mkiln> \x1b[0mx\n\x1b[90mx ==> 1\x1b[0m"
    );
    assert_eq!(style.goodbye(), "\x1b[90m|  Goodbye!\x1b[0m");
}

#[test]
fn test_greeting_text() {
    assert_eq!(
        PromptStyle::default().greeting(),
        "| You will not see chat messages while using the REPL.\n|  Type #exit to quit the REPL at any time."
    );
}
