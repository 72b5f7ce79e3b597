//! Prompt and banner text, with optional ANSI colour.

/// Prompt shown before input that starts a new unit.
pub const PROMPT: &str = "kiln> ";

/// Prompt shown before input that continues held text.
pub const CONTINUATION_PROMPT: &str = "...> ";

/// Input that ends the session instead of being evaluated.
pub const EXIT_COMMAND: &str = "#exit";

pub const GREETING: &str = "| You will not see chat messages while using the REPL.\n\
                            |  Type #exit to quit the REPL at any time.";

pub const GOODBYE: &str = "|  Goodbye!";

mod colors {
    pub const PROMPT: &str = "\x1b[36m"; // Cyan
    pub const MUTED: &str = "\x1b[90m"; // Grey
    pub const RESET: &str = "\x1b[0m";
}

/// Color output mode.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// Colour when the user sits at a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// Resolve to a boolean. `is_tty` only matters for `Auto`.
    pub fn should_use_colors(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

/// How replies are decorated for one user.
///
/// `console` users get a blank line before each reply so it stands apart
/// from server log output.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PromptStyle {
    pub color: bool,
    pub console: bool,
}

impl PromptStyle {
    pub fn new(mode: ColorMode, is_tty: bool) -> Self {
        PromptStyle {
            color: mode.should_use_colors(is_tty),
            console: false,
        }
    }

    #[must_use]
    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    fn paint(self, color: &str, text: &str) -> String {
        if self.color {
            format!("{color}{text}{}", colors::RESET)
        } else {
            text.to_owned()
        }
    }

    fn lead(self) -> &'static str {
        if self.console {
            "\n"
        } else {
            ""
        }
    }

    /// The greeting shown when a session starts.
    pub fn greeting(self) -> String {
        format!("{}{}", self.lead(), self.paint(colors::MUTED, GREETING))
    }

    pub fn goodbye(self) -> String {
        self.paint(colors::MUTED, GOODBYE)
    }

    /// Echo `input` after the prompt matching the buffer state, followed by
    /// `shown` on its own line(s).
    pub fn reply(self, holding: bool, input: &str, shown: Option<&str>) -> String {
        let prompt = if holding { CONTINUATION_PROMPT } else { PROMPT };
        let mut out = String::from(self.lead());
        out.push_str(&self.paint(colors::PROMPT, prompt));
        out.push_str(input);
        if let Some(shown) = shown {
            out.push('\n');
            out.push_str(&self.paint(colors::MUTED, shown));
        }
        out
    }
}

#[cfg(test)]
mod tests;
