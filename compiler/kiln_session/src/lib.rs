//! Conversational layer over the Kiln engine.
//!
//! A [`ReplSession`] owns one [`Evaluator`](kiln_repl::Evaluator) and turns
//! each line a user types into a [`Reply`]: the echoed prompt plus whatever
//! the engine had to show. [`SessionRegistry`] keeps one live session per
//! user key. `#exit` ends a session; the engine never sees it.

mod errors;
mod prompt;
mod registry;
mod session;

use std::sync::Once;

pub use errors::SessionError;
pub use prompt::{
    ColorMode, PromptStyle, CONTINUATION_PROMPT, EXIT_COMMAND, GOODBYE, GREETING, PROMPT,
};
pub use registry::SessionRegistry;
pub use session::{Reply, ReplSession, INTERNAL_ERROR_PREFIX};

static TRACING_INIT: Once = Once::new();

/// Install a tracing subscriber for debug output.
///
/// Safe to call multiple times. Nothing is installed unless `RUST_LOG` is
/// set, e.g. `RUST_LOG=kiln_repl=debug`. With `KILN_LOG_TREE` also set, spans
/// render as an indented tree instead of flat lines.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let filter = EnvFilter::from_default_env();
        let installed = if std::env::var_os("KILN_LOG_TREE").is_some() {
            tracing_subscriber::registry()
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_bracketed_fields(true),
                )
                .with(filter)
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init()
        };
        // Another subscriber already owns the global slot.
        if let Err(e) = installed {
            tracing::debug!(error = %e, "tracing already initialised");
        }
    });
}
