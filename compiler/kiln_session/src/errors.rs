//! Session failures.

use kiln_repl::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a REPL session is already active for this user")]
    AlreadyActive,

    #[error("no REPL session is active for this user")]
    NotActive,

    #[error("the REPL session has ended")]
    Closed,

    #[error("cannot start the REPL engine: {0}")]
    Engine(#[from] EngineError),
}
