use rustyline::error::ReadlineError;
use thiserror::Error;

use crate::parser::ParseError;

#[derive(Error, Debug)]
pub enum CalcError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Unsupported calculation type: '{tag}'. Available: {}", .available.join(", "))]
    UnsupportedOperation { tag: String, available: Vec<String> },

    #[error("Division by zero is not allowed.")]
    DivisionByZero,

    #[error("Calculation type '{0}' is already registered.")]
    DuplicateRegistration(String),

    // Anything below here ends the session with a non-zero status.
    #[error(transparent)]
    Readline(#[from] ReadlineError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CalcError {
    /// Whether the REPL can report this error and keep reading input.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CalcError::Parse(_)
                | CalcError::UnsupportedOperation { .. }
                | CalcError::DivisionByZero
                | CalcError::DuplicateRegistration(_)
        )
    }
}
