use std::io::Write;

use rustyline::{error::ReadlineError, Editor, Helper};
use tracing::{debug, warn};

use crate::calculation::format_number;
use crate::error::CalcError;
use crate::helper::{CalculatorState, Outcome};

pub const PROMPT: &str = ">> ";

const HELP: &str = "
Calculator REPL - Help
----------------------
Usage: <operation> <num1> <num2>

Supported operations:
    add       → Adds two numbers
    subtract  → Subtracts second number from first
    multiply  → Multiplies two numbers
    divide    → Divides first number by second

Special commands:
    help      → Show this message
    history   → Show past calculations
    exit      → Quit the calculator

Examples:
    add 10 5
    subtract 20 7
    multiply 6 9
    divide 15 3
";

/// Source of input lines for the REPL.
pub trait LineReader {
    fn read_line(&mut self, prompt: &str) -> Result<String, ReadlineError>;

    /// Called with every non-blank line that was read.
    fn remember(&mut self, _line: &str) {}
}

impl<H: Helper> LineReader for Editor<H> {
    fn read_line(&mut self, prompt: &str) -> Result<String, ReadlineError> {
        self.readline(prompt)
    }

    fn remember(&mut self, line: &str) {
        self.add_history_entry(line);
    }
}

/// Why a session ended without an internal fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    Requested,
    EndOfInput,
    Interrupted,
}

impl Shutdown {
    fn farewell(self) -> &'static str {
        match self {
            Shutdown::Requested => "Exiting calculator. Goodbye!",
            Shutdown::EndOfInput => "\nEOF detected. Exiting calculator. Goodbye!",
            Shutdown::Interrupted => "\nKeyboard interrupt detected. Exiting calculator. Goodbye!",
        }
    }
}

/// Runs the REPL to completion and returns the process exit status.
pub fn run<R, W>(reader: &mut R, out: &mut W, state: &mut CalculatorState<'_>) -> i32
where
    R: LineReader,
    W: Write,
{
    let (message, status) = match session(reader, out, state) {
        Ok(shutdown) => {
            debug!(?shutdown, "session ended");
            (shutdown.farewell().to_owned(), 0)
        }
        Err(err) => (format!("\nUnexpected error: {}", err), 1),
    };

    if let Err(err) = writeln!(out, "{}", message).and_then(|_| out.flush()) {
        warn!("failed to write '{}': {}", message.trim(), err);
    }
    status
}

fn session<R, W>(reader: &mut R, out: &mut W, state: &mut CalculatorState<'_>) -> Result<Shutdown, CalcError>
where
    R: LineReader,
    W: Write,
{
    writeln!(out, "Welcome to the Professional Calculator REPL!")?;
    writeln!(out, "Type 'help' for usage or 'exit' to quit.\n")?;

    loop {
        let line = match reader.read_line(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => return Ok(Shutdown::Interrupted),
            Err(ReadlineError::Eof) => return Ok(Shutdown::EndOfInput),
            Err(err) => return Err(err.into()),
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        reader.remember(line);

        match state.evaluate(line) {
            Ok(Outcome::Exit) => return Ok(Shutdown::Requested),
            Ok(Outcome::Help) => writeln!(out, "{}", HELP)?,
            Ok(Outcome::History) => display_history(out, state)?,
            Ok(Outcome::Computed(result)) => writeln!(out, "Result: {}\n", format_number(result))?,
            Err(CalcError::DivisionByZero) => writeln!(out, "Error: {}", CalcError::DivisionByZero)?,
            Err(err) if err.is_recoverable() => writeln!(out, "{}", err)?,
            Err(err) => return Err(err),
        }
    }
}

fn display_history<W: Write>(out: &mut W, state: &CalculatorState<'_>) -> std::io::Result<()> {
    let history = state.history();
    if history.is_empty() {
        return writeln!(out, "No calculations yet.");
    }

    writeln!(out, "Calculation History:")?;
    for (i, calculation) in history.iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, calculation)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;

    use super::*;
    use crate::calculation::REGISTRY;

    /// Replays canned lines, then ends with the configured error.
    struct Script {
        lines: VecDeque<String>,
        end: fn() -> ReadlineError,
        remembered: Vec<String>,
    }

    impl Script {
        fn new(lines: &[&str]) -> Self {
            Self::ending_with(lines, || ReadlineError::Eof)
        }

        fn ending_with(lines: &[&str], end: fn() -> ReadlineError) -> Self {
            Self {
                lines: lines.iter().map(|line| line.to_string()).collect(),
                end,
                remembered: Vec::new(),
            }
        }
    }

    impl LineReader for Script {
        fn read_line(&mut self, _prompt: &str) -> Result<String, ReadlineError> {
            self.lines.pop_front().ok_or_else(self.end)
        }

        fn remember(&mut self, line: &str) {
            self.remembered.push(line.to_owned());
        }
    }

    fn transcript(script: &mut Script) -> (String, i32) {
        let mut state = CalculatorState::new(&REGISTRY);
        let mut out = Vec::new();
        let status = run(script, &mut out, &mut state);
        (String::from_utf8(out).unwrap(), status)
    }

    #[test]
    fn addition() {
        let (output, status) = transcript(&mut Script::new(&["add 2 3", "exit"]));
        assert!(output.contains("Result: 5.0"));
        assert!(output.contains("Exiting calculator. Goodbye!"));
        assert_eq!(status, 0);
    }

    #[test]
    fn every_operation() {
        let (output, _) = transcript(&mut Script::new(&[
            "subtract 5 2",
            "multiply 4 5",
            "divide 10 4",
            "exit",
        ]));
        assert!(output.contains("Result: 3.0"));
        assert!(output.contains("Result: 20.0"));
        assert!(output.contains("Result: 2.5"));
    }

    #[test]
    fn division_by_zero_keeps_running() {
        let (output, status) = transcript(&mut Script::new(&["divide 5 0", "add 1 1", "exit"]));
        assert!(output.contains("Error: Division by zero is not allowed."));
        assert!(output.contains("Result: 2.0"));
        assert_eq!(status, 0);
    }

    #[test]
    fn history_lists_calculations() {
        let (output, _) = transcript(&mut Script::new(&["add 2 2", "history", "exit"]));
        assert!(output.contains("Result: 4.0"));
        assert!(output.contains("Calculation History"));
        assert!(output.contains("1. 2.0 Add 2.0 = 4.0"));
    }

    #[test]
    fn failed_lines_stay_out_of_history() {
        let (output, _) = transcript(&mut Script::new(&[
            "add 1 2",
            "divide 1 0",
            "add x y",
            "multiply 2 3",
            "history",
            "exit",
        ]));
        assert!(output.contains("1. 1.0 Add 2.0 = 3.0"));
        assert!(output.contains("2. 2.0 Multiply 3.0 = 6.0"));
        assert!(!output.contains("3. "));
    }

    #[test]
    fn unsupported_operation() {
        let (output, status) = transcript(&mut Script::new(&["modulus 5 3", "exit"]));
        assert!(output.contains("Unsupported calculation type"));
        assert!(output.contains("add, subtract, multiply, divide"));
        assert_eq!(status, 0);
    }

    #[test]
    fn empty_history() {
        let (output, _) = transcript(&mut Script::new(&["history", "exit"]));
        assert!(output.contains("No calculations yet."));
    }

    #[test]
    fn invalid_format() {
        let (output, _) = transcript(&mut Script::new(&["add two three", "add 1", "exit"]));
        assert_eq!(output.matches("Invalid format").count(), 2);
    }

    #[test]
    fn help() {
        let (output, _) = transcript(&mut Script::new(&["help", "exit"]));
        assert!(output.contains("Calculator REPL - Help"));
        assert!(output.contains("Supported operations:"));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let mut script = Script::new(&["", "   ", "add 1 1", "exit"]);
        let (output, status) = transcript(&mut script);
        assert!(output.contains("Result: 2.0"));
        assert!(!output.contains("Invalid format"));
        assert_eq!(script.remembered, ["add 1 1", "exit"]);
        assert_eq!(status, 0);
    }

    #[test]
    fn end_of_input_exits_cleanly() {
        let (output, status) = transcript(&mut Script::new(&["add 1 1"]));
        assert!(output.contains("EOF detected"));
        assert_eq!(status, 0);
    }

    #[test]
    fn interrupt_exits_cleanly() {
        let mut script = Script::ending_with(&[], || ReadlineError::Interrupted);
        let (output, status) = transcript(&mut script);
        assert!(output.contains("Keyboard interrupt detected"));
        assert_eq!(status, 0);
    }

    #[test]
    fn reader_failure_exits_with_error() {
        let mut script = Script::ending_with(&[], || {
            ReadlineError::Io(io::Error::new(io::ErrorKind::Other, "Boom!"))
        });
        let (output, status) = transcript(&mut script);
        assert!(output.contains("Unexpected error: Boom!"));
        assert_eq!(status, 1);
    }
}
