use rustyline::{
    completion::Completer, highlight::Highlighter, hint::Hinter, validate::Validator, Context,
    Helper,
};
use tracing::debug;

use crate::calculation::{Calculation, Registry};
use crate::error::CalcError;
use crate::parser::{self, Command};

const SPECIAL_COMMANDS: [&str; 3] = ["help", "history", "exit"];

/// What a successfully evaluated line asks the REPL to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Exit,
    Help,
    History,
    Computed(f64),
}

pub struct CalculatorState<'r> {
    registry: &'r Registry,
    history: Vec<Calculation>,
}

impl<'r> CalculatorState<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[Calculation] {
        &self.history
    }

    /// Only calculations that produced a result are recorded.
    pub fn evaluate(&mut self, line: &str) -> Result<Outcome, CalcError> {
        let outcome = match parser::parse(line)? {
            Command::Exit => Outcome::Exit,
            Command::Help => Outcome::Help,
            Command::History => Outcome::History,
            Command::Calculate { operation, a, b } => {
                let calculation = self.registry.create(&operation, a, b)?;
                let result = calculation.compute()?;
                debug!(
                    operation = calculation.operation().tag(),
                    ?result,
                    "recording calculation #{}",
                    self.history.len() + 1
                );
                self.history.push(calculation);
                Outcome::Computed(result)
            }
        };
        Ok(outcome)
    }
}

/// Line-editor support: completes the leading word and hints operands.
pub struct CommandHelper {
    words: Vec<String>,
}

impl CommandHelper {
    pub fn new(registry: &Registry) -> Self {
        let words = registry
            .tags()
            .map(str::to_owned)
            .chain(SPECIAL_COMMANDS.iter().map(|command| command.to_string()))
            .collect();
        Self { words }
    }

    fn is_operation(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        self.words
            .iter()
            .filter(|w| !SPECIAL_COMMANDS.contains(&w.as_str()))
            .any(|w| *w == word)
    }
}

impl Helper for CommandHelper {}

impl Validator for CommandHelper {}

impl Highlighter for CommandHelper {}

impl Hinter for CommandHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<Self::Hint> {
        if pos < line.len() {
            return None;
        }
        let tag = line.trim_start().strip_suffix(' ')?;
        if self.is_operation(tag) {
            Some("<num1> <num2>".to_owned())
        } else {
            None
        }
    }
}

impl Completer for CommandHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let head = &line[..pos];
        let start = head.len() - head.trim_start().len();
        let prefix = &head[start..];
        // Only the first word is completed.
        if prefix.contains(char::is_whitespace) {
            return Ok((pos, Vec::new()));
        }

        let prefix = prefix.to_lowercase();
        let candidates = self
            .words
            .iter()
            .filter(|word| word.starts_with(&prefix))
            .cloned()
            .collect();
        Ok((start, candidates))
    }
}
