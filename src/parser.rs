use std::num::ParseFloatError;

use pest::{iterators::Pairs, Parser};
use thiserror::Error;
use tracing::trace;

#[derive(pest_derive::Parser)]
#[grammar = "calc.pest"]
struct CommandParser;

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Exit,
    Help,
    History,
    Calculate { operation: String, a: f64, b: f64 },
}

pub fn parse(input: &str) -> Result<Command, ParseError> {
    let mut pairs = CommandParser::parse(Rule::command, input.trim())?;
    let pair = pairs.next().expect("grammar yields a command before EOI");
    trace!("{:?} : {}", pair.as_rule(), pair.as_str());

    match pair.as_rule() {
        Rule::exit => Ok(Command::Exit),
        Rule::help => Ok(Command::Help),
        Rule::history => Ok(Command::History),
        Rule::calculation => parse_calculation(pair.into_inner()),
        _ => unreachable!("Not recognized"),
    }
}

fn parse_calculation(mut words: Pairs<Rule>) -> Result<Command, ParseError> {
    let mut next_word = || {
        words
            .next()
            .expect("Grammar expects three words here")
            .as_str()
    };

    let operation = next_word().to_owned();
    let a = parse_operand(next_word())?;
    let b = parse_operand(next_word())?;

    Ok(Command::Calculate { operation, a, b })
}

fn parse_operand(token: &str) -> Result<f64, ParseError> {
    token.parse().map_err(|source| ParseError::InvalidNumber {
        token: token.to_owned(),
        source,
    })
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid format. Use: <operation> <num1> <num2>")]
    Syntax(#[from] pest::error::Error<Rule>),
    #[error("Invalid format. Use: <operation> <num1> <num2> ('{token}' is not a number)")]
    InvalidNumber {
        token: String,
        #[source]
        source: ParseFloatError,
    },
}
