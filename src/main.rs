use std::path::PathBuf;

use clap::Parser;
use rustyline::Editor;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

pub mod calculation;
pub mod error;
pub mod helper;
pub mod operations;
pub mod parser;
pub mod repl;

use calculation::REGISTRY;
use helper::{CalculatorState, CommandHelper};

#[derive(Parser, Debug)]
#[command(version, about = "Four-function calculator REPL", long_about = None)]
struct Args {
    /// Keep line-editing recall history in this file between sessions
    #[arg(long, value_name = "PATH")]
    history_file: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long)]
    debug: bool,
}

fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    let mut rl = Editor::<CommandHelper>::new();
    rl.set_helper(Some(CommandHelper::new(&REGISTRY)));
    if let Some(path) = &args.history_file {
        if let Err(err) = rl.load_history(path) {
            debug!("No previous history in {}: {}", path.display(), err);
        }
    }

    let mut state = CalculatorState::new(&REGISTRY);
    let status = repl::run(&mut rl, &mut std::io::stdout(), &mut state);

    if let Some(path) = &args.history_file {
        if let Err(err) = rl.save_history(path) {
            warn!("Could not save history to {}: {}", path.display(), err);
        }
    }
    std::process::exit(status);
}
