//! The `repl` command: interactive session on stdin/stdout.

use std::io::{self, IsTerminal};

use vine_diagnostic::emitter::ColorMode;
use vine_eval::Interpreter;

use crate::repl::Repl;

pub fn run_repl() {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let is_tty = stdout.is_terminal();
    let mut repl = Repl::new(stdin.lock(), stdout.lock(), Interpreter::new())
        .with_color(ColorMode::Auto, is_tty);
    if let Err(err) = repl.run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
