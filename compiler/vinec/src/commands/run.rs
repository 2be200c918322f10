//! The `run` command: execute a script or project.

use std::fs;
use std::path::Path;

use thiserror::Error;
use vine_diagnostic::emitter::{ColorMode, DiagnosticEmitter, TerminalEmitter};
use vine_diagnostic::Diagnostic;
use vine_eval::{stdout_handler, InterpreterBuilder, SharedPrintHandler, Value};

use crate::project::{resolve_entry, ProjectError};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Project(#[from] ProjectError),
    /// The program failed; `file` and `text` are the entry script, for
    /// snippet rendering.
    #[error("{diagnostic}")]
    Program {
        diagnostic: Diagnostic,
        file: String,
        text: String,
    },
}

/// Run a script file or project directory, writing `print` output through
/// `printer`. Every task has finished when this returns.
pub fn execute_path(path: &Path, printer: SharedPrintHandler) -> Result<Value, RunError> {
    let entry = resolve_entry(path)?;
    let text = fs::read_to_string(&entry.file).map_err(|err| ProjectError::io(&entry.file, err))?;
    let file = entry.file.display().to_string();

    let interp = InterpreterBuilder::new()
        .print_handler(printer)
        .workspace(entry.workspace)
        .build();
    interp
        .run_source(&file, &text)
        .map_err(|diagnostic| RunError::Program {
            diagnostic,
            file,
            text,
        })
}

/// Run `path`, reporting the first error on stderr and exiting with
/// status 1 if there is one.
pub fn run_file(path: &str) {
    match execute_path(Path::new(path), stdout_handler()) {
        Ok(_) => {}
        Err(RunError::Project(err)) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
        Err(RunError::Program {
            diagnostic,
            file,
            text,
        }) => {
            let is_tty = std::io::IsTerminal::is_terminal(&std::io::stderr());
            let mut emitter =
                TerminalEmitter::stderr(ColorMode::Auto, is_tty).with_source(&file, &text);
            emitter.emit(&diagnostic);
            emitter.flush();
            std::process::exit(1);
        }
    }
}
