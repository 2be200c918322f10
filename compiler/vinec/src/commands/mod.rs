//! Command handlers for the `vine` CLI.
//!
//! Each handler reports its own errors and exits non-zero on failure, so
//! `main` only dispatches.

mod create;
mod repl;
mod run;

pub use create::create;
pub use repl::run_repl;
pub use run::{execute_path, run_file, RunError};
