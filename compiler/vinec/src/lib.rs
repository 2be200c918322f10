//! The `vine` driver.
//!
//! Runs scripts and projects on the `vine_eval` interpreter, hosts the
//! interactive REPL and scaffolds new projects.

pub mod commands;
pub mod project;
pub mod repl;
mod tracing_setup;

pub use tracing_setup::init_tracing;
