//! Vine Eval - tree-walking interpreter for the vine language.
//!
//! # Architecture
//!
//! - `EnvArena`: lexical environments in a generation-checked arena, with
//!   pooled child frames for loop iterations, blocks and calls
//! - `Interpreter`: statement and expression evaluation over `vine_ir::ast`
//! - `evaluate_binary` / `evaluate_unary`: numeric, string and comparison
//!   semantics
//! - `Task` / `TaskRegistry`: thread-per-task execution with continuations
//!   and the end-of-program join
//! - `BuiltinModules`: native modules (`glb`, `time`) behind the
//!   `NativeFunction` trait
//! - `ModuleLoader` / `Workspace`: resolving `use "path"` to source files

mod environment;
pub mod errors;
pub mod interpreter;
pub mod loader;
pub mod modules;
mod operators;
mod print_handler;
pub mod task;
mod value;
pub mod workspace;

pub use environment::{
    ArenaStats, EnvArena, EnvId, EnvRef, ModuleContext, MountScope, ScopeError,
};
pub use errors::{EvalError, EvalErrorKind, EvalResult};
pub use interpreter::{Interpreter, InterpreterBuilder, DEFAULT_MAX_DEPTH, GLOBAL_NAME};
pub use loader::{FsLoader, LoadError, LoadedModule, MemoryLoader, ModuleLoader};
pub use modules::{BuiltinModules, NativeEnv, NativeFunction};
pub use operators::{evaluate_binary, evaluate_unary, values_equal};
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, PrintHandler, SharedPrintHandler,
};
pub use task::{Task, TaskHandle, TaskRegistry, TaskState};
pub use value::{Array, Closure, Module, Store, Value, PROTO_KEY};
pub use workspace::{Workspace, WorkspaceError};

#[cfg(test)]
mod tests;
