//! Tree-walking interpreter.
//!
//! An [`Interpreter`] is a cheap handle on a shared [`Runtime`]: interner,
//! environment arena, task registry, builtin modules, module loader and
//! module cache. Task threads get their own handle via [`Interpreter::fork`].
//!
//! Evaluation threads an [`EvalScope`] through every call: the current
//! environment, the mount scope installed by `object.(expr)` if any, and
//! the source file the code being run came from.
//!
//! - `stmt.rs`: statements and blocks
//! - `expr.rs`: expressions and assignment
//! - `call.rs`: function calls, task calls and continuation chains
//! - `member.rs`: member, index and mount access
//! - `module.rs`: `use` and `expose`

mod builder;
mod call;
mod expr;
mod member;
mod module;
mod scope_guard;
mod stmt;

pub use builder::InterpreterBuilder;
pub(crate) use scope_guard::ScopedEnv;

use std::cell::Cell;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;
use vine_diagnostic::Diagnostic;
use vine_ir::ast::Program;
use vine_ir::{Name, SharedInterner};

use crate::environment::{EnvArena, EnvRef, ModuleContext, MountScope, ScopeError};
use crate::errors::{
    already_declared, const_violation, invalid_control_flow, read_only_assign, recursion_limit,
    undefined_variable, EvalError, EvalResult,
};
use crate::loader::ModuleLoader;
use crate::modules::BuiltinModules;
use crate::print_handler::SharedPrintHandler;
use crate::task::TaskRegistry;
use crate::value::{Module, Store, Value};
use crate::workspace::Workspace;

/// Default limit on nested script-level calls per thread.
pub const DEFAULT_MAX_DEPTH: usize = 10_000;

/// Name every root environment binds to the shared global object.
pub const GLOBAL_NAME: &str = "GLOBAL";

/// Result of running a statement.
#[derive(Clone, Debug)]
pub(crate) enum Flow {
    /// Finished normally; carries the value of an expression statement.
    Normal(Value),
    Return(Value),
    Break,
    Continue,
}

/// Where evaluation currently happens.
#[derive(Copy, Clone)]
pub(crate) struct EvalScope<'a> {
    pub env: &'a EnvRef,
    pub mount: Option<&'a dyn MountScope>,
    pub context: &'a Arc<ModuleContext>,
}

impl<'a> EvalScope<'a> {
    pub fn new(env: &'a EnvRef, context: &'a Arc<ModuleContext>) -> Self {
        EvalScope {
            env,
            mount: None,
            context,
        }
    }

    /// Same place, different environment.
    pub fn with_env<'b>(self, env: &'b EnvRef) -> EvalScope<'b>
    where
        'a: 'b,
    {
        EvalScope {
            env,
            mount: self.mount,
            context: self.context,
        }
    }
}

/// Imported modules by resolved path.
#[derive(Default)]
struct ModuleCache {
    loaded: FxHashMap<PathBuf, Arc<Module>>,
    /// Loads in flight on some thread; other importers wait on them.
    loading: FxHashMap<PathBuf, Arc<PendingModule>>,
}

/// A module one thread is loading while others may be waiting for it.
#[derive(Default)]
struct PendingModule {
    outcome: Mutex<Option<Result<Arc<Module>, EvalError>>>,
    done: Condvar,
}

impl PendingModule {
    fn wait(&self) -> Result<Arc<Module>, EvalError> {
        let mut outcome = self.outcome.lock();
        loop {
            if let Some(result) = outcome.as_ref() {
                return result.clone();
            }
            self.done.wait(&mut outcome);
        }
    }

    fn complete(&self, outcome: Result<Arc<Module>, EvalError>) {
        *self.outcome.lock() = Some(outcome);
        self.done.notify_all();
    }
}

/// State shared by every interpreter handle and task thread of one program.
pub struct Runtime {
    interner: SharedInterner,
    arena: EnvArena,
    printer: SharedPrintHandler,
    tasks: Arc<TaskRegistry>,
    builtins: BuiltinModules,
    loader: Arc<dyn ModuleLoader>,
    modules: Mutex<ModuleCache>,
    workspace: Workspace,
    global: Store,
    global_name: Name,
    max_depth: usize,
}

/// Interpreter handle.
///
/// Cloning shares the runtime. The call depth is per handle; it starts at
/// zero on a fork.
pub struct Interpreter {
    runtime: Arc<Runtime>,
    depth: Cell<usize>,
}

impl Interpreter {
    /// Interpreter with stdout output, the standard builtins and a
    /// filesystem loader rooted at the current directory.
    pub fn new() -> Self {
        InterpreterBuilder::new().build()
    }

    /// A handle for another thread.
    pub fn fork(&self) -> Interpreter {
        Self::from_runtime(Arc::clone(&self.runtime))
    }

    fn from_runtime(runtime: Arc<Runtime>) -> Self {
        Interpreter {
            runtime,
            depth: Cell::new(0),
        }
    }

    pub fn interner(&self) -> &SharedInterner {
        &self.runtime.interner
    }

    pub fn arena(&self) -> &EnvArena {
        &self.runtime.arena
    }

    pub fn tasks(&self) -> &Arc<TaskRegistry> {
        &self.runtime.tasks
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.runtime.printer
    }

    pub fn workspace(&self) -> &Workspace {
        &self.runtime.workspace
    }

    /// The object every root environment binds as `GLOBAL`.
    pub fn global(&self) -> &Store {
        &self.runtime.global
    }

    /// Context for source text run in this interpreter's workspace.
    pub fn context(&self, file: &str, source: &str) -> Arc<ModuleContext> {
        Arc::new(ModuleContext::new(
            file,
            source,
            self.runtime.workspace.clone(),
        ))
    }

    /// A fresh root environment with `GLOBAL` bound.
    pub fn new_root(&self, context: Arc<ModuleContext>) -> EnvRef {
        let env = self.runtime.arena.root(context);
        // A fresh root has no bindings, so this cannot collide.
        let _ = self.runtime.arena.define_const(
            &env,
            self.runtime.global_name,
            Value::Object(self.runtime.global.clone()),
        );
        env
    }

    /// Run a program in `env`, returning the value of its last expression
    /// statement. Errors are located in `context`.
    #[tracing::instrument(level = "debug", skip_all, fields(file = %context.file))]
    pub fn eval_program(
        &self,
        program: &Program,
        env: &EnvRef,
        context: &Arc<ModuleContext>,
    ) -> EvalResult {
        let scope = EvalScope::new(env, context);
        let mut last = Value::Nil;
        for stmt in &program.body {
            match self.exec_stmt(stmt, scope) {
                Ok(Flow::Normal(value)) => last = value,
                Ok(Flow::Return(value)) => return Ok(value),
                Ok(Flow::Break) => {
                    return Err(invalid_control_flow("break")
                        .with_span(stmt.span)
                        .locate(context))
                }
                Ok(Flow::Continue) => {
                    return Err(invalid_control_flow("continue")
                        .with_span(stmt.span)
                        .locate(context))
                }
                Err(err) => return Err(err.locate(context)),
            }
        }
        Ok(last)
    }

    /// [`eval_program`](Self::eval_program), then wait for every task
    /// whether or not the program failed.
    pub fn eval_safe(
        &self,
        program: &Program,
        env: &EnvRef,
        context: &Arc<ModuleContext>,
    ) -> EvalResult {
        let result = self.eval_program(program, env, context);
        if let Err(err) = &result {
            tracing::debug!(error = %err, "program failed, joining tasks");
        }
        self.runtime.tasks.wait_all();
        result
    }

    /// Parse and run `source` as a program in a fresh root environment,
    /// joining all tasks before returning.
    pub fn run_source(&self, file: &str, source: &str) -> Result<Value, Diagnostic> {
        let program = vine_parse::parse_source(source, &self.runtime.interner)
            .map_err(|err| err.to_diagnostic(file, source))?;
        let context = self.context(file, source);
        let env = self.new_root(Arc::clone(&context));
        self.eval_safe(&program, &env, &context)
            .map_err(|err| err.to_diagnostic())
    }

    /// Text of an interned name.
    #[inline]
    pub(crate) fn name_str(&self, name: Name) -> &'static str {
        self.runtime.interner.lookup(name)
    }

    /// Error for a failed scope operation on `name`.
    pub(crate) fn scope_error(&self, err: ScopeError, name: Name) -> EvalError {
        let text = self.name_str(name);
        match err {
            ScopeError::AlreadyDeclared => already_declared(text),
            ScopeError::Undefined => undefined_variable(text),
            ScopeError::Constant => const_violation(text),
            ScopeError::ReadOnly => read_only_assign(text),
        }
    }

    /// Count one level of script-level call nesting.
    pub(crate) fn enter_call(&self) -> Result<DepthGuard<'_>, EvalError> {
        let depth = self.depth.get() + 1;
        if depth > self.runtime.max_depth {
            return Err(recursion_limit(self.runtime.max_depth));
        }
        self.depth.set(depth);
        Ok(DepthGuard { depth: &self.depth })
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the call depth on drop.
pub(crate) struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests;
