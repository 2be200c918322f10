//! Interpreter construction.

use std::sync::Arc;

use parking_lot::Mutex;
use vine_ir::{SharedInterner, StringInterner};

use super::{Interpreter, ModuleCache, Runtime, DEFAULT_MAX_DEPTH, GLOBAL_NAME};
use crate::environment::EnvArena;
use crate::loader::{FsLoader, ModuleLoader};
use crate::modules::BuiltinModules;
use crate::print_handler::{stdout_handler, SharedPrintHandler};
use crate::task::TaskRegistry;
use crate::value::Store;
use crate::workspace::Workspace;

/// Builder for [`Interpreter`].
///
/// ```ignore
/// let interp = InterpreterBuilder::new()
///     .print_handler(buffer_handler())
///     .loader(MemoryLoader::new().with_file("lib.vine", "expose x = 1"))
///     .build();
/// ```
pub struct InterpreterBuilder {
    interner: Option<SharedInterner>,
    printer: Option<SharedPrintHandler>,
    loader: Option<Arc<dyn ModuleLoader>>,
    workspace: Option<Workspace>,
    builtins: Option<BuiltinModules>,
    max_depth: usize,
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        InterpreterBuilder {
            interner: None,
            printer: None,
            loader: None,
            workspace: None,
            builtins: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Share an interner with a parser that already ran.
    #[must_use]
    pub fn interner(mut self, interner: SharedInterner) -> Self {
        self.interner = Some(interner);
        self
    }

    #[must_use]
    pub fn print_handler(mut self, printer: SharedPrintHandler) -> Self {
        self.printer = Some(printer);
        self
    }

    #[must_use]
    pub fn loader(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    #[must_use]
    pub fn workspace(mut self, workspace: Workspace) -> Self {
        self.workspace = Some(workspace);
        self
    }

    #[must_use]
    pub fn builtins(mut self, builtins: BuiltinModules) -> Self {
        self.builtins = Some(builtins);
        self
    }

    /// Limit on nested script-level calls per thread.
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn build(self) -> Interpreter {
        let interner = self.interner.unwrap_or_else(StringInterner::shared);
        let global_name = interner.intern(GLOBAL_NAME);
        let workspace = self.workspace.unwrap_or_else(|| {
            std::env::current_dir()
                .map(Workspace::new)
                .unwrap_or_default()
        });
        let runtime = Runtime {
            interner,
            arena: EnvArena::new(),
            printer: self.printer.unwrap_or_else(stdout_handler),
            tasks: TaskRegistry::new(),
            builtins: self.builtins.unwrap_or_default(),
            loader: self.loader.unwrap_or_else(|| Arc::new(FsLoader)),
            modules: Mutex::new(ModuleCache::default()),
            workspace,
            global: Store::new(),
            global_name,
            max_depth: self.max_depth,
        };
        Interpreter::from_runtime(Arc::new(runtime))
    }
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
