//! `use` and `expose`.

use std::path::Path;
use std::sync::Arc;

use vine_ir::ast::{Expose, StmtKind, UseDecl, UseMode};

use super::{EvalScope, Interpreter};
use crate::environment::ModuleContext;
use crate::errors::{
    expose_undefined, invalid_module, module_member_not_found, module_not_found, type_mismatch,
    EvalError,
};
use crate::loader::LoadedModule;
use crate::value::{Module, Value};

impl Interpreter {
    pub(crate) fn exec_use(&self, decl: &UseDecl, scope: EvalScope<'_>) -> Result<(), EvalError> {
        let module = self.resolve_module(&decl.source, scope)?;
        match &decl.mode {
            UseMode::Alias(alias) => self.declare(*alias, Value::Module(module), false, scope),
            UseMode::Pick(specifiers) => {
                for spec in specifiers {
                    let remote = self.name_str(spec.remote);
                    let value = module
                        .members
                        .get(remote)
                        .ok_or_else(|| module_member_not_found(&module.name, remote))?;
                    self.declare(spec.local_name(), value, false, scope)?;
                }
                Ok(())
            }
            UseMode::All => {
                for (key, value) in module.members.entries() {
                    let name = self.interner().intern(&key);
                    self.declare(name, value, false, scope)?;
                }
                Ok(())
            }
        }
    }

    /// A builtin module, or a source module loaded (once per runtime)
    /// relative to the importing file.
    ///
    /// Importing a file that is still loading further up the same import
    /// chain is a circular import. A file another thread is loading is
    /// waited for instead.
    fn resolve_module(&self, source: &str, scope: EvalScope<'_>) -> Result<Arc<Module>, EvalError> {
        if let Some(Value::Module(module)) = self.runtime.builtins.get(source) {
            return Ok(module);
        }
        let loaded = self
            .runtime
            .loader
            .load(source, &scope.context.workspace)
            .map_err(|err| invalid_module(source, err))?
            .ok_or_else(|| module_not_found(source))?;

        let path = loaded.path.clone();
        if scope.context.is_importing(&path) {
            return Err(invalid_module(source, "circular import"));
        }
        let in_flight = {
            let mut cache = self.runtime.modules.lock();
            if let Some(module) = cache.loaded.get(&path) {
                return Ok(Arc::clone(module));
            }
            match cache.loading.get(&path) {
                Some(pending) => Some(Arc::clone(pending)),
                None => {
                    cache.loading.insert(path.clone(), Arc::default());
                    None
                }
            }
        };
        if let Some(pending) = in_flight {
            tracing::debug!(path = %path.display(), "waiting for module loading on another thread");
            return pending.wait();
        }

        let result = self.run_module(source, loaded, scope.context);
        let pending = {
            let mut cache = self.runtime.modules.lock();
            if let Ok(module) = &result {
                cache.loaded.insert(path.clone(), Arc::clone(module));
            }
            cache.loading.remove(&path)
        };
        if let Some(pending) = pending {
            pending.complete(result.clone());
        }
        result
    }

    /// Run a module file in its own root environment and collect its exports.
    #[tracing::instrument(level = "debug", skip(self, loaded, importer), fields(path = %loaded.path.display()))]
    fn run_module(
        &self,
        name: &str,
        loaded: LoadedModule,
        importer: &ModuleContext,
    ) -> Result<Arc<Module>, EvalError> {
        let LoadedModule { path, source } = loaded;
        let file = path.display().to_string();
        let program = vine_parse::parse_source(&source, self.interner()).map_err(|err| {
            let diagnostic = err.to_diagnostic(&file, &source);
            let mut error = invalid_module(name, diagnostic.message);
            error.location = diagnostic.location;
            error
        })?;

        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        let mut imports = importer.imports.clone();
        imports.push(path.clone());
        let context = Arc::new(
            ModuleContext::new(file, source, importer.workspace.with_base(dir)).with_imports(imports),
        );
        let env = self.new_root(Arc::clone(&context));
        let result = self.eval_program(&program, &env, &context);
        let exports = self.arena().exports(&env).unwrap_or_default();
        self.arena().release(env);
        result?;

        let module_name = path
            .file_stem()
            .map_or_else(|| name.to_owned(), |stem| stem.to_string_lossy().into_owned());
        tracing::debug!(module = %module_name, members = exports.len(), "module loaded");
        Ok(Arc::new(Module::new(module_name, exports)))
    }

    pub(crate) fn exec_expose(&self, expose: &Expose, scope: EvalScope<'_>) -> Result<(), EvalError> {
        let (name, value) = match expose {
            Expose::Decl(stmt) => {
                self.exec_stmt(stmt, scope)?;
                let name = match &stmt.kind {
                    StmtKind::Let { name, .. } => *name,
                    StmtKind::Fn(decl) => match decl.name {
                        Some(name) => name,
                        None => return Err(type_mismatch("cannot expose an anonymous function")),
                    },
                    _ => return Err(type_mismatch("only declarations can be exposed")),
                };
                let value = self
                    .arena()
                    .get(scope.env, name)
                    .ok_or_else(|| expose_undefined(self.name_str(name)))?;
                (name, value)
            }
            Expose::Name { name, value: None } => {
                let value = self
                    .arena()
                    .get(scope.env, *name)
                    .ok_or_else(|| expose_undefined(self.name_str(*name)))?;
                (*name, value)
            }
            Expose::Name {
                name,
                value: Some(expr),
            } => {
                let value = self.eval_expr(expr, scope)?;
                if self.arena().get(scope.env, *name).is_some() {
                    self.assign_name(*name, value.clone(), scope)?;
                } else {
                    self.declare(*name, value.clone(), false, scope)?;
                }
                (*name, value)
            }
        };
        self.arena()
            .exports_or_create(scope.env)
            .set(self.name_str(name), value);
        Ok(())
    }
}
