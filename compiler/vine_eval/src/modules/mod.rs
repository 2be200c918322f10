//! Builtin modules.
//!
//! A builtin module is a table of named native functions. Natives are
//! called through the [`NativeFunction`] trait with a [`NativeEnv`] giving
//! access to the runtime's print handler.
//!
//! The `glb` module doubles as the prelude: its members resolve as bare
//! identifiers. Builtin module names themselves resolve without a `use`.

mod glb;
mod time;

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::errors::{arity_mismatch, EvalResult};
use crate::print_handler::PrintHandler;
use crate::value::{Module, Store, Value};

/// Name of the prelude module.
pub const PRELUDE: &str = "glb";

/// What a native function sees of its caller.
pub struct NativeEnv<'a> {
    printer: &'a PrintHandler,
}

impl<'a> NativeEnv<'a> {
    pub fn new(printer: &'a PrintHandler) -> Self {
        NativeEnv { printer }
    }

    pub fn println(&self, msg: &str) {
        self.printer.println(msg);
    }
}

/// A function implemented in Rust.
pub trait NativeFunction: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn call(&self, env: &NativeEnv<'_>, args: &[Value]) -> EvalResult;
}

/// Accepted argument counts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Variadic,
}

/// A native backed by a plain function pointer.
#[derive(Copy, Clone)]
pub struct NativeFn {
    name: &'static str,
    arity: Arity,
    func: fn(&NativeEnv<'_>, &[Value]) -> EvalResult,
}

impl NativeFn {
    pub const fn new(
        name: &'static str,
        arity: Arity,
        func: fn(&NativeEnv<'_>, &[Value]) -> EvalResult,
    ) -> Self {
        NativeFn { name, arity, func }
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFn({})", self.name)
    }
}

impl NativeFunction for NativeFn {
    fn name(&self) -> &str {
        self.name
    }

    fn call(&self, env: &NativeEnv<'_>, args: &[Value]) -> EvalResult {
        if let Arity::Exact(expected) = self.arity {
            if args.len() != expected {
                return Err(arity_mismatch(self.name, expected, args.len()));
            }
        }
        (self.func)(env, args)
    }
}

/// Build a module value from a list of natives.
pub fn native_module(name: &str, functions: &'static [NativeFn]) -> Module {
    let members = Store::new();
    for native in functions {
        members.set(native.name, Value::Native(Arc::new(*native)));
    }
    Module::new(name, members)
}

/// Builtin modules known to one runtime.
pub struct BuiltinModules {
    modules: FxHashMap<Arc<str>, Value>,
}

impl BuiltinModules {
    /// No modules at all.
    pub fn empty() -> Self {
        BuiltinModules {
            modules: FxHashMap::default(),
        }
    }

    /// `glb` and `time`.
    pub fn standard() -> Self {
        let mut modules = Self::empty();
        modules.register(glb::module());
        modules.register(time::module());
        modules
    }

    /// Add or replace a module.
    pub fn register(&mut self, module: Module) {
        self.modules
            .insert(module.name.clone(), Value::Module(Arc::new(module)));
    }

    /// A module value by name.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.modules.get(name).cloned()
    }

    /// A prelude member by name.
    pub fn prelude(&self, name: &str) -> Option<Value> {
        match self.modules.get(PRELUDE) {
            Some(Value::Module(module)) => module.members.get(name),
            _ => None,
        }
    }

    pub fn names(&self) -> Vec<Arc<str>> {
        let mut names: Vec<_> = self.modules.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for BuiltinModules {
    fn default() -> Self {
        Self::standard()
    }
}

/// Integer argument, accepting floats with no fractional part.
fn int_arg(function: &str, value: &Value) -> Result<i64, crate::errors::EvalError> {
    match value {
        Value::Int(n) => Ok(*n),
        #[expect(
            clippy::cast_possible_truncation,
            reason = "fractional values are rejected above"
        )]
        Value::Float(x) if x.fract() == 0.0 && x.is_finite() => Ok(*x as i64),
        other => Err(crate::errors::invalid_argument(
            function,
            format!("expected an integer, got {}", other.type_name()),
        )),
    }
}
