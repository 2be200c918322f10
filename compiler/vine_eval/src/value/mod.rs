//! Runtime values.
//!
//! Scalars are stored inline. Arrays and objects are shared, internally
//! locked containers: copying a `Value` shares them, so a task thread and
//! its spawner see the same array.

mod store;

pub use store::{Store, PROTO_KEY};

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use vine_ir::ast::FnDecl;

use crate::environment::{EnvRef, ModuleContext, MountScope, ScopeError};
use crate::errors::EvalError;
use crate::modules::NativeFunction;
use crate::task::TaskHandle;

/// Container nesting rendered before `...` is printed instead.
const MAX_DISPLAY_DEPTH: usize = 32;

#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Array(Array),
    Object(Store),
    Function(Arc<Closure>),
    Native(Arc<dyn NativeFunction>),
    Module(Arc<Module>),
    Task(TaskHandle),
    Error(Arc<EvalError>),
}

impl Value {
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Array::new(items))
    }

    pub fn error(err: EvalError) -> Self {
        Value::Error(Arc::new(err))
    }

    /// Name reported by `typeof`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) | Value::Native(_) => "func",
            Value::Module(_) => "module",
            Value::Task(_) => "task",
            Value::Error(_) => "error",
        }
    }

    /// Only the boolean `true` counts as true.
    #[inline]
    pub fn is_true(&self) -> bool {
        matches!(self, Value::Bool(true))
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    fn fmt_depth(&self, f: &mut fmt::Formatter<'_>, nested: bool, depth: usize) -> fmt::Result {
        if depth > MAX_DISPLAY_DEPTH {
            return f.write_str("...");
        }
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) if nested => write!(f, "{s:?}"),
            Value::Str(s) => f.write_str(s),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.snapshot().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt_depth(f, true, depth + 1)?;
                }
                f.write_str("]")
            }
            Value::Object(store) => {
                f.write_str("{")?;
                for (i, (key, value)) in store.entries().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: ")?;
                    value.fmt_depth(f, true, depth + 1)?;
                }
                f.write_str("}")
            }
            Value::Function(closure) => write!(f, "<fn {}>", closure.name),
            Value::Native(native) => write!(f, "<fn {}>", native.name()),
            Value::Module(module) => write!(f, "<module {}>", module.name),
            Value::Task(task) => write!(f, "<task #{}>", task.id()),
            Value::Error(err) => f.write_str(&err.message),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_depth(f, false, 0)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(x) => write!(f, "Float({x:?})"),
            Value::Error(err) => write!(f, "Error({:?}: {})", err.kind, err.message),
            other => fmt::Display::fmt(other, f),
        }
    }
}

/// Scalars and strings compare by content, everything else by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Arc::ptr_eq(a, b),
            (Value::Module(a), Value::Module(b)) => Arc::ptr_eq(a, b),
            (Value::Task(a), Value::Task(b)) => a.id() == b.id(),
            (Value::Error(a), Value::Error(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

/// Shared, internally locked array.
#[derive(Clone, Default)]
pub struct Array(Arc<RwLock<Vec<Value>>>);

impl Array {
    pub fn new(items: Vec<Value>) -> Self {
        Array(Arc::new(RwLock::new(items)))
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.read().get(index).cloned()
    }

    /// Replace an existing element; `false` if `index` is out of range.
    pub fn set(&self, index: usize, value: Value) -> bool {
        match self.0.write().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Append and return the new length.
    pub fn push(&self, value: Value) -> usize {
        let mut items = self.0.write();
        items.push(value);
        items.len()
    }

    /// Copy of the current elements.
    pub fn snapshot(&self) -> Vec<Value> {
        self.0.read().clone()
    }

    pub fn ptr_eq(&self, other: &Array) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A function value: declaration plus the environment it was defined in.
pub struct Closure {
    pub decl: Arc<FnDecl>,
    /// Declared name, or `lambda`.
    pub name: &'static str,
    pub env: EnvRef,
    pub context: Arc<ModuleContext>,
}

impl Closure {
    #[inline]
    pub fn is_task(&self) -> bool {
        self.decl.is_task
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.decl.params.len()
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("name", &self.name)
            .field("arity", &self.arity())
            .field("is_task", &self.is_task())
            .finish_non_exhaustive()
    }
}

/// A builtin module or the export surface of a loaded file.
#[derive(Debug)]
pub struct Module {
    pub name: Arc<str>,
    pub members: Store,
}

impl Module {
    pub fn new(name: impl Into<Arc<str>>, members: Store) -> Self {
        Module {
            name: name.into(),
            members,
        }
    }
}

impl MountScope for Module {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.members.get(name)
    }

    fn assign(&self, _name: &str, _value: Value) -> Result<(), ScopeError> {
        Err(ScopeError::ReadOnly)
    }
}
