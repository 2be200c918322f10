//! Evaluation errors.
//!
//! Every fallible evaluator function returns [`EvalResult`]. Errors are built
//! through the factory functions below so message wording stays in one
//! place. An error picks up the span of the node where it surfaced and,
//! once it crosses a call or program boundary, the file/line/column of that
//! span in the source it belongs to.

use std::fmt;

use thiserror::Error;
use vine_diagnostic::{Diagnostic, LineIndex, Location};
use vine_ir::ast::BinaryOp;
use vine_ir::Span;

use crate::environment::ModuleContext;
use crate::value::Value;

/// Result of evaluation.
pub type EvalResult = Result<Value, EvalError>;

/// Error category, exposed to scripts as `err.kind`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EvalErrorKind {
    Undefined,
    AlreadyDeclared,
    ConstViolation,
    TypeMismatch,
    DivisionByZero,
    Arity,
    NotAFunction,
    NotFound,
    IndexOutOfRange,
    InvalidModule,
    IntegerOverflow,
    InvalidControlFlow,
    RecursionLimit,
    Panic,
    Generic,
}

impl EvalErrorKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Undefined => "Undefined",
            Self::AlreadyDeclared => "AlreadyDeclared",
            Self::ConstViolation => "ConstViolation",
            Self::TypeMismatch => "TypeMismatch",
            Self::DivisionByZero => "DivisionByZero",
            Self::Arity => "Arity",
            Self::NotAFunction => "NotAFunction",
            Self::NotFound => "NotFound",
            Self::IndexOutOfRange => "IndexOutOfRange",
            Self::InvalidModule => "InvalidModule",
            Self::IntegerOverflow => "IntegerOverflow",
            Self::InvalidControlFlow => "InvalidControlFlow",
            Self::RecursionLimit => "RecursionLimit",
            Self::Panic => "Panic",
            Self::Generic => "Error",
        }
    }
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A runtime failure.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub message: String,
    /// Node where the error surfaced.
    pub span: Option<Span>,
    /// Resolved position; set once and never overwritten.
    pub location: Option<Location>,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind, message: impl Into<String>) -> Self {
        EvalError {
            kind,
            message: message.into(),
            span: None,
            location: None,
        }
    }

    /// Attach `span` unless a more specific one is already present.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    /// Resolve the span against the source it belongs to. Errors that
    /// already carry a location keep it.
    #[must_use]
    pub fn locate(mut self, context: &ModuleContext) -> Self {
        if self.location.is_some() {
            return self;
        }
        let (line, column) = match self.span {
            Some(span) => LineIndex::new(&context.source).span_start(&context.source, span),
            None => (0, 0),
        };
        self.location = Some(Location::new(context.file.clone(), line, column));
        self
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::interpreter(self.message.clone());
        match &self.location {
            Some(location) if location.line > 0 => diagnostic.with_location(location.clone()),
            _ => diagnostic,
        }
    }
}

// Variable and scope errors

pub fn undefined_variable(name: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::Undefined,
        format!("variable {name} is not defined"),
    )
}

pub fn already_declared(name: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::AlreadyDeclared,
        format!("variable {name} is already declared"),
    )
}

pub fn const_violation(name: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::ConstViolation,
        format!("constant {name} cannot be reassigned"),
    )
}

pub fn expose_undefined(name: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::Undefined,
        format!("cannot expose {name}: it is not defined"),
    )
}

// Operator errors

pub fn division_by_zero() -> EvalError {
    EvalError::new(EvalErrorKind::DivisionByZero, "Divide by zero")
}

pub fn integer_overflow(op: BinaryOp) -> EvalError {
    EvalError::new(
        EvalErrorKind::IntegerOverflow,
        format!("integer overflow in `{op}`"),
    )
}

pub fn invalid_operands(op: &str, left: &str, right: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::TypeMismatch,
        format!("operator `{op}` cannot be applied to {left} and {right}"),
    )
}

pub fn invalid_operand(op: &str, operand: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::TypeMismatch,
        format!("operator `{op}` cannot be applied to {operand}"),
    )
}

pub fn type_mismatch(message: impl Into<String>) -> EvalError {
    EvalError::new(EvalErrorKind::TypeMismatch, message)
}

// Call errors

pub fn arity_mismatch(name: &str, expected: usize, got: usize) -> EvalError {
    let noun = if expected == 1 { "argument" } else { "arguments" };
    EvalError::new(
        EvalErrorKind::Arity,
        format!("function {name} expects {expected} {noun}, got {got}"),
    )
}

pub fn not_a_function(name: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::NotAFunction,
        format!("variable {name} is not a function"),
    )
}

pub fn value_not_callable(type_name: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::NotAFunction,
        format!("value of type {type_name} is not a function"),
    )
}

pub fn recursion_limit(limit: usize) -> EvalError {
    EvalError::new(
        EvalErrorKind::RecursionLimit,
        format!("maximum recursion depth exceeded (limit: {limit})"),
    )
}

pub fn invalid_control_flow(keyword: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::InvalidControlFlow,
        format!("`{keyword}` outside of a loop"),
    )
}

pub fn task_panicked(message: &str) -> EvalError {
    EvalError::new(EvalErrorKind::Panic, format!("task panicked: {message}"))
}

// Access errors

pub fn property_not_found(property: &str, type_name: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::NotFound,
        format!("property {property} not found on {type_name}"),
    )
}

pub fn cannot_read_property(property: &str, type_name: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::TypeMismatch,
        format!("cannot read property {property} of {type_name}"),
    )
}

pub fn index_out_of_range(index: i64, len: usize) -> EvalError {
    EvalError::new(
        EvalErrorKind::IndexOutOfRange,
        format!("index {index} out of range for length {len}"),
    )
}

pub fn cannot_index(type_name: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::TypeMismatch,
        format!("cannot index into {type_name}"),
    )
}

pub fn duplicate_key(key: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::AlreadyDeclared,
        format!("key {key} is already defined"),
    )
}

pub fn not_iterable(type_name: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::TypeMismatch,
        format!("cannot iterate over {type_name}"),
    )
}

// Module errors

pub fn module_not_found(name: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::InvalidModule,
        format!("module {name} is not defined or file not found"),
    )
}

pub fn module_member_not_found(module: &str, member: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::NotFound,
        format!("module {module} has no member {member}"),
    )
}

pub fn read_only_module(module: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::InvalidModule,
        format!("module {module} is read-only"),
    )
}

pub fn read_only_assign(name: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::InvalidModule,
        format!("cannot assign {name}: the mounted module is read-only"),
    )
}

pub fn invalid_module(name: &str, reason: impl fmt::Display) -> EvalError {
    EvalError::new(
        EvalErrorKind::InvalidModule,
        format!("cannot load module {name}: {reason}"),
    )
}

// Native function errors

pub fn invalid_argument(function: &str, message: impl fmt::Display) -> EvalError {
    EvalError::new(
        EvalErrorKind::TypeMismatch,
        format!("{function}: {message}"),
    )
}
