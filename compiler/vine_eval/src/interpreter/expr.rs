//! Expression evaluation.

use vine_ir::ast::{AssignOp, Expr, ExprKind, LogicalOp, UpdateOp};
use vine_ir::Name;
use vine_stack::ensure_sufficient_stack;

use super::member::{get_index, get_property, set_index, set_property};
use super::{EvalScope, Interpreter};
use crate::environment::ScopeError;
use crate::errors::{
    duplicate_key, invalid_operand, type_mismatch, undefined_variable, EvalError, EvalErrorKind,
    EvalResult,
};
use crate::operators::{evaluate_binary, evaluate_unary};
use crate::task::current_task;
use crate::value::{Store, Value};

impl Interpreter {
    /// Evaluate an expression. Errors without a position get this node's.
    pub(crate) fn eval_expr(&self, expr: &Expr, scope: EvalScope<'_>) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_expr_inner(expr, scope))
            .map_err(|err| err.with_span(expr.span))
    }

    fn eval_expr_inner(&self, expr: &Expr, scope: EvalScope<'_>) -> EvalResult {
        match &expr.kind {
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Float(x) => Ok(Value::Float(*x)),
            ExprKind::Str(text) => Ok(Value::Str(text.clone())),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Nil => Ok(Value::Nil),
            ExprKind::Ident(name) => self.lookup(*name, scope),
            ExprKind::Array(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval_expr(item, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(values))
            }
            ExprKind::Object(props) => {
                let store = Store::new();
                for prop in props {
                    let value = self.eval_expr(&prop.value, scope)?;
                    store
                        .define(&prop.key, value)
                        .map_err(|_| duplicate_key(&prop.key).with_span(prop.span))?;
                }
                Ok(Value::Object(store))
            }
            ExprKind::Lambda(decl) => Ok(self.make_closure(decl, scope)),
            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(operand, scope)?;
                evaluate_unary(*op, &value)
            }
            ExprKind::Update { op, prefix, target } => self.eval_update(*op, *prefix, *target, scope),
            ExprKind::Binary { op, left, right } => {
                let left = self.eval_expr(left, scope)?;
                let right = self.eval_expr(right, scope)?;
                evaluate_binary(*op, &left, &right)
            }
            ExprKind::Logical { op, left, right } => {
                let left = self.eval_expr(left, scope)?.is_true();
                let result = match op {
                    LogicalOp::And => left && self.eval_expr(right, scope)?.is_true(),
                    LogicalOp::Or => left || self.eval_expr(right, scope)?.is_true(),
                };
                Ok(Value::Bool(result))
            }
            ExprKind::Assign { op, target, value } => self.eval_assign(*op, target, value, scope),
            ExprKind::Call { callee, args } => self.eval_call(callee, args, scope),
            ExprKind::Member { object, property } => {
                let object = self.eval_expr(object, scope)?;
                get_property(&object, self.name_str(*property))
            }
            ExprKind::Mount { object, body } => self.eval_mount(object, body, scope),
            ExprKind::Index { object, index } => {
                let object = self.eval_expr(object, scope)?;
                let index = self.eval_expr(index, scope)?;
                get_index(&object, &index)
            }
            ExprKind::Typeof(operand) => {
                let value = self.eval_expr(operand, scope)?;
                Ok(Value::string(value.type_name()))
            }
            ExprKind::Wait(operand) => match self.eval_expr(operand, scope)? {
                Value::Task(task) => {
                    if current_task() == Some(task.id()) {
                        return Err(EvalError::new(
                            EvalErrorKind::Generic,
                            "a task cannot wait on itself",
                        ));
                    }
                    Ok(task.wait())
                }
                other => Ok(other),
            },
            ExprKind::Chain(chain) => self.eval_chain(chain, scope),
        }
    }

    /// Resolve an identifier: the lexical chain, then the mount scope, then
    /// the prelude, then builtin module names.
    pub(crate) fn lookup(&self, name: Name, scope: EvalScope<'_>) -> EvalResult {
        if let Some(value) = self.arena().get(scope.env, name) {
            return Ok(value);
        }
        let text = self.name_str(name);
        if let Some(value) = scope.mount.and_then(|mount| mount.lookup(text)) {
            return Ok(value);
        }
        let builtins = &self.runtime.builtins;
        builtins
            .prelude(text)
            .or_else(|| builtins.get(text))
            .ok_or_else(|| undefined_variable(text))
    }

    /// Reassign an identifier. A name bound nowhere in the chain lands on
    /// the mount scope when one is installed.
    pub(crate) fn assign_name(
        &self,
        name: Name,
        value: Value,
        scope: EvalScope<'_>,
    ) -> Result<(), EvalError> {
        let fallback = scope.mount.map(|mount| (mount, value.clone()));
        match self.arena().set(scope.env, name, value) {
            Ok(()) => Ok(()),
            Err(ScopeError::Undefined) => match fallback {
                Some((mount, value)) => mount
                    .assign(self.name_str(name), value)
                    .map_err(|err| self.scope_error(err, name)),
                None => Err(self.scope_error(ScopeError::Undefined, name)),
            },
            Err(err) => Err(self.scope_error(err, name)),
        }
    }

    fn eval_assign(
        &self,
        op: AssignOp,
        target: &Expr,
        value: &Expr,
        scope: EvalScope<'_>,
    ) -> EvalResult {
        match &target.kind {
            ExprKind::Ident(name) => {
                let rhs = self.eval_expr(value, scope)?;
                let value = match op.binary() {
                    Some(bin) => evaluate_binary(bin, &self.lookup(*name, scope)?, &rhs)?,
                    None => rhs,
                };
                self.assign_name(*name, value.clone(), scope)?;
                Ok(value)
            }
            ExprKind::Member { object, property } => {
                let object = self.eval_expr(object, scope)?;
                let property = self.name_str(*property);
                let rhs = self.eval_expr(value, scope)?;
                let value = match op.binary() {
                    Some(bin) => evaluate_binary(bin, &get_property(&object, property)?, &rhs)?,
                    None => rhs,
                };
                set_property(&object, property, value.clone())?;
                Ok(value)
            }
            ExprKind::Index { object, index } => {
                let object = self.eval_expr(object, scope)?;
                let index = self.eval_expr(index, scope)?;
                let rhs = self.eval_expr(value, scope)?;
                let value = match op.binary() {
                    Some(bin) => evaluate_binary(bin, &get_index(&object, &index)?, &rhs)?,
                    None => rhs,
                };
                set_index(&object, &index, value.clone())?;
                Ok(value)
            }
            _ => Err(type_mismatch("invalid assignment target")),
        }
    }

    /// `++x`, `x++`, `--x`, `x--`.
    fn eval_update(&self, op: UpdateOp, prefix: bool, target: Name, scope: EvalScope<'_>) -> EvalResult {
        let old = self.lookup(target, scope)?;
        if !matches!(old, Value::Int(_) | Value::Float(_)) {
            return Err(invalid_operand(op.as_symbol(), old.type_name()));
        }
        let new = evaluate_binary(op.binary(), &old, &Value::Int(1))?;
        self.assign_name(target, new.clone(), scope)?;
        Ok(if prefix { new } else { old })
    }
}
