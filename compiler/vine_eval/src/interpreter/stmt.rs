//! Statement execution.

use std::sync::Arc;

use vine_ir::ast::{Block, Else, Expr, FnDecl, ForHead, ForStmt, Stmt, StmtKind, SwitchCase};
use vine_ir::Name;
use vine_stack::ensure_sufficient_stack;

use super::{EvalScope, Flow, Interpreter, ScopedEnv};
use crate::errors::{not_iterable, EvalError};
use crate::operators::values_equal;
use crate::value::{Closure, Value};

impl Interpreter {
    pub(crate) fn exec_stmt(&self, stmt: &Stmt, scope: EvalScope<'_>) -> Result<Flow, EvalError> {
        ensure_sufficient_stack(|| self.exec_stmt_inner(stmt, scope))
            .map_err(|err| err.with_span(stmt.span))
    }

    fn exec_stmt_inner(&self, stmt: &Stmt, scope: EvalScope<'_>) -> Result<Flow, EvalError> {
        match &stmt.kind {
            StmtKind::Expr(expr) => self.eval_expr(expr, scope).map(Flow::Normal),
            StmtKind::Let {
                name,
                value,
                constant,
            } => {
                let value = self.eval_expr(value, scope)?;
                self.declare(*name, value, *constant, scope)?;
                Ok(Flow::Normal(Value::Nil))
            }
            StmtKind::Fn(decl) => {
                let closure = self.make_closure(decl, scope);
                if let Some(name) = decl.name {
                    self.declare(name, closure, false, scope)?;
                }
                Ok(Flow::Normal(Value::Nil))
            }
            StmtKind::If {
                test,
                then,
                otherwise,
            } => self.exec_if(test, then, otherwise.as_ref(), scope),
            StmtKind::For(for_stmt) => self.exec_for(for_stmt, scope),
            StmtKind::Switch { test, cases } => self.exec_switch(test, cases, scope),
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr, scope)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }
            StmtKind::Break => Ok(Flow::Break),
            StmtKind::Continue => Ok(Flow::Continue),
            StmtKind::Use(decl) => {
                self.exec_use(decl, scope)?;
                Ok(Flow::Normal(Value::Nil))
            }
            StmtKind::Expose(expose) => {
                self.exec_expose(expose, scope)?;
                Ok(Flow::Normal(Value::Nil))
            }
        }
    }

    /// Run statements in order, stopping at the first non-normal flow.
    pub(crate) fn exec_stmts(&self, stmts: &[Stmt], scope: EvalScope<'_>) -> Result<Flow, EvalError> {
        let mut last = Value::Nil;
        for stmt in stmts {
            match self.exec_stmt(stmt, scope)? {
                Flow::Normal(value) => last = value,
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal(last))
    }

    /// Run a block, in its own child environment if it declares anything.
    pub(crate) fn exec_block(&self, block: &Block, scope: EvalScope<'_>) -> Result<Flow, EvalError> {
        if block.declares {
            let env = ScopedEnv::child(self.arena(), scope.env);
            self.exec_stmts(&block.stmts, scope.with_env(&env))
        } else {
            self.exec_stmts(&block.stmts, scope)
        }
    }

    /// Bind a new name in the current environment.
    pub(crate) fn declare(
        &self,
        name: Name,
        value: Value,
        constant: bool,
        scope: EvalScope<'_>,
    ) -> Result<(), EvalError> {
        let arena = self.arena();
        let result = if constant {
            arena.define_const(scope.env, name, value)
        } else {
            arena.define(scope.env, name, value)
        };
        result.map_err(|err| self.scope_error(err, name))
    }

    pub(crate) fn make_closure(&self, decl: &Arc<FnDecl>, scope: EvalScope<'_>) -> Value {
        let name = decl.name.map_or("lambda", |name| self.name_str(name));
        Value::Function(Arc::new(Closure {
            decl: Arc::clone(decl),
            name,
            env: scope.env.clone(),
            context: Arc::clone(scope.context),
        }))
    }

    fn exec_if(
        &self,
        test: &Expr,
        then: &Block,
        otherwise: Option<&Else>,
        scope: EvalScope<'_>,
    ) -> Result<Flow, EvalError> {
        let passed = match self.eval_expr(test, scope) {
            Ok(value) => value.is_true(),
            Err(err) => {
                tracing::debug!(error = %err, "if test failed, taking else branch");
                false
            }
        };
        if passed {
            return self.exec_block(then, scope);
        }
        match otherwise {
            Some(Else::Block(block)) => self.exec_block(block, scope),
            Some(Else::If(stmt)) => self.exec_stmt(stmt, scope),
            None => Ok(Flow::Normal(Value::Nil)),
        }
    }

    fn exec_for(&self, for_stmt: &ForStmt, scope: EvalScope<'_>) -> Result<Flow, EvalError> {
        let header = ScopedEnv::child(self.arena(), scope.env);
        let head_scope = scope.with_env(&header);
        match &for_stmt.head {
            ForHead::Counted { init, test, update } => {
                if let Some(init) = init {
                    if let flow @ (Flow::Return(_) | Flow::Break | Flow::Continue) =
                        self.exec_stmt(init, head_scope)?
                    {
                        return Ok(flow);
                    }
                }
                loop {
                    if let Some(test) = test {
                        if !self.eval_expr(test, head_scope)?.is_true() {
                            break;
                        }
                    }
                    match self.exec_iteration(for_stmt, head_scope)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal(_) | Flow::Continue => {}
                    }
                    if let Some(update) = update {
                        self.eval_expr(update, head_scope)?;
                    }
                }
            }
            ForHead::Range { binding, iterable } => {
                let items = iteration_items(self.eval_expr(iterable, head_scope)?)?;
                for item in items {
                    self.arena().set_local(&header, *binding, item);
                    match self.exec_iteration(for_stmt, head_scope)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal(_) | Flow::Continue => {}
                    }
                }
            }
        }
        Ok(Flow::Normal(Value::Nil))
    }

    /// One pass over a loop body. Simple bodies share the header scope;
    /// anything else gets a fresh child per iteration.
    fn exec_iteration(&self, for_stmt: &ForStmt, head_scope: EvalScope<'_>) -> Result<Flow, EvalError> {
        if for_stmt.simple_body {
            self.exec_stmts(&for_stmt.body.stmts, head_scope)
        } else {
            let env = ScopedEnv::child(self.arena(), head_scope.env);
            self.exec_stmts(&for_stmt.body.stmts, head_scope.with_env(&env))
        }
    }

    fn exec_switch(
        &self,
        test: &Expr,
        cases: &[SwitchCase],
        scope: EvalScope<'_>,
    ) -> Result<Flow, EvalError> {
        let subject = self.eval_expr(test, scope)?;
        for case in cases {
            if case.is_default() || self.case_matches(&subject, case, scope)? {
                return self.exec_block(&case.body, scope);
            }
        }
        Ok(Flow::Normal(Value::Nil))
    }

    fn case_matches(
        &self,
        subject: &Value,
        case: &SwitchCase,
        scope: EvalScope<'_>,
    ) -> Result<bool, EvalError> {
        for test in &case.tests {
            if values_equal(subject, &self.eval_expr(test, scope)?) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Values visited by `for x in value`.
fn iteration_items(value: Value) -> Result<Vec<Value>, EvalError> {
    match value {
        Value::Array(items) => Ok(items.snapshot()),
        Value::Str(text) => Ok(text
            .chars()
            .map(|c| Value::string(c.to_string()))
            .collect()),
        Value::Object(store) => Ok(store.keys().into_iter().map(Value::Str).collect()),
        Value::Module(module) => Ok(module
            .members
            .keys()
            .into_iter()
            .map(Value::Str)
            .collect()),
        other => Err(not_iterable(other.type_name())),
    }
}
