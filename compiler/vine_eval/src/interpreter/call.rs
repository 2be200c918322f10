//! Function calls, task calls and continuation chains.

use std::sync::Arc;

use smallvec::SmallVec;
use vine_ir::ast::{ChainLink, Expr, ExprKind, TaskChain};
use vine_stack::ensure_sufficient_stack;

use super::{EvalScope, Flow, Interpreter, ScopedEnv};
use crate::environment::{EnvRef, ModuleContext};
use crate::errors::{
    arity_mismatch, invalid_control_flow, not_a_function, value_not_callable, EvalError,
    EvalResult,
};
use crate::modules::NativeEnv;
use crate::task::{CatchHandler, Task, TaskBody, TaskHandle};
use crate::value::{Closure, Value};

/// Evaluated call arguments.
type Args = SmallVec<[Value; 4]>;

impl Interpreter {
    pub(crate) fn eval_call(&self, callee: &Expr, args: &[Expr], scope: EvalScope<'_>) -> EvalResult {
        let (function, args) = self.eval_call_parts(callee, args, scope)?;
        self.call_value(&function, &args, callee)
    }

    /// Callee first, then arguments left to right.
    fn eval_call_parts(
        &self,
        callee: &Expr,
        args: &[Expr],
        scope: EvalScope<'_>,
    ) -> Result<(Value, Args), EvalError> {
        let function = self.eval_expr(callee, scope)?;
        let args = args
            .iter()
            .map(|arg| self.eval_expr(arg, scope))
            .collect::<Result<Args, _>>()?;
        Ok((function, args))
    }

    fn call_value(&self, function: &Value, args: &[Value], callee: &Expr) -> EvalResult {
        match function {
            Value::Native(native) => native.call(&NativeEnv::new(&self.runtime.printer), args),
            Value::Function(closure) => self.call_closure(closure, args),
            other => Err(match &callee.kind {
                ExprKind::Ident(name) => not_a_function(self.name_str(*name)),
                _ => value_not_callable(other.type_name()),
            }),
        }
    }

    /// Apply a closure. Task closures start a task and return its handle.
    pub fn call_closure(&self, closure: &Arc<Closure>, args: &[Value]) -> EvalResult {
        if args.len() != closure.arity() {
            return Err(arity_mismatch(closure.name, closure.arity(), args.len()));
        }
        if closure.is_task() {
            let task = self.prepare_task(closure, args)?;
            task.start();
            return Ok(Value::Task(task));
        }
        let _depth = self.enter_call()?;
        ensure_sufficient_stack(|| {
            let env = ScopedEnv::child(self.arena(), &closure.env);
            self.bind_params(closure, &env, args)?;
            self.run_body(closure, &env)
        })
    }

    fn bind_params(&self, closure: &Closure, env: &EnvRef, args: &[Value]) -> Result<(), EvalError> {
        for (param, arg) in closure.decl.params.iter().zip(args) {
            self.arena()
                .define_passing(env, *param, arg.clone())
                .map_err(|err| self.scope_error(err, *param))?;
        }
        Ok(())
    }

    /// Run a closure body in a prepared call environment.
    fn run_body(&self, closure: &Closure, env: &EnvRef) -> EvalResult {
        let scope = EvalScope::new(env, &closure.context);
        let result = match self.exec_stmts(&closure.decl.body.stmts, scope) {
            Ok(Flow::Normal(value) | Flow::Return(value)) => Ok(value),
            Ok(Flow::Break) => Err(invalid_control_flow("break").with_span(closure.decl.span)),
            Ok(Flow::Continue) => {
                Err(invalid_control_flow("continue").with_span(closure.decl.span))
            }
            Err(err) => Err(err),
        };
        result.map_err(|err| err.locate(&closure.context))
    }

    /// A task running `closure` with `args`, registered but not started.
    ///
    /// The call environment is owned by the task and released by its thread
    /// once the body is done.
    fn prepare_task(&self, closure: &Arc<Closure>, args: &[Value]) -> Result<TaskHandle, EvalError> {
        let arena = self.arena();
        let env = arena.child(&closure.env);
        if let Err(err) = self.bind_params(closure, &env, args) {
            arena.release(env);
            return Err(err);
        }
        let runtime = Arc::clone(&self.runtime);
        let closure = Arc::clone(closure);
        let name = closure.name;
        let body: TaskBody = Box::new(move |_| {
            let interp = Interpreter::from_runtime(runtime);
            let env = ScopedEnv::adopt(interp.arena(), env);
            interp.run_body(&closure, &env)
        });
        let task = Task::new(&self.runtime.tasks, body);
        tracing::debug!(task = task.id(), function = name, "task created");
        Ok(task)
    }

    /// `call to (r): ... catch (e): ... end`
    ///
    /// Evaluates to the continuation task, which finishes with the last
    /// link's result, or with the catch block's result if anything failed.
    pub(crate) fn eval_chain(&self, chain: &Arc<TaskChain>, scope: EvalScope<'_>) -> EvalResult {
        let (source, fresh) = self.chain_source(&chain.call, scope)?;

        let body: TaskBody = {
            let runtime = Arc::clone(&self.runtime);
            let chain = Arc::clone(chain);
            let env = scope.env.clone();
            let context = Arc::clone(scope.context);
            Box::new(move |input| {
                let interp = Interpreter::from_runtime(runtime);
                let mut current = input;
                for link in &chain.links {
                    current = interp.run_link(link, current, &env, &context)?;
                }
                Ok(current)
            })
        };
        let catch: CatchHandler = {
            let runtime = Arc::clone(&self.runtime);
            let chain = Arc::clone(chain);
            let env = scope.env.clone();
            let context = Arc::clone(scope.context);
            Box::new(move |err| match &chain.catch {
                Some(link) => {
                    let interp = Interpreter::from_runtime(runtime);
                    interp
                        .run_link(link, Value::error(err), &env, &context)
                        .unwrap_or_else(|err| {
                            tracing::warn!(error = %err, "continuation catch block failed");
                            Value::Nil
                        })
                }
                None => {
                    tracing::warn!(error = %err, "continuation error swallowed");
                    Value::Nil
                }
            })
        };

        let continuation = Task::new(&self.runtime.tasks, body);
        continuation.set_catch(catch);
        source.then(Arc::clone(&continuation));
        if fresh {
            source.start();
        }
        Ok(Value::Task(continuation))
    }

    /// The task a chain continues from. `true` when it was created here and
    /// still has to be started.
    ///
    /// A failure of the source task reaches the continuation, whose catch
    /// block handles it in place of the `to` links.
    fn chain_source(&self, call: &Expr, scope: EvalScope<'_>) -> Result<(TaskHandle, bool), EvalError> {
        let outcome = match &call.kind {
            ExprKind::Call { callee, args } => {
                let (function, args) = self.eval_call_parts(callee, args, scope)?;
                if let Value::Function(closure) = &function {
                    if closure.is_task() {
                        if args.len() != closure.arity() {
                            return Err(arity_mismatch(closure.name, closure.arity(), args.len()));
                        }
                        return Ok((self.prepare_task(closure, &args)?, true));
                    }
                }
                match self.call_value(&function, &args, callee) {
                    Ok(Value::Task(task)) => return Ok((task, false)),
                    other => other,
                }
            }
            _ => match self.eval_expr(call, scope)? {
                Value::Task(task) => return Ok((task, false)),
                other => Ok(other),
            },
        };
        let task = Task::new(&self.runtime.tasks, Box::new(move |_| outcome));
        Ok((task, true))
    }

    /// Run one `to` or `catch` block with its parameter bound to `input`.
    fn run_link(
        &self,
        link: &ChainLink,
        input: Value,
        env: &EnvRef,
        context: &Arc<ModuleContext>,
    ) -> EvalResult {
        let child = ScopedEnv::child(self.arena(), env);
        if let Some(param) = link.param {
            self.arena()
                .define_passing(&child, param, input)
                .map_err(|err| self.scope_error(err, param))?;
        }
        let scope = EvalScope::new(&child, context);
        let result = match self.exec_stmts(&link.body.stmts, scope) {
            Ok(Flow::Normal(value) | Flow::Return(value)) => Ok(value),
            Ok(Flow::Break) => Err(invalid_control_flow("break").with_span(link.span)),
            Ok(Flow::Continue) => Err(invalid_control_flow("continue").with_span(link.span)),
            Err(err) => Err(err),
        };
        result.map_err(|err| err.locate(context))
    }
}
