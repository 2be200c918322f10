//! Tasks: units of work running on their own thread.
//!
//! A task is created `Ready` and registered with its runtime's
//! [`TaskRegistry`], runs once (`Running`), and ends `Done` with a result.
//! A failing body, returned error or panic, is handed to the task's catch
//! handler, whose value becomes the result; without a handler the result is
//! `nil` and the error stays on the task. A task may carry one continuation
//! (`next`), started with the parent's result as input once the parent is
//! `Done`. A continuation of a task that failed without a handler skips its
//! body and fails with the parent's error instead.
//!
//! Tasks leave the registry when they finish, so [`TaskRegistry::wait_all`]
//! returns once every started task and every pending continuation is done.

use std::any::Any;
use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread;

use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::errors::{task_panicked, EvalError, EvalResult};
use crate::value::Value;

/// Work run by a task. Receives the parent's result (`nil` for a root task).
pub type TaskBody = Box<dyn FnOnce(Value) -> EvalResult + Send>;

/// Turns a failure into the task's result.
pub type CatchHandler = Box<dyn FnOnce(EvalError) -> Value + Send>;

pub type TaskHandle = Arc<Task>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TaskState {
    Ready,
    Running,
    Done,
}

thread_local! {
    static CURRENT_TASK: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Id of the task running on this thread, if any.
pub fn current_task() -> Option<u64> {
    CURRENT_TASK.with(Cell::get)
}

struct TaskInner {
    state: TaskState,
    body: Option<TaskBody>,
    input: EvalResult,
    result: Option<Value>,
    error: Option<EvalError>,
    next: Option<TaskHandle>,
    parent: Option<Weak<Task>>,
    catch: Option<CatchHandler>,
}

pub struct Task {
    id: u64,
    registry: Arc<TaskRegistry>,
    inner: Mutex<TaskInner>,
    done: Condvar,
}

impl Task {
    /// Create and register a task without starting it.
    pub fn new(registry: &Arc<TaskRegistry>, body: TaskBody) -> TaskHandle {
        let task = Arc::new(Task {
            id: registry.next_id(),
            registry: Arc::clone(registry),
            inner: Mutex::new(TaskInner {
                state: TaskState::Ready,
                body: Some(body),
                input: Ok(Value::Nil),
                result: None,
                error: None,
                next: None,
                parent: None,
                catch: None,
            }),
            done: Condvar::new(),
        });
        registry.register(Arc::clone(&task));
        task
    }

    /// Create, register and start a task.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn spawn(registry: &Arc<TaskRegistry>, body: TaskBody) -> TaskHandle {
        let task = Self::new(registry, body);
        task.start();
        task
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> TaskState {
        self.inner.lock().state
    }

    /// The result, once `Done`.
    pub fn result(&self) -> Option<Value> {
        self.inner.lock().result.clone()
    }

    /// The failure this task ended with, when no catch handler took it.
    pub fn error(&self) -> Option<EvalError> {
        self.inner.lock().error.clone()
    }

    /// The task whose completion starts this one.
    pub fn parent(&self) -> Option<TaskHandle> {
        self.inner.lock().parent.as_ref().and_then(Weak::upgrade)
    }

    /// Install the failure handler. Must happen before the task starts to
    /// be sure it applies.
    pub fn set_catch(&self, handler: CatchHandler) {
        self.inner.lock().catch = Some(handler);
    }

    /// Run `child` after this task, with this task's result as its input.
    ///
    /// If this task already has a continuation, `child` runs after that one.
    /// If this task is already done, `child` starts right away.
    pub fn then(self: &Arc<Self>, child: TaskHandle) {
        let finished = {
            let mut inner = self.inner.lock();
            if let Some(existing) = inner.next.clone() {
                drop(inner);
                existing.then(child);
                return;
            }
            child.inner.lock().parent = Some(Arc::downgrade(self));
            if inner.state == TaskState::Done {
                Some(inner.outcome())
            } else {
                inner.next = Some(Arc::clone(&child));
                None
            }
        };
        if let Some(outcome) = finished {
            child.inner.lock().input = outcome;
            child.start();
        }
    }

    /// Create a continuation running `body` after this task.
    pub fn next(self: &Arc<Self>, body: TaskBody) -> TaskHandle {
        let child = Task::new(&self.registry, body);
        self.then(Arc::clone(&child));
        child
    }

    /// Start a `Ready` task on its own thread. Does nothing otherwise.
    pub fn start(self: &Arc<Self>) {
        {
            let mut inner = self.inner.lock();
            if inner.state != TaskState::Ready {
                return;
            }
            inner.state = TaskState::Running;
        }
        debug!(task = self.id, "task started");
        let task = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name(format!("vine-task-{}", self.id))
            .spawn(move || task.run());
        if let Err(err) = spawned {
            warn!(task = self.id, error = %err, "could not spawn task thread, running inline");
            self.run();
        }
    }

    /// Block until the task is done and return its result.
    pub fn wait(&self) -> Value {
        let mut inner = self.inner.lock();
        while inner.state != TaskState::Done {
            self.done.wait(&mut inner);
        }
        inner.result.clone().unwrap_or(Value::Nil)
    }

    fn run(&self) {
        let (body, input) = {
            let mut inner = self.inner.lock();
            (inner.body.take(), std::mem::replace(&mut inner.input, Ok(Value::Nil)))
        };
        let previous = CURRENT_TASK.with(|current| current.replace(Some(self.id)));
        let outcome = match (body, input) {
            (_, Err(err)) => {
                debug!(task = self.id, "parent failed, skipping body");
                Err(err)
            }
            (Some(body), Ok(input)) => catch_unwind(AssertUnwindSafe(|| body(input)))
                .unwrap_or_else(|payload| Err(task_panicked(&panic_message(&*payload)))),
            (None, Ok(_)) => Ok(Value::Nil),
        };
        let (result, error) = match outcome {
            Ok(value) => (value, None),
            Err(err) => self.recover(err),
        };
        CURRENT_TASK.with(|current| current.set(previous));
        self.finish(result, error);
    }

    /// The result of a failed task, plus the error when nothing handled it.
    fn recover(&self, err: EvalError) -> (Value, Option<EvalError>) {
        let handler = self.inner.lock().catch.take();
        match handler {
            Some(handler) => {
                let value = catch_unwind(AssertUnwindSafe(|| handler(err))).unwrap_or_else(
                    |payload| {
                        warn!(
                            task = self.id,
                            panic = %panic_message(&*payload),
                            "task catch handler panicked"
                        );
                        Value::Nil
                    },
                );
                (value, None)
            }
            None => {
                debug!(task = self.id, error = %err, "task failed without a catch handler");
                (Value::Nil, Some(err))
            }
        }
    }

    fn finish(&self, result: Value, error: Option<EvalError>) {
        let (next, outcome) = {
            let mut inner = self.inner.lock();
            inner.result = Some(result);
            inner.error = error;
            inner.state = TaskState::Done;
            inner.catch = None;
            (inner.next.take(), inner.outcome())
        };
        self.registry.remove(self.id);
        self.done.notify_all();
        debug!(task = self.id, "task done");
        if let Some(next) = next {
            next.inner.lock().input = outcome;
            next.start();
        }
    }
}

impl TaskInner {
    /// What a continuation receives from this finished task.
    fn outcome(&self) -> EvalResult {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(self.result.clone().unwrap_or(Value::Nil)),
        }
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_owned()
    }
}

/// Every unfinished task of one runtime.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: Mutex<FxHashMap<u64, TaskHandle>>,
    next_id: AtomicU64,
}

impl TaskRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn register(&self, task: TaskHandle) {
        self.tasks.lock().insert(task.id, task);
    }

    fn remove(&self, id: u64) {
        self.tasks.lock().remove(&id);
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered tasks at this instant.
    pub fn snapshot(&self) -> Vec<TaskHandle> {
        self.tasks.lock().values().cloned().collect()
    }

    /// Block until no task is left, including tasks registered while
    /// waiting.
    pub fn wait_all(&self) {
        loop {
            let pending = self.snapshot();
            if pending.is_empty() {
                break;
            }
            debug!(count = pending.len(), "waiting for tasks");
            for task in pending {
                task.wait();
            }
        }
    }
}

#[cfg(test)]
mod tests;
