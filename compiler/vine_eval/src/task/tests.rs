use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::errors::{division_by_zero, EvalErrorKind};
use pretty_assertions::assert_eq;

#[test]
fn spawn_and_wait() {
    let registry = TaskRegistry::new();
    let task = Task::spawn(&registry, Box::new(|_| Ok(Value::Int(42))));
    assert_eq!(task.wait(), Value::Int(42));
    assert_eq!(task.state(), TaskState::Done);
    assert_eq!(task.result(), Some(Value::Int(42)));
}

#[test]
fn new_task_is_ready_and_registered() {
    let registry = TaskRegistry::new();
    let task = Task::new(&registry, Box::new(|_| Ok(Value::Nil)));
    assert_eq!(task.state(), TaskState::Ready);
    assert_eq!(registry.len(), 1);

    task.start();
    task.wait();
    registry.wait_all();
    assert!(registry.is_empty());
}

#[test]
fn ids_are_unique_and_increasing() {
    let registry = TaskRegistry::new();
    let a = Task::spawn(&registry, Box::new(|_| Ok(Value::Nil)));
    let b = Task::spawn(&registry, Box::new(|_| Ok(Value::Nil)));
    assert!(b.id() > a.id());
    registry.wait_all();
}

#[test]
fn error_goes_to_catch_handler_once() {
    let registry = TaskRegistry::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);

    let task = Task::new(&registry, Box::new(|_| Err(division_by_zero())));
    task.set_catch(Box::new(move |err| {
        seen.fetch_add(1, Ordering::SeqCst);
        Value::string(err.message)
    }));
    task.start();

    assert_eq!(task.wait(), Value::from("Divide by zero"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn error_without_handler_yields_nil() {
    let registry = TaskRegistry::new();
    let task = Task::spawn(&registry, Box::new(|_| Err(division_by_zero())));
    assert_eq!(task.wait(), Value::Nil);
}

#[test]
fn panic_is_caught() {
    let registry = TaskRegistry::new();
    let task = Task::new(
        &registry,
        Box::new(|_| -> EvalResult { panic!("worker exploded") }),
    );
    task.set_catch(Box::new(|err| {
        assert_eq!(err.kind, EvalErrorKind::Panic);
        Value::string(err.message)
    }));
    task.start();
    assert_eq!(task.wait(), Value::from("task panicked: worker exploded"));
}

#[test]
fn panicking_catch_handler_yields_nil() {
    let registry = TaskRegistry::new();
    let task = Task::new(&registry, Box::new(|_| Err(division_by_zero())));
    task.set_catch(Box::new(|_| panic!("handler exploded")));
    task.start();
    assert_eq!(task.wait(), Value::Nil);
}

#[test]
fn next_receives_parent_result() {
    let registry = TaskRegistry::new();
    let parent = Task::new(
        &registry,
        Box::new(|_| {
            std::thread::sleep(Duration::from_millis(20));
            Ok(Value::Int(20))
        }),
    );
    let child = parent.next(Box::new(|input| {
        let n = input.as_int().unwrap_or(0);
        Ok(Value::Int(n + 1))
    }));
    assert_eq!(child.state(), TaskState::Ready);
    assert_eq!(child.parent().map(|p| p.id()), Some(parent.id()));

    parent.start();
    assert_eq!(child.wait(), Value::Int(21));
}

#[test]
fn unhandled_failure_reaches_continuation_catch() {
    let registry = TaskRegistry::new();
    let ran = Arc::new(AtomicUsize::new(0));
    let parent = Task::new(&registry, Box::new(|_| Err(division_by_zero())));
    let body_runs = Arc::clone(&ran);
    let child = parent.next(Box::new(move |input| {
        body_runs.fetch_add(1, Ordering::SeqCst);
        Ok(input)
    }));
    child.set_catch(Box::new(|err| Value::string(err.message)));

    parent.start();
    assert_eq!(child.wait(), Value::from("Divide by zero"));
    assert_eq!(ran.load(Ordering::SeqCst), 0);
    assert_eq!(parent.wait(), Value::Nil);
    assert_eq!(parent.error().map(|err| err.message), Some("Divide by zero".to_owned()));
}

#[test]
fn handled_failure_is_not_passed_on() {
    let registry = TaskRegistry::new();
    let parent = Task::new(&registry, Box::new(|_| Err(division_by_zero())));
    parent.set_catch(Box::new(|_| Value::Int(0)));
    parent.start();
    parent.wait();
    assert_eq!(parent.error(), None);

    let child = Task::new(
        &registry,
        Box::new(|input| Ok(Value::Int(input.as_int().unwrap_or(-1) + 1))),
    );
    parent.then(Arc::clone(&child));
    assert_eq!(child.wait(), Value::Int(1));
}

#[test]
fn then_on_finished_task_starts_immediately() {
    let registry = TaskRegistry::new();
    let parent = Task::spawn(&registry, Box::new(|_| Ok(Value::from("ready"))));
    parent.wait();

    let child = Task::new(&registry, Box::new(Ok::<Value, EvalError>));
    parent.then(Arc::clone(&child));
    assert_eq!(child.wait(), Value::from("ready"));
}

#[test]
fn second_continuation_runs_after_first() {
    let registry = TaskRegistry::new();
    let parent = Task::new(&registry, Box::new(|_| Ok(Value::Int(1))));
    let first = parent.next(Box::new(|v| Ok(Value::Int(v.as_int().unwrap_or(0) * 10))));
    let second = parent.next(Box::new(|v| Ok(Value::Int(v.as_int().unwrap_or(0) + 5))));

    parent.start();
    assert_eq!(first.wait(), Value::Int(10));
    assert_eq!(second.wait(), Value::Int(15));
}

#[test]
fn wait_all_covers_continuations() {
    let registry = TaskRegistry::new();
    let finished = Arc::new(AtomicUsize::new(0));

    let parent = Task::new(
        &registry,
        Box::new(|_| {
            std::thread::sleep(Duration::from_millis(10));
            Ok(Value::Nil)
        }),
    );
    let counter = Arc::clone(&finished);
    let child = parent.next(Box::new(move |_| {
        std::thread::sleep(Duration::from_millis(10));
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Nil)
    }));
    parent.start();

    registry.wait_all();
    assert_eq!(finished.load(Ordering::SeqCst), 1);
    assert_eq!(child.state(), TaskState::Done);
    assert!(registry.is_empty());
}

#[test]
fn wait_all_covers_tasks_spawned_by_tasks() {
    let registry = TaskRegistry::new();
    let inner_done = Arc::new(AtomicUsize::new(0));

    let spawner_registry = Arc::clone(&registry);
    let counter = Arc::clone(&inner_done);
    Task::spawn(
        &registry,
        Box::new(move |_| {
            Task::spawn(
                &spawner_registry,
                Box::new(move |_| {
                    std::thread::sleep(Duration::from_millis(20));
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Value::Nil)
                }),
            );
            Ok(Value::Nil)
        }),
    );

    registry.wait_all();
    assert_eq!(inner_done.load(Ordering::SeqCst), 1);
}

#[test]
fn current_task_is_set_inside_body() {
    let registry = TaskRegistry::new();
    let task = Task::spawn(
        &registry,
        Box::new(|_| {
            let id = current_task().map_or(0, |id| i64::try_from(id).unwrap_or(-1));
            Ok(Value::Int(id))
        }),
    );
    let id = i64::try_from(task.id()).unwrap();
    assert_eq!(task.wait(), Value::Int(id));
    assert_eq!(current_task(), None);
}

#[test]
fn start_twice_runs_once() {
    let registry = TaskRegistry::new();
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let task = Task::new(
        &registry,
        Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Nil)
        }),
    );
    task.start();
    task.start();
    task.wait();
    task.start();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}
