//! `glb`: the prelude.

use crate::errors::{invalid_argument, EvalResult};
use crate::value::{Module, Value};

use super::{native_module, Arity, NativeEnv, NativeFn, PRELUDE};

static FUNCTIONS: [NativeFn; 5] = [
    NativeFn::new("print", Arity::Variadic, print),
    NativeFn::new("len", Arity::Exact(1), len),
    NativeFn::new("push", Arity::Exact(2), push),
    NativeFn::new("keys", Arity::Exact(1), keys),
    NativeFn::new("str", Arity::Exact(1), to_str),
];

pub(super) fn module() -> Module {
    native_module(PRELUDE, &FUNCTIONS)
}

/// Arguments separated by spaces, then a newline.
fn print(env: &NativeEnv<'_>, args: &[Value]) -> EvalResult {
    let line = args
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    env.println(&line);
    Ok(Value::Nil)
}

fn len(_: &NativeEnv<'_>, args: &[Value]) -> EvalResult {
    let n = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(store) => store.len(),
        other => {
            return Err(invalid_argument(
                "len",
                format!("{} has no length", other.type_name()),
            ))
        }
    };
    Ok(Value::Int(i64::try_from(n).unwrap_or(i64::MAX)))
}

/// Append to an array, returning the new length.
fn push(_: &NativeEnv<'_>, args: &[Value]) -> EvalResult {
    match &args[0] {
        Value::Array(items) => {
            let n = items.push(args[1].clone());
            Ok(Value::Int(i64::try_from(n).unwrap_or(i64::MAX)))
        }
        other => Err(invalid_argument(
            "push",
            format!("expected an array, got {}", other.type_name()),
        )),
    }
}

fn keys(_: &NativeEnv<'_>, args: &[Value]) -> EvalResult {
    let keys = match &args[0] {
        Value::Object(store) => store.keys(),
        Value::Module(module) => module.members.keys(),
        other => {
            return Err(invalid_argument(
                "keys",
                format!("expected an object, got {}", other.type_name()),
            ))
        }
    };
    Ok(Value::array(keys.into_iter().map(Value::Str).collect()))
}

fn to_str(_: &NativeEnv<'_>, args: &[Value]) -> EvalResult {
    Ok(match &args[0] {
        Value::Str(s) => Value::Str(s.clone()),
        other => Value::string(other.to_string()),
    })
}
