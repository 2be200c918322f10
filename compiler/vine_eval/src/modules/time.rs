//! `time`: wall clock and sleeping.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::errors::{invalid_argument, EvalResult};
use crate::value::{Module, Value};

use super::{int_arg, native_module, Arity, NativeEnv, NativeFn};

static FUNCTIONS: [NativeFn; 3] = [
    NativeFn::new("now", Arity::Exact(0), now),
    NativeFn::new("milli", Arity::Exact(0), milli),
    NativeFn::new("sleep", Arity::Exact(1), sleep),
];

pub(super) fn module() -> Module {
    native_module("time", &FUNCTIONS)
}

fn since_epoch() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

/// Unix time in seconds.
fn now(_: &NativeEnv<'_>, _: &[Value]) -> EvalResult {
    Ok(Value::Int(
        i64::try_from(since_epoch().as_secs()).unwrap_or(i64::MAX),
    ))
}

/// Unix time in milliseconds.
fn milli(_: &NativeEnv<'_>, _: &[Value]) -> EvalResult {
    Ok(Value::Int(
        i64::try_from(since_epoch().as_millis()).unwrap_or(i64::MAX),
    ))
}

/// Block the calling thread for the given number of milliseconds.
fn sleep(_: &NativeEnv<'_>, args: &[Value]) -> EvalResult {
    let ms = int_arg("sleep", &args[0])?;
    let ms = u64::try_from(ms)
        .map_err(|_| invalid_argument("sleep", "duration must not be negative"))?;
    std::thread::sleep(Duration::from_millis(ms));
    Ok(Value::Nil)
}
