//! Member, index and mount access.

use vine_ir::ast::Expr;

use super::{EvalScope, Interpreter};
use crate::environment::MountScope;
use crate::errors::{
    cannot_index, cannot_read_property, index_out_of_range, module_member_not_found,
    property_not_found, read_only_module, type_mismatch, EvalError, EvalResult,
};
use crate::value::Value;

fn length(len: usize) -> Value {
    Value::Int(i64::try_from(len).unwrap_or(i64::MAX))
}

/// Text of a computed key.
fn property_key(key: &Value) -> Result<String, EvalError> {
    match key {
        Value::Str(text) => Ok(text.to_string()),
        Value::Int(_) | Value::Float(_) => Ok(key.to_string()),
        other => Err(type_mismatch(format!(
            "a {} cannot be used as a property key",
            other.type_name()
        ))),
    }
}

/// `object.property`
pub(crate) fn get_property(object: &Value, property: &str) -> EvalResult {
    match object {
        Value::Object(store) => store
            .get(property)
            .ok_or_else(|| property_not_found(property, "object")),
        Value::Module(module) => module
            .members
            .get(property)
            .ok_or_else(|| module_member_not_found(&module.name, property)),
        Value::Array(items) if property == "length" => Ok(length(items.len())),
        Value::Str(text) if property == "length" => Ok(length(text.chars().count())),
        Value::Error(err) => match property {
            "message" => Ok(Value::string(err.message.as_str())),
            "kind" => Ok(Value::string(err.kind.name())),
            _ => Err(property_not_found(property, "error")),
        },
        other => Err(cannot_read_property(property, other.type_name())),
    }
}

/// `object.property = value`
pub(crate) fn set_property(
    object: &Value,
    property: &str,
    value: Value,
) -> Result<(), EvalError> {
    match object {
        Value::Object(store) => {
            store.set(property, value);
            Ok(())
        }
        Value::Module(module) => Err(read_only_module(&module.name)),
        other => Err(type_mismatch(format!(
            "cannot set property {property} on {}",
            other.type_name()
        ))),
    }
}

/// `object[index]`. Integer indices address arrays and strings; any
/// other key is read as a property name.
pub(crate) fn get_index(object: &Value, index: &Value) -> EvalResult {
    match (object, index) {
        (Value::Array(items), Value::Int(i)) => usize::try_from(*i)
            .ok()
            .and_then(|at| items.get(at))
            .ok_or_else(|| index_out_of_range(*i, items.len())),
        (Value::Str(text), Value::Int(i)) => usize::try_from(*i)
            .ok()
            .and_then(|at| text.chars().nth(at))
            .map(|c| Value::string(c.to_string()))
            .ok_or_else(|| index_out_of_range(*i, text.chars().count())),
        (
            Value::Object(_) | Value::Module(_) | Value::Error(_) | Value::Array(_) | Value::Str(_),
            key,
        ) => get_property(object, &property_key(key)?),
        (other, _) => Err(cannot_index(other.type_name())),
    }
}

/// `object[index] = value`
pub(crate) fn set_index(
    object: &Value,
    index: &Value,
    value: Value,
) -> Result<(), EvalError> {
    match (object, index) {
        (Value::Array(items), Value::Int(i)) => {
            let stored = usize::try_from(*i).is_ok_and(|at| items.set(at, value));
            if stored {
                Ok(())
            } else {
                Err(index_out_of_range(*i, items.len()))
            }
        }
        (Value::Object(_) | Value::Module(_), key) => {
            set_property(object, &property_key(key)?, value)
        }
        (other, _) => Err(cannot_index(other.type_name())),
    }
}

impl Interpreter {
    /// `object.(body)`: evaluate `body` with `object` as the mount scope.
    pub(crate) fn eval_mount(&self, object: &Expr, body: &Expr, scope: EvalScope<'_>) -> EvalResult {
        let target = self.eval_expr(object, scope)?;
        let mount: &dyn MountScope = match &target {
            Value::Object(store) => store,
            Value::Module(module) => &**module,
            other => {
                return Err(type_mismatch(format!(
                    "cannot evaluate inside a {}",
                    other.type_name()
                )))
            }
        };
        tracing::trace!(kind = target.type_name(), "mounted scope");
        self.eval_expr(
            body,
            EvalScope {
                env: scope.env,
                mount: Some(mount),
                context: scope.context,
            },
        )
    }
}
