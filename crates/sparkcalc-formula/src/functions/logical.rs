use sparkcalc_core::{ErrorKind, Value};

use super::Arg;

/// Truth value of an IF condition
pub fn condition(value: &Value) -> Result<bool, ErrorKind> {
    value.to_boolean()
}

/// Logical values among the arguments. Reference members that are empty or
/// text are skipped; direct arguments must coerce.
fn truths(args: &[Arg]) -> Result<Vec<bool>, ErrorKind> {
    let mut out = Vec::new();

    for arg in args {
        match arg {
            Arg::Value(value) => out.push(value.to_boolean()?),
            Arg::Reference(values) => {
                for value in values {
                    match value {
                        Value::Empty | Value::Text(_) => {}
                        other => out.push(other.to_boolean()?),
                    }
                }
            }
        }
    }

    if out.is_empty() {
        return Err(ErrorKind::TypeMismatch);
    }
    Ok(out)
}

/// AND - True when every logical value is true
pub fn and(args: &[Arg]) -> Value {
    match truths(args) {
        Ok(values) => Value::Boolean(values.iter().all(|b| *b)),
        Err(e) => Value::Error(e),
    }
}

/// OR - True when any logical value is true
pub fn or(args: &[Arg]) -> Value {
    match truths(args) {
        Ok(values) => Value::Boolean(values.iter().any(|b| *b)),
        Err(e) => Value::Error(e),
    }
}

/// NOT - Logical negation
pub fn not(values: &[Value]) -> Value {
    match values.first().map(Value::to_boolean) {
        Some(Ok(b)) => Value::Boolean(!b),
        Some(Err(e)) => Value::Error(e),
        None => Value::Error(ErrorKind::ArityMismatch),
    }
}
