use sparkcalc_core::{ErrorKind, Value};

use super::Arg;

/// Collect the numbers an aggregate operates on.
///
/// Reference members that are empty, text or boolean are skipped; a direct
/// text argument is a type error. The first error value wins.
fn numbers(args: &[Arg]) -> Result<Vec<f64>, ErrorKind> {
    let mut out = Vec::new();

    for arg in args {
        match arg {
            Arg::Value(value) => match value {
                Value::Empty => {}
                Value::Text(_) => return Err(ErrorKind::TypeMismatch),
                other => out.push(other.to_number()?),
            },
            Arg::Reference(values) => {
                for value in values {
                    match value {
                        Value::Number(n) | Value::DateTime(n) => out.push(*n),
                        Value::Error(e) => return Err(*e),
                        _ => {} // Skip empty, text, boolean
                    }
                }
            }
        }
    }

    Ok(out)
}

fn aggregate(args: &[Arg], f: impl FnOnce(Vec<f64>) -> Value) -> Value {
    match numbers(args) {
        Ok(nums) => f(nums),
        Err(e) => Value::Error(e),
    }
}

/// SUM - Sum of numeric values
pub fn sum(args: &[Arg]) -> Value {
    aggregate(args, |nums| Value::Number(nums.iter().sum()))
}

/// AVERAGE - Arithmetic mean
pub fn average(args: &[Arg]) -> Value {
    aggregate(args, |nums| {
        if nums.is_empty() {
            Value::Error(ErrorKind::DivideByZero)
        } else {
            Value::Number(nums.iter().sum::<f64>() / nums.len() as f64)
        }
    })
}

/// MIN - Smallest numeric value, 0 when there is none
pub fn min(args: &[Arg]) -> Value {
    aggregate(args, |nums| {
        Value::Number(nums.into_iter().reduce(f64::min).unwrap_or(0.0))
    })
}

/// MAX - Largest numeric value, 0 when there is none
pub fn max(args: &[Arg]) -> Value {
    aggregate(args, |nums| {
        Value::Number(nums.into_iter().reduce(f64::max).unwrap_or(0.0))
    })
}

/// COUNT - Number of numeric values
pub fn count(args: &[Arg]) -> Value {
    aggregate(args, |nums| Value::Number(nums.len() as f64))
}

/// MEDIAN - Middle value, mean of the two middle values for even counts
pub fn median(args: &[Arg]) -> Value {
    aggregate(args, |mut nums| {
        if nums.is_empty() {
            return Value::Error(ErrorKind::NumError);
        }
        nums.sort_by(f64::total_cmp);

        let mid = nums.len() / 2;
        if nums.len() % 2 == 0 {
            Value::Number((nums[mid - 1] + nums[mid]) / 2.0)
        } else {
            Value::Number(nums[mid])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(values: &[f64]) -> Vec<Arg> {
        values.iter().map(|n| Arg::Value(Value::Number(*n))).collect()
    }

    fn reference(values: Vec<Value>) -> Vec<Arg> {
        vec![Arg::Reference(values)]
    }

    #[test]
    fn test_sum() {
        assert_eq!(sum(&nums(&[1.0, 2.0, 3.0])), Value::Number(6.0));
        assert_eq!(sum(&reference(vec![])), Value::Number(0.0));
    }

    #[test]
    fn test_average() {
        assert_eq!(average(&nums(&[1.0, 2.0, 3.0])), Value::Number(2.0));
        assert_eq!(
            average(&reference(vec![Value::Empty, Value::Text("x".into())])),
            Value::Error(ErrorKind::DivideByZero)
        );
    }

    #[test]
    fn test_min_max() {
        assert_eq!(min(&nums(&[4.0, -1.0, 9.0])), Value::Number(-1.0));
        assert_eq!(max(&nums(&[4.0, -1.0, 9.0])), Value::Number(9.0));
        assert_eq!(max(&reference(vec![Value::Empty])), Value::Number(0.0));
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&nums(&[3.0, 1.0, 2.0])), Value::Number(2.0));
        assert_eq!(median(&nums(&[1.0, 2.0, 3.0, 4.0])), Value::Number(2.5));
        assert_eq!(median(&reference(vec![])), Value::Error(ErrorKind::NumError));
    }

    #[test]
    fn test_reference_members_skip_non_numbers() {
        let args = reference(vec![
            Value::Number(1.0),
            Value::Text("label".into()),
            Value::Boolean(true),
            Value::Empty,
            Value::Number(2.0),
        ]);
        assert_eq!(sum(&args), Value::Number(3.0));
        assert_eq!(count(&args), Value::Number(2.0));
    }

    #[test]
    fn test_direct_arguments() {
        let args = vec![Arg::Value(Value::Boolean(true)), Arg::Value(Value::Number(2.0))];
        assert_eq!(sum(&args), Value::Number(3.0));

        let args = vec![Arg::Value(Value::Text("a".into()))];
        assert_eq!(sum(&args), Value::Error(ErrorKind::TypeMismatch));
    }

    #[test]
    fn test_error_member_propagates() {
        let args = reference(vec![Value::Number(1.0), Value::Error(ErrorKind::RefOutOfRange)]);
        assert_eq!(sum(&args), Value::Error(ErrorKind::RefOutOfRange));
    }
}
