//! The fixed function library.
//!
//! Names resolve to a closed [`Function`] enum; adding a function means adding
//! a variant, its arity and a dispatch arm.

pub mod aggregate;
pub mod datetime;
pub mod logical;
pub mod math;

use chrono::{DateTime, Utc};
use sparkcalc_core::{ErrorKind, Value};

/// An evaluated function argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Result of an expression
    Value(Value),
    /// Cell or range reference, flattened row-major
    Reference(Vec<Value>),
}

/// Accepted argument counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Between(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::Between(min, max) => (min..=max).contains(&count),
            Arity::AtLeast(min) => count >= min,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    // Aggregates
    Sum,
    Average,
    Min,
    Max,
    Count,
    Median,

    // Logical
    If,
    And,
    Or,
    Not,

    // Date and time
    Today,
    Now,
    Date,
    Time,

    // Arithmetic
    Abs,
    Floor,
    Ceiling,
    Round,
    Trunc,
    Sqrt,
    Power,
    Mod,

    // Scientific
    Exp,
    Ln,
    Log,
    Log10,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Degrees,
    Radians,
    Pi,
    E,
}

impl Function {
    /// Look up a function by name, case-insensitive
    pub fn from_name(name: &str) -> Option<Self> {
        let func = match name.to_ascii_uppercase().as_str() {
            "SUM" => Function::Sum,
            "AVERAGE" => Function::Average,
            "MIN" => Function::Min,
            "MAX" => Function::Max,
            "COUNT" => Function::Count,
            "MEDIAN" => Function::Median,
            "IF" => Function::If,
            "AND" => Function::And,
            "OR" => Function::Or,
            "NOT" => Function::Not,
            "TODAY" => Function::Today,
            "NOW" => Function::Now,
            "DATE" => Function::Date,
            "TIME" => Function::Time,
            "ABS" => Function::Abs,
            "FLOOR" => Function::Floor,
            "CEILING" | "CEIL" => Function::Ceiling,
            "ROUND" => Function::Round,
            "TRUNC" => Function::Trunc,
            "SQRT" => Function::Sqrt,
            "POWER" | "POW" => Function::Power,
            "MOD" => Function::Mod,
            "EXP" => Function::Exp,
            "LN" => Function::Ln,
            "LOG" => Function::Log,
            "LOG10" => Function::Log10,
            "SIN" => Function::Sin,
            "COS" => Function::Cos,
            "TAN" => Function::Tan,
            "ASIN" => Function::Asin,
            "ACOS" => Function::Acos,
            "ATAN" => Function::Atan,
            "DEGREES" => Function::Degrees,
            "RADIANS" => Function::Radians,
            "PI" => Function::Pi,
            "E" => Function::E,
            _ => return None,
        };
        Some(func)
    }

    pub fn arity(&self) -> Arity {
        use Function::*;
        match self {
            Sum | Average | Min | Max | Count | Median | And | Or => Arity::AtLeast(1),
            If => Arity::Exact(3),
            Today | Now | Pi | E => Arity::Exact(0),
            Floor | Ceiling | Round | Trunc | Log => Arity::Between(1, 2),
            Power | Mod => Arity::Exact(2),
            Not | Date | Time | Abs | Sqrt | Exp | Ln | Log10 | Sin | Cos | Tan | Asin | Acos
            | Atan | Degrees | Radians => Arity::Exact(1),
        }
    }

    /// Whether range arguments are flattened into this function
    pub fn accepts_ranges(&self) -> bool {
        use Function::*;
        matches!(self, Sum | Average | Min | Max | Count | Median | And | Or)
    }
}

/// Run a function over already-evaluated arguments. Arity has been checked by
/// the caller; `now` is the pass clock for TODAY/NOW. IF never arrives here:
/// the evaluator selects its branch before evaluating it.
pub(crate) fn call(func: Function, args: &[Arg], now: DateTime<Utc>) -> Value {
    use Function::*;

    match func {
        Sum => aggregate::sum(args),
        Average => aggregate::average(args),
        Min => aggregate::min(args),
        Max => aggregate::max(args),
        Count => aggregate::count(args),
        Median => aggregate::median(args),
        And => logical::and(args),
        Or => logical::or(args),
        _ => match scalars(args) {
            Ok(values) => call_scalar(func, &values, now),
            Err(e) => Value::Error(e),
        },
    }
}

fn call_scalar(func: Function, values: &[Value], now: DateTime<Utc>) -> Value {
    use Function::*;

    match func {
        Not => logical::not(values),

        Today => datetime::today(now),
        Now => datetime::now(now),
        Date => datetime::date(values),
        Time => datetime::time(values),

        Abs => math::abs(values),
        Floor => math::floor(values),
        Ceiling => math::ceiling(values),
        Round => math::round(values),
        Trunc => math::trunc(values),
        Sqrt => math::sqrt(values),
        Power => math::power(values),
        Mod => math::modulo(values),

        Exp => math::apply(values, f64::exp),
        Ln => math::apply(values, f64::ln),
        Log => math::log(values),
        Log10 => math::apply(values, f64::log10),
        Sin => math::apply(values, f64::sin),
        Cos => math::apply(values, f64::cos),
        Tan => math::apply(values, f64::tan),
        Asin => math::apply(values, f64::asin),
        Acos => math::apply(values, f64::acos),
        Atan => math::apply(values, f64::atan),
        Degrees => math::apply(values, f64::to_degrees),
        Radians => math::apply(values, f64::to_radians),
        Pi => Value::Number(std::f64::consts::PI),
        E => Value::Number(std::f64::consts::E),

        If => unreachable!("IF is short-circuited by the evaluator"),
        Sum | Average | Min | Max | Count | Median | And | Or => {
            unreachable!("range functions are dispatched in call()")
        }
    }
}

/// Unwrap scalar arguments, propagating the first error
fn scalars(args: &[Arg]) -> Result<Vec<Value>, ErrorKind> {
    args.iter()
        .map(|arg| match arg {
            Arg::Value(Value::Error(e)) => Err(*e),
            Arg::Value(v) => Ok(v.clone()),
            Arg::Reference(_) => Err(ErrorKind::InvalidRange),
        })
        .collect()
}
