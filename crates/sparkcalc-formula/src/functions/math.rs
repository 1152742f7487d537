use sparkcalc_core::{ErrorKind, Value};

/// Wrap a numeric result; NaN and infinities become `#NUM!`
pub fn finite(n: f64) -> Value {
    if n.is_finite() {
        Value::Number(n)
    } else {
        Value::Error(ErrorKind::NumError)
    }
}

/// Floor division rounding toward negative infinity
pub fn floor_div(a: f64, b: f64) -> Result<f64, ErrorKind> {
    if b == 0.0 {
        return Err(ErrorKind::DivideByZero);
    }
    Ok((a / b).floor())
}

/// Remainder carrying the sign of the divisor
pub fn modulo_of(a: f64, b: f64) -> Result<f64, ErrorKind> {
    if b == 0.0 {
        return Err(ErrorKind::DivideByZero);
    }
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

fn arg(values: &[Value], i: usize) -> Result<f64, ErrorKind> {
    values.get(i).map_or(Err(ErrorKind::ArityMismatch), Value::to_number)
}

fn optional_arg(values: &[Value], i: usize) -> Result<Option<f64>, ErrorKind> {
    values.get(i).map(Value::to_number).transpose()
}

fn eval(f: impl FnOnce() -> Result<f64, ErrorKind>) -> Value {
    match f() {
        Ok(n) => finite(n),
        Err(e) => Value::Error(e),
    }
}

/// Apply a one-argument numeric function; out-of-domain input yields `#NUM!`
pub fn apply(values: &[Value], f: fn(f64) -> f64) -> Value {
    eval(|| Ok(f(arg(values, 0)?)))
}

/// ABS - Absolute value
pub fn abs(values: &[Value]) -> Value {
    apply(values, f64::abs)
}

/// SQRT - Square root
pub fn sqrt(values: &[Value]) -> Value {
    eval(|| {
        let n = arg(values, 0)?;
        if n < 0.0 {
            return Err(ErrorKind::NumError);
        }
        Ok(n.sqrt())
    })
}

/// Round to a multiple of `significance` with the given rounding function
fn to_multiple(values: &[Value], round: fn(f64) -> f64) -> Value {
    eval(|| {
        let n = arg(values, 0)?;
        match optional_arg(values, 1)? {
            None => Ok(round(n)),
            Some(sig) if sig == 0.0 => Err(ErrorKind::DivideByZero),
            Some(sig) => Ok(round(n / sig) * sig),
        }
    })
}

/// FLOOR - Round down, optionally to a multiple of significance
pub fn floor(values: &[Value]) -> Value {
    to_multiple(values, f64::floor)
}

/// CEILING - Round up, optionally to a multiple of significance
pub fn ceiling(values: &[Value]) -> Value {
    to_multiple(values, f64::ceil)
}

/// Integers from 2^52 up have no fractional part to round away
const INTEGRAL_THRESHOLD: f64 = 4_503_599_627_370_496.0;

/// Scale by 10^digits, apply `f`, scale back. Digits are truncated toward zero.
fn at_digits(values: &[Value], f: fn(f64) -> f64) -> Value {
    eval(|| {
        let n = arg(values, 0)?;
        let digits = optional_arg(values, 1)?.unwrap_or(0.0).trunc();
        if digits < -308.0 {
            return Ok(0.0);
        }

        let factor = 10f64.powi(digits.min(400.0) as i32);
        let scaled = n * factor;
        // More digits than f64 carries: the value is already exact at this precision
        if !scaled.is_finite() || scaled.abs() >= INTEGRAL_THRESHOLD {
            return Ok(n);
        }
        Ok(f(scaled) / factor)
    })
}

/// ROUND - Round half away from zero to `digits` decimals
pub fn round(values: &[Value]) -> Value {
    at_digits(values, f64::round)
}

/// TRUNC - Truncate toward zero to `digits` decimals
pub fn trunc(values: &[Value]) -> Value {
    at_digits(values, f64::trunc)
}

/// Exponentiation shared by `^` and POWER; zero to a negative power divides by zero
pub fn pow(base: f64, exponent: f64) -> Result<f64, ErrorKind> {
    if base == 0.0 && exponent < 0.0 {
        return Err(ErrorKind::DivideByZero);
    }
    Ok(base.powf(exponent))
}

/// POWER - Base raised to exponent
pub fn power(values: &[Value]) -> Value {
    eval(|| pow(arg(values, 0)?, arg(values, 1)?))
}

/// MOD - Remainder with the sign of the divisor
pub fn modulo(values: &[Value]) -> Value {
    eval(|| modulo_of(arg(values, 0)?, arg(values, 1)?))
}

/// LOG - Logarithm, natural unless a base is given
pub fn log(values: &[Value]) -> Value {
    eval(|| {
        let n = arg(values, 0)?;
        match optional_arg(values, 1)? {
            None => Ok(n.ln()),
            Some(base) if base <= 0.0 || base == 1.0 => Err(ErrorKind::NumError),
            Some(base) => Ok(n.ln() / base.ln()),
        }
    })
}
