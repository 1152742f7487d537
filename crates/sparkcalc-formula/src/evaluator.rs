use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use sparkcalc_core::{CellCoord, CellRange, ErrorKind, Grid, Value};

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::functions::{self, logical, math, Arg, Function};
use crate::parser;

/// Evaluates formula ASTs against a grid for the duration of one pass.
///
/// Formula cells reached through references are computed on demand and
/// memoized, so each cell is evaluated at most once per evaluator. A cell that
/// is reached again while it is still being resolved is part of a cycle; every
/// cell on that loop resolves to `#CIRCULAR!`.
pub struct Evaluator<'g> {
    grid: &'g Grid,
    now: DateTime<Utc>,
    cache: HashMap<CellCoord, Value>,
    /// Cells currently being resolved, innermost last
    stack: Vec<CellCoord>,
    resolving: HashSet<CellCoord>,
    cyclic: HashSet<CellCoord>,
}

impl<'g> Evaluator<'g> {
    pub fn new(grid: &'g Grid) -> Self {
        Self::at(grid, Utc::now())
    }

    /// Evaluator whose TODAY()/NOW() see the given instant
    pub fn at(grid: &'g Grid, now: DateTime<Utc>) -> Self {
        Self {
            grid,
            now,
            cache: HashMap::new(),
            stack: Vec::new(),
            resolving: HashSet::new(),
            cyclic: HashSet::new(),
        }
    }

    /// Cells found on a reference loop so far. Cells that only depend on a
    /// loop are not included.
    pub fn cyclic_cells(&self) -> &HashSet<CellCoord> {
        &self.cyclic
    }

    /// Evaluate an expression AST to a value
    pub fn evaluate(&mut self, expr: &Expr) -> Value {
        match expr {
            Expr::Literal(value) => value.clone(),

            Expr::CellRef(coord) => self.resolve_cell(*coord),

            // Ranges only make sense as arguments of aggregate functions
            Expr::Range(_) => Value::Error(ErrorKind::InvalidRange),

            Expr::Binary { left, op, right } => self.evaluate_binary(left, *op, right),

            Expr::Unary { op, operand } => self.evaluate_unary(*op, operand),

            Expr::Call { name, args } => self.evaluate_call(name, args),
        }
    }

    /// Current value of a cell, computing it first if it holds a formula
    pub fn resolve_cell(&mut self, coord: CellCoord) -> Value {
        let grid = self.grid;
        let cell = match grid.cell(coord) {
            Ok(cell) => cell,
            Err(e) => return Value::Error(e),
        };

        let Some(body) = cell.formula() else {
            return Value::from_literal(cell.raw());
        };

        if let Some(value) = self.cache.get(&coord) {
            return value.clone();
        }

        if self.resolving.contains(&coord) {
            self.mark_cycle(coord);
            return Value::Error(ErrorKind::CircularReference);
        }

        self.stack.push(coord);
        self.resolving.insert(coord);

        let value = match parser::parse(body) {
            Ok(expr) => self.evaluate(&expr),
            Err(e) => {
                tracing::debug!("Formula in {} failed to parse: {}", coord, e);
                Value::Error(ErrorKind::SyntaxError)
            }
        };

        self.stack.pop();
        self.resolving.remove(&coord);

        let value = if self.cyclic.contains(&coord) {
            Value::Error(ErrorKind::CircularReference)
        } else {
            value
        };

        self.cache.insert(coord, value.clone());
        value
    }

    /// Flag every cell from `coord` to the top of the stack as cyclic
    fn mark_cycle(&mut self, coord: CellCoord) {
        if let Some(start) = self.stack.iter().position(|c| *c == coord) {
            let members = &self.stack[start..];
            tracing::debug!(
                "Circular reference through {}",
                members
                    .iter()
                    .map(CellCoord::to_a1)
                    .collect::<Vec<_>>()
                    .join(" -> ")
            );
            self.cyclic.extend(members.iter().copied());
        }
    }

    /// Members of a range in row-major order
    fn expand_range(&mut self, range: &CellRange) -> Result<Vec<Value>, ErrorKind> {
        if !self.grid.contains(range.start) || !self.grid.contains(range.end) {
            return Err(ErrorKind::RefOutOfRange);
        }
        Ok(range.iter().map(|coord| self.resolve_cell(coord)).collect())
    }

    fn evaluate_binary(&mut self, left: &Expr, op: BinaryOp, right: &Expr) -> Value {
        let left_val = self.evaluate(left);
        let right_val = self.evaluate(right);

        // Propagate errors, left first
        if let Value::Error(e) = left_val {
            return Value::Error(e);
        }
        if let Value::Error(e) = right_val {
            return Value::Error(e);
        }

        let result = match op {
            BinaryOp::Add => add(&left_val, &right_val),
            BinaryOp::Sub => subtract(&left_val, &right_val),
            BinaryOp::Mul => numeric(&left_val, &right_val, |a, b| Ok(a * b)),
            BinaryOp::Div => numeric(&left_val, &right_val, |a, b| {
                if b == 0.0 {
                    Err(ErrorKind::DivideByZero)
                } else {
                    Ok(a / b)
                }
            }),
            BinaryOp::FloorDiv => numeric(&left_val, &right_val, math::floor_div),
            BinaryOp::Mod => numeric(&left_val, &right_val, math::modulo_of),
            BinaryOp::Pow => numeric(&left_val, &right_val, math::pow),

            BinaryOp::Eq => compare(&left_val, &right_val, Ordering::is_eq),
            BinaryOp::Ne => compare(&left_val, &right_val, Ordering::is_ne),
            BinaryOp::Lt => compare(&left_val, &right_val, Ordering::is_lt),
            BinaryOp::Gt => compare(&left_val, &right_val, Ordering::is_gt),
            BinaryOp::Le => compare(&left_val, &right_val, Ordering::is_le),
            BinaryOp::Ge => compare(&left_val, &right_val, Ordering::is_ge),

            BinaryOp::And => logical_op(&left_val, &right_val, |a, b| a && b),
            BinaryOp::Or => logical_op(&left_val, &right_val, |a, b| a || b),
        };

        result.unwrap_or_else(Value::Error)
    }

    fn evaluate_unary(&mut self, op: UnaryOp, operand: &Expr) -> Value {
        let value = self.evaluate(operand);
        let n = match value.to_number() {
            Ok(n) => n,
            Err(e) => return Value::Error(e),
        };

        match op {
            UnaryOp::Neg => Value::Number(-n),
            UnaryOp::Pos if matches!(value, Value::DateTime(_)) => value,
            UnaryOp::Pos => Value::Number(n),
        }
    }

    fn evaluate_call(&mut self, name: &str, args: &[Expr]) -> Value {
        let Some(func) = Function::from_name(name) else {
            return Value::Error(ErrorKind::UnknownFunction);
        };

        if !func.arity().accepts(args.len()) {
            return Value::Error(ErrorKind::ArityMismatch);
        }

        if func == Function::If {
            return self.evaluate_if(&args[0], &args[1], &args[2]);
        }

        let accepts_ranges = func.accepts_ranges();
        let values: Vec<Arg> = args
            .iter()
            .map(|arg| self.argument(arg, accepts_ranges))
            .collect();

        match functions::call(func, &values, self.now) {
            Value::Number(n) => math::finite(n),
            other => other,
        }
    }

    /// Only the selected branch is evaluated
    fn evaluate_if(&mut self, cond: &Expr, then: &Expr, otherwise: &Expr) -> Value {
        let cond = self.evaluate(cond);
        match logical::condition(&cond) {
            Ok(true) => self.evaluate(then),
            Ok(false) => self.evaluate(otherwise),
            Err(e) => Value::Error(e),
        }
    }

    fn argument(&mut self, expr: &Expr, accepts_ranges: bool) -> Arg {
        match expr {
            Expr::CellRef(coord) if accepts_ranges => {
                Arg::Reference(vec![self.resolve_cell(*coord)])
            }
            Expr::Range(range) if accepts_ranges => match self.expand_range(range) {
                Ok(values) => Arg::Reference(values),
                Err(e) => Arg::Value(Value::Error(e)),
            },
            _ => Arg::Value(self.evaluate(expr)),
        }
    }
}

/// Apply a numeric operator, rejecting text and non-finite results
fn numeric(
    left: &Value,
    right: &Value,
    f: impl FnOnce(f64, f64) -> Result<f64, ErrorKind>,
) -> Result<Value, ErrorKind> {
    let result = f(left.to_number()?, right.to_number()?)?;
    match math::finite(result) {
        Value::Error(e) => Err(e),
        value => Ok(value),
    }
}

fn as_datetime(value: Value) -> Value {
    match value {
        Value::Number(n) => Value::DateTime(n),
        other => other,
    }
}

/// `+`: text concatenation, date shifting or numeric addition
fn add(left: &Value, right: &Value) -> Result<Value, ErrorKind> {
    match (left, right) {
        (Value::Text(a), Value::Text(b)) => Ok(Value::Text(format!("{}{}", a, b))),
        // An empty cell reads as "" next to text
        (Value::Text(a), Value::Empty) | (Value::Empty, Value::Text(a)) => {
            Ok(Value::Text(a.clone()))
        }
        (Value::Text(_), _) | (_, Value::Text(_)) => Err(ErrorKind::TypeMismatch),
        (Value::DateTime(_), Value::DateTime(_)) => numeric(left, right, |a, b| Ok(a + b)),
        (Value::DateTime(_), _) | (_, Value::DateTime(_)) => {
            numeric(left, right, |a, b| Ok(a + b)).map(as_datetime)
        }
        _ => numeric(left, right, |a, b| Ok(a + b)),
    }
}

/// `-`: a date minus a number is a date; the difference of two dates is days
fn subtract(left: &Value, right: &Value) -> Result<Value, ErrorKind> {
    let diff = numeric(left, right, |a, b| Ok(a - b))?;
    match (left, right) {
        (Value::DateTime(_), Value::DateTime(_)) => Ok(diff),
        (Value::DateTime(_), _) => Ok(as_datetime(diff)),
        _ => Ok(diff),
    }
}

fn compare(
    left: &Value,
    right: &Value,
    test: fn(Ordering) -> bool,
) -> Result<Value, ErrorKind> {
    let ordering = match (left, right) {
        (Value::Text(a), Value::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Value::Text(a), Value::Empty) => a.as_str().cmp(""),
        (Value::Empty, Value::Text(b)) => "".cmp(b.as_str()),
        (Value::Text(_), _) | (_, Value::Text(_)) => return Err(ErrorKind::TypeMismatch),
        _ => {
            let (a, b) = (left.to_number()?, right.to_number()?);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
    };
    Ok(Value::Boolean(test(ordering)))
}

fn logical_op(
    left: &Value,
    right: &Value,
    f: fn(bool, bool) -> bool,
) -> Result<Value, ErrorKind> {
    Ok(Value::Boolean(f(left.to_boolean()?, right.to_boolean()?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sparkcalc_core::timestamp;

    fn grid_with(cells: &[(&str, &str)]) -> Grid {
        let mut grid = Grid::new(10, 5).unwrap();
        for (reference, raw) in cells {
            grid.set_a1(reference, *raw).unwrap();
        }
        grid
    }

    fn eval_in(grid: &Grid, formula: &str) -> Value {
        let expr = parser::parse(formula).unwrap();
        Evaluator::new(grid).evaluate(&expr)
    }

    fn eval(formula: &str) -> Value {
        eval_in(&Grid::default(), formula)
    }

    fn err(kind: ErrorKind) -> Value {
        Value::Error(kind)
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 + 2 * 3"), Value::Number(7.0));
        assert_eq!(eval("(1 + 2) * 3"), Value::Number(9.0));
        assert_eq!(eval("7 / 2"), Value::Number(3.5));
        assert_eq!(eval("2 ^ 8"), Value::Number(256.0));
        assert_eq!(eval("2 ** 8"), Value::Number(256.0));
        assert_eq!(eval("2 ^ 3 ^ 2"), Value::Number(512.0));
        assert_eq!(eval("-2 ^ 2"), Value::Number(4.0));
    }

    #[test]
    fn test_floor_division_and_modulo() {
        assert_eq!(eval("17 // 5"), Value::Number(3.0));
        assert_eq!(eval("17 % 5"), Value::Number(2.0));
        assert_eq!(eval("-7 // 2"), Value::Number(-4.0));
        assert_eq!(eval("-7 % 3"), Value::Number(2.0));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("1 / 0"), err(ErrorKind::DivideByZero));
        assert_eq!(eval("1 // 0"), err(ErrorKind::DivideByZero));
        assert_eq!(eval("1 % 0"), err(ErrorKind::DivideByZero));
    }

    #[test]
    fn test_overflow_is_num_error() {
        assert_eq!(eval("10 ^ 400"), err(ErrorKind::NumError));
        assert_eq!(eval("SUM(1e308, 1e308)"), err(ErrorKind::NumError));
    }

    #[test]
    fn test_text() {
        assert_eq!(eval("\"ab\" + \"cd\""), Value::Text("abcd".into()));
        assert_eq!(eval("\"ab\" + 1"), err(ErrorKind::TypeMismatch));
        assert_eq!(eval("-\"ab\""), err(ErrorKind::TypeMismatch));
    }

    #[test]
    fn test_text_with_empty_cell() {
        let grid = grid_with(&[("A1", "name")]);
        assert_eq!(eval_in(&grid, "\"a\" + B1"), Value::Text("a".into()));
        assert_eq!(eval_in(&grid, "B1 + A1"), Value::Text("name".into()));
        assert_eq!(eval_in(&grid, "\"a\" = B1"), Value::Boolean(false));
        assert_eq!(eval_in(&grid, "B1 + B2"), Value::Number(0.0));
    }

    #[test]
    fn test_zero_to_negative_power() {
        assert_eq!(eval("0 ^ -1"), err(ErrorKind::DivideByZero));
        assert_eq!(eval("0 ** 2"), Value::Number(0.0));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval("1 < 2"), Value::Boolean(true));
        assert_eq!(eval("2 == 2"), Value::Boolean(true));
        assert_eq!(eval("2 <> 2"), Value::Boolean(false));
        assert_eq!(eval("\"Apple\" = \"apple\""), Value::Boolean(true));
        assert_eq!(eval("\"a\" < \"B\""), Value::Boolean(true));
        assert_eq!(eval("\"a\" < 1"), err(ErrorKind::TypeMismatch));
        assert_eq!(eval("True = 1"), Value::Boolean(true));
    }

    #[test]
    fn test_logical_keywords() {
        assert_eq!(eval("1 < 2 and 3 < 4"), Value::Boolean(true));
        assert_eq!(eval("0 or False"), Value::Boolean(false));
        assert_eq!(eval("\"x\" and True"), err(ErrorKind::TypeMismatch));
    }

    #[test]
    fn test_cell_references() {
        let grid = grid_with(&[("A1", "10"), ("A2", "=A1 * 2"), ("A3", "=A2 + A1")]);
        assert_eq!(eval_in(&grid, "A3"), Value::Number(30.0));
        assert_eq!(eval_in(&grid, "B1 + 1"), Value::Number(1.0));
    }

    #[test]
    fn test_out_of_bounds_reference() {
        let grid = grid_with(&[]);
        assert_eq!(eval_in(&grid, "Z99"), err(ErrorKind::RefOutOfRange));
        assert_eq!(eval_in(&grid, "SUM(A1:A50)"), err(ErrorKind::RefOutOfRange));
    }

    #[test]
    fn test_ranges() {
        let grid = grid_with(&[("A1", "1"), ("A2", "2"), ("A3", "3"), ("B1", "label")]);
        assert_eq!(eval_in(&grid, "SUM(A1:A3)"), Value::Number(6.0));
        assert_eq!(eval_in(&grid, "SUM(A3:A1)"), Value::Number(6.0));
        assert_eq!(eval_in(&grid, "SUM(A1:B3)"), Value::Number(6.0));
        assert_eq!(eval_in(&grid, "COUNT(A1:B3)"), Value::Number(3.0));
        assert_eq!(eval_in(&grid, "A1:A3"), err(ErrorKind::InvalidRange));
        assert_eq!(eval_in(&grid, "ABS(A1:A3)"), err(ErrorKind::InvalidRange));
    }

    #[test]
    fn test_functions() {
        assert_eq!(eval("AVERAGE(1, 2, 3)"), Value::Number(2.0));
        assert_eq!(eval("MEDIAN(1, 2, 3, 4)"), Value::Number(2.5));
        assert_eq!(eval("round(2.5)"), Value::Number(3.0));
        assert_eq!(eval("MOD(-7, 3)"), Value::Number(2.0));
        assert_eq!(eval("PI()"), Value::Number(std::f64::consts::PI));
        assert_eq!(eval("NOT(1 > 2)"), Value::Boolean(true));
    }

    #[test]
    fn test_function_errors() {
        assert_eq!(eval("FOO(1)"), err(ErrorKind::UnknownFunction));
        assert_eq!(eval("ABS(1, 2)"), err(ErrorKind::ArityMismatch));
        assert_eq!(eval("SQRT(-4)"), err(ErrorKind::NumError));
    }

    #[test]
    fn test_if_is_lazy() {
        let grid = grid_with(&[("A1", "15")]);
        assert_eq!(
            eval_in(&grid, "IF(A1 > 10, \"High\", \"Low\")"),
            Value::Text("High".into())
        );
        assert_eq!(eval("IF(True, 1, 1 / 0)"), Value::Number(1.0));
        assert_eq!(eval("IF(False, 1 / 0, 2)"), Value::Number(2.0));
        assert_eq!(eval("IF(1 / 0, 1, 2)"), err(ErrorKind::DivideByZero));
    }

    #[test]
    fn test_error_contagion() {
        let grid = grid_with(&[("A1", "=1/0"), ("A2", "=A1 + 1"), ("A3", "=SUM(A1:A2)")]);
        assert_eq!(eval_in(&grid, "A2"), err(ErrorKind::DivideByZero));
        assert_eq!(eval_in(&grid, "A3"), err(ErrorKind::DivideByZero));
        // An error operand wins over a type mismatch on either side
        assert_eq!(eval_in(&grid, "\"x\" + A1"), err(ErrorKind::DivideByZero));
        assert_eq!(eval_in(&grid, "A1 + \"x\""), err(ErrorKind::DivideByZero));
        assert_eq!(eval_in(&grid, "MAX(1, A1, 1 / \"y\")"), err(ErrorKind::DivideByZero));
    }

    #[test]
    fn test_syntax_error_cell() {
        let grid = grid_with(&[("A1", "=1 +"), ("A2", "=A1 * 2")]);
        assert_eq!(eval_in(&grid, "A2"), err(ErrorKind::SyntaxError));
    }

    #[test]
    fn test_cycle_marks_every_member() {
        let grid = grid_with(&[("A1", "=B1"), ("B1", "=C1 + 1"), ("C1", "=IF(A1, 1, 2)")]);
        let mut evaluator = Evaluator::new(&grid);
        for reference in ["A1", "B1", "C1"] {
            let coord = CellCoord::from_a1(reference).unwrap();
            assert_eq!(evaluator.resolve_cell(coord), err(ErrorKind::CircularReference));
        }
    }

    #[test]
    fn test_self_reference() {
        let grid = grid_with(&[("A1", "=A1 + 1")]);
        assert_eq!(eval_in(&grid, "A1"), err(ErrorKind::CircularReference));
    }

    #[test]
    fn test_dates() {
        let grid = grid_with(&[("A1", "2024-03-15"), ("A2", "2024-03-01")]);
        let day = timestamp::parse_date("2024-03-15").unwrap();
        assert_eq!(eval_in(&grid, "A1 + 1"), Value::DateTime(day + 1.0));
        assert_eq!(eval_in(&grid, "A1 - A2"), Value::Number(14.0));
        assert_eq!(eval_in(&grid, "DATE(A1 + 1)"), Value::Text("2024-03-16".into()));
        assert_eq!(eval_in(&grid, "A1 > A2"), Value::Boolean(true));
    }

    #[test]
    fn test_clock_is_fixed_per_evaluator() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 6, 0, 0).unwrap();
        let grid = Grid::default();
        let mut evaluator = Evaluator::at(&grid, now);

        let expr = parser::parse("NOW() - TODAY()").unwrap();
        assert_eq!(evaluator.evaluate(&expr), Value::Number(0.25));

        let expr = parser::parse("TIME(NOW())").unwrap();
        assert_eq!(evaluator.evaluate(&expr), Value::Text("06:00:00".into()));
    }
}
