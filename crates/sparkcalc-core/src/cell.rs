use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::timestamp;

/// A computed cell value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    /// Days since the Unix epoch (UTC)
    DateTime(f64),
    Error(ErrorKind),
}

impl Value {
    /// Coerce a non-formula cell's raw text.
    ///
    /// Order: blank, TRUE/FALSE, finite number, percentage, `YYYY-MM-DD`, text.
    pub fn from_literal(raw: &str) -> Value {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Value::Empty;
        }

        if trimmed.eq_ignore_ascii_case("true") {
            return Value::Boolean(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Value::Boolean(false);
        }

        if let Some(n) = parse_finite(trimmed) {
            return Value::Number(n);
        }

        if let Some(n) = trimmed.strip_suffix('%').and_then(parse_finite) {
            return Value::Number(n / 100.0);
        }

        if let Some(days) = timestamp::parse_date(trimmed) {
            return Value::DateTime(days);
        }

        Value::Text(trimmed.to_string())
    }

    pub fn error(&self) -> Option<ErrorKind> {
        match self {
            Value::Error(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Numeric coercion. Text never coerces; errors surface as `Err`.
    pub fn to_number(&self) -> Result<f64, ErrorKind> {
        match self {
            Value::Empty => Ok(0.0),
            Value::Number(n) | Value::DateTime(n) => Ok(*n),
            Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Text(_) => Err(ErrorKind::TypeMismatch),
            Value::Error(e) => Err(*e),
        }
    }

    /// Logical coercion used by IF, NOT, AND, OR and the `and`/`or` keywords
    pub fn to_boolean(&self) -> Result<bool, ErrorKind> {
        match self {
            Value::Empty => Ok(false),
            Value::Boolean(b) => Ok(*b),
            Value::Number(n) | Value::DateTime(n) => Ok(*n != 0.0),
            Value::Text(_) => Err(ErrorKind::TypeMismatch),
            Value::Error(e) => Err(*e),
        }
    }

    /// Display text for the host grid
    pub fn as_text(&self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Value::DateTime(days) => {
                let formatted = if days.fract() == 0.0 {
                    timestamp::format_date(*days)
                } else {
                    timestamp::to_datetime(*days)
                        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                };
                formatted.unwrap_or_else(|| format_number(*days))
            }
            Value::Error(e) => e.to_string(),
        }
    }
}

fn parse_finite(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// A grid cell: what the user typed plus the last computed value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    raw: String,
    #[serde(default)]
    computed: Value,
}

impl Cell {
    /// Create a cell from user input. Literal cells are coerced immediately;
    /// formula cells stay `Empty` until the next recalculation.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let computed = if is_formula_text(&raw) {
            Value::Empty
        } else {
            Value::from_literal(&raw)
        };
        Cell { raw, computed }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn computed(&self) -> &Value {
        &self.computed
    }

    pub fn is_formula(&self) -> bool {
        is_formula_text(&self.raw)
    }

    /// Formula body without the leading `=`
    pub fn formula(&self) -> Option<&str> {
        self.raw.strip_prefix('=')
    }

    pub fn is_blank(&self) -> bool {
        self.raw.trim().is_empty()
    }

    /// Replace the cached value. Only the recalculation engine writes here.
    pub fn set_computed(&mut self, value: Value) {
        self.computed = value;
    }

    /// Display text: the computed value
    pub fn display(&self) -> String {
        self.computed.as_text()
    }
}

/// Formula detection: raw text begins with `=`
pub fn is_formula_text(raw: &str) -> bool {
    raw.starts_with('=')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_coercion() {
        assert_eq!(Value::from_literal(""), Value::Empty);
        assert_eq!(Value::from_literal("   "), Value::Empty);
        assert_eq!(Value::from_literal("42"), Value::Number(42.0));
        assert_eq!(Value::from_literal(" -3.5 "), Value::Number(-3.5));
        assert_eq!(Value::from_literal("True"), Value::Boolean(true));
        assert_eq!(Value::from_literal("FALSE"), Value::Boolean(false));
        assert_eq!(Value::from_literal("50%"), Value::Number(0.5));
        assert_eq!(Value::from_literal("1970-01-03"), Value::DateTime(2.0));
        assert_eq!(Value::from_literal("hello"), Value::Text("hello".to_string()));
    }

    #[test]
    fn test_non_finite_literals_stay_text() {
        assert_eq!(Value::from_literal("inf"), Value::Text("inf".to_string()));
        assert_eq!(Value::from_literal("NaN"), Value::Text("NaN".to_string()));
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Value::Empty.to_number(), Ok(0.0));
        assert_eq!(Value::Boolean(true).to_number(), Ok(1.0));
        assert_eq!(Value::DateTime(3.5).to_number(), Ok(3.5));
        assert_eq!(Value::Text("10".into()).to_number(), Err(ErrorKind::TypeMismatch));
        assert_eq!(
            Value::Error(ErrorKind::DivideByZero).to_number(),
            Err(ErrorKind::DivideByZero)
        );
    }

    #[test]
    fn test_as_text() {
        assert_eq!(Value::Number(42.0).as_text(), "42");
        assert_eq!(Value::Number(2.5).as_text(), "2.5");
        assert_eq!(Value::Boolean(false).as_text(), "FALSE");
        assert_eq!(Value::DateTime(0.0).as_text(), "1970-01-01");
        assert_eq!(Value::DateTime(0.5).as_text(), "1970-01-01 12:00:00");
        assert_eq!(Value::Error(ErrorKind::DivideByZero).as_text(), "#DIV/0!");
    }

    #[test]
    fn test_cell_formula_detection() {
        let cell = Cell::new("=A1+1");
        assert!(cell.is_formula());
        assert_eq!(cell.formula(), Some("A1+1"));
        assert_eq!(cell.computed(), &Value::Empty);

        let cell = Cell::new("12");
        assert!(!cell.is_formula());
        assert_eq!(cell.computed(), &Value::Number(12.0));
        assert_eq!(cell.display(), "12");
    }
}
