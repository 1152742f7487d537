use std::env;

use sparkcalc_core::{DEFAULT_COLS, DEFAULT_ROWS};

/// Host configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Grid rows
    pub rows: u32,
    /// Grid columns
    pub cols: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let rows = env::var("SPARKCALC_ROWS")
            .unwrap_or_else(|_| DEFAULT_ROWS.to_string())
            .parse()?;
        let cols = env::var("SPARKCALC_COLS")
            .unwrap_or_else(|_| DEFAULT_COLS.to_string())
            .parse()?;

        Ok(Self { rows, cols })
    }

    /// Apply command-line overrides
    pub fn with_extent(mut self, rows: Option<u32>, cols: Option<u32>) -> Self {
        if let Some(rows) = rows {
            self.rows = rows;
        }
        if let Some(cols) = cols {
            self.cols = cols;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let config = Config::default().with_extent(Some(50), None);
        assert_eq!(config.rows, 50);
        assert_eq!(config.cols, DEFAULT_COLS);
    }
}
