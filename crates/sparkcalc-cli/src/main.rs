//! SparkCalc CLI - recalculate stored sheets and preview formulas

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sparkcalc_cli::{load_sheet, render_json, render_table, Config};
use sparkcalc_core::Grid;
use sparkcalc_formula::{parse_and_evaluate, recalculate, FormulaError};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sparkcalc")]
#[command(author, version, about = "Spreadsheet formula engine")]
struct Cli {
    /// Grid rows (overrides SPARKCALC_ROWS)
    #[arg(long, global = true)]
    rows: Option<u32>,

    /// Grid columns (overrides SPARKCALC_COLS)
    #[arg(long, global = true)]
    cols: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a sheet, recalculate it and print the computed grid
    Recalc {
        /// Sheet JSON file
        input: PathBuf,

        /// Print cells as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Evaluate one formula or literal, as the formula bar preview does
    Eval {
        /// Formula text, e.g. "=SUM(A1:A3)"
        formula: String,

        /// Sheet to resolve references against
        #[arg(short, long)]
        sheet: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()
        .context("Invalid SPARKCALC_* environment")?
        .with_extent(cli.rows, cli.cols);

    match cli.command {
        Commands::Recalc { input, json } => recalc(&input, json, &config),
        Commands::Eval { formula, sheet } => eval(&formula, sheet.as_deref(), &config),
    }
}

fn recalc(input: &std::path::Path, json: bool, config: &Config) -> Result<()> {
    let mut grid = load_sheet(input, config.rows, config.cols)
        .with_context(|| format!("Failed to load '{}'", input.display()))?;

    let summary = recalculate(&mut grid);
    tracing::info!(
        "Recalculated {} formulas ({} errors)",
        summary.formulas,
        summary.errors
    );

    if json {
        println!("{}", render_json(&grid)?);
    } else {
        print!("{}", render_table(&grid));
    }
    Ok(())
}

fn eval(formula: &str, sheet: Option<&std::path::Path>, config: &Config) -> Result<()> {
    let mut grid = match sheet {
        Some(path) => load_sheet(path, config.rows, config.cols)
            .with_context(|| format!("Failed to load '{}'", path.display()))?,
        None => Grid::new(config.rows, config.cols)?,
    };
    recalculate(&mut grid);

    match parse_and_evaluate(formula, &grid) {
        Ok(value) => println!("{}", value.as_text()),
        Err(err @ FormulaError::Syntax(_)) => println!("{} ({})", err.kind(), err),
        Err(err) => println!("{}", err.kind()),
    }
    Ok(())
}
