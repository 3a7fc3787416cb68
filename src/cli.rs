//! CLI argument parsing for Atribuir

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for attribution reports
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text tables (default)
    Text,
    /// JSON document for machine parsing
    Json,
    /// CSV tables for spreadsheet analysis
    Csv,
}

/// Path-length filter selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TouchSelection {
    /// All journeys (default)
    All,
    /// Journeys with exactly one touch
    Single,
    /// Journeys with more than one touch
    Multi,
}

#[derive(Parser, Debug)]
#[command(name = "atribuir")]
#[command(version)]
#[command(about = "Multi-touch attribution modeling with Markov removal effects", long_about = None)]
pub struct Cli {
    /// Journey dataset CSV (str_path, converters, nonconverters, ...)
    pub input: PathBuf,

    /// Channel code→label mapping CSV (code,label)
    #[arg(short = 'm', long = "mapping", value_name = "PATH")]
    pub mapping: PathBuf,

    /// Restrict modeling to a path-length bucket
    #[arg(long = "touch", value_enum, default_value = "all")]
    pub touch: TouchSelection,

    /// Output format (text, json or csv)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Include the diagnostic transition matrix
    #[arg(long = "matrix")]
    pub matrix: bool,

    /// Include the first→last touch Sankey edge list
    #[arg(long = "sankey")]
    pub sankey: bool,

    /// Include dataset and per-touch summary tables
    #[arg(short = 'c', long = "summary")]
    pub summary: bool,

    /// Enable verbose tracing to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
