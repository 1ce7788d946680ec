//! CLI argument parsing for Escala

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Output format for the window report
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text summary (default)
    Text,
    /// JSON report for machine parsing
    Json,
    /// CSV throughput table only
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "escala")]
#[command(version)]
#[command(about = "Universal Scalability Law modeling from concurrency span measurements", long_about = None)]
pub struct Cli {
    /// CSV file of spans to analyze; header row then start,stop,count,load
    #[arg(value_name = "SPANS")]
    pub input: Option<PathBuf>,

    /// Run the built-in synthetic contention workload instead of reading spans
    #[arg(long = "selftest", conflicts_with = "input")]
    pub selftest: bool,

    /// Worker threads for the synthetic workload
    #[arg(long = "workers", value_name = "N", default_value = "64")]
    pub workers: usize,

    /// Iteration budget for the model fit
    #[arg(long = "iterations", value_name = "N", default_value = "1000000")]
    pub iterations: u64,

    /// Seed for the fitter's randomized fallback
    #[arg(long = "seed", value_name = "SEED", default_value = "0")]
    pub seed: u64,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Predict model throughput at the given concurrency levels
    #[arg(long = "predict", value_name = "N", num_args = 1..)]
    pub predict: Vec<u32>,

    /// Enable debug logging to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
