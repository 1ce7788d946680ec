//! End-of-window summary report
//!
//! Runs the full batch pipeline (sweep, aggregate, fit, peak) over a
//! stable span snapshot and captures the result for rendering. The text
//! layout is informational only; the JSON form is the machine surface.

use std::fmt::Write as _;

use serde::Serialize;

use crate::aggregate::{throughput_by_load, window_stats, ThroughputAtLoad, WindowStats};
use crate::fit::{fit, FitConfig, FitOutcome};
use crate::model::{analyze_peak, PeakResult};
use crate::span_store::SpanStore;
use crate::sweep::sweep_sections;

/// Everything the window produced: summary statistics, the throughput
/// table, the fitted model, and the derived peak
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// `None` when the window contained no sections to summarize
    pub window: Option<WindowStats>,
    pub table: Vec<ThroughputAtLoad>,
    pub fit: FitOutcome,
    pub peak: PeakResult,
}

impl Report {
    /// Run the pipeline over the collected spans.
    ///
    /// Each stage recomputes from its predecessor's full output; nothing is
    /// incremental, and the only stochastic element is the fitter's seeded
    /// fallback.
    pub fn build(store: &SpanStore, config: &FitConfig) -> Self {
        let sections = sweep_sections(store);
        let window = window_stats(&sections);
        let table = throughput_by_load(&sections);
        let fit = fit(&table, config);
        let peak = analyze_peak(&fit.params);
        Report {
            window,
            table,
            fit,
            peak,
        }
    }

    /// Render the human-readable summary
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        match &self.window {
            Some(window) => {
                let _ = writeln!(
                    out,
                    "throughput in [{:.6} .. {:.6}], average: {:.6}",
                    window.min_throughput, window.max_throughput, window.avg_throughput
                );
                let _ = writeln!(
                    out,
                    "load in [{} .. {}], average: {:.6}",
                    window.min_load, window.max_load, window.avg_load
                );
            }
            None => {
                let _ = writeln!(out, "no observations in window");
            }
        }
        let _ = writeln!(out, "gamma: {:.6}", self.fit.params.gamma);
        let _ = writeln!(out, "alpha: {:.6}", self.fit.params.alpha);
        let _ = writeln!(out, "beta: {:.6}", self.fit.params.beta);
        let _ = writeln!(
            out,
            "err: {:.6}, errInit: {:.6}",
            self.fit.final_error, self.fit.initial_error
        );
        match self.peak {
            PeakResult::Peak {
                n_peak,
                throughput,
                efficiency,
            } => {
                let _ = writeln!(
                    out,
                    "peak load: {:.6}, peak throughput: {:.6}, peak efficiency: {:.6}",
                    n_peak, throughput, efficiency
                );
            }
            PeakResult::Unbounded => {
                let _ = writeln!(out, "no finite peak: beta is zero, scaling is unbounded");
            }
        }
        let _ = writeln!(out, "load, throughput");
        for row in &self.table {
            let _ = writeln!(out, "{}, {:.6}", row.load, row.throughput);
        }
        out
    }

    /// Render the report as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
