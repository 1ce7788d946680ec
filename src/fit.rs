//! Gradient-descent USL fitting with a randomized fallback
//!
//! The objective is non-convex and the feasible region narrow, so pure
//! gradient descent can stall at a boundary or on a shallow ridge. Each
//! iteration first tries the analytic gradient step; if that step does not
//! strictly reduce the error while staying feasible, one small randomized
//! move is tried under the same test, and failing that the iteration leaves
//! the parameters unchanged. Infeasible candidates are rejected outright
//! rather than projected, so every accepted parameter set is feasible.
//!
//! The random source is an explicitly seeded [`StdRng`]: a fixed seed
//! reproduces a fixed optimization trajectory.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

use crate::aggregate::ThroughputAtLoad;
use crate::model::UslParameters;

/// Default iteration budget. Large by design; the loop runs to exhaustion
/// with no convergence check.
pub const DEFAULT_ITERATIONS: u64 = 1_000_000;

/// Default base step size for gradient and randomized moves
pub const DEFAULT_STEP: f64 = 0.001;

/// Starting gamma when the table has no positive load-1 observation
const FALLBACK_GAMMA: f64 = 1.0;

/// Iterations between polls of the cancel flag
const CANCEL_CHECK_STRIDE: u64 = 1024;

/// Fitter configuration.
///
/// Both the random seed and the iteration budget are overridable so tests
/// can pin exact trajectories and bound runtime.
#[derive(Debug, Clone, Default)]
pub struct FitConfig {
    /// Iteration budget; 0 falls back to [`DEFAULT_ITERATIONS`]
    pub iterations: u64,
    /// Base step size; non-positive falls back to [`DEFAULT_STEP`]
    pub step: f64,
    /// Seed for the randomized fallback
    pub seed: u64,
    /// Cooperative cancellation: set to `true` to stop the loop at the next
    /// stride boundary, bounding wall-clock cost
    pub cancel: Option<Arc<AtomicBool>>,
}

impl FitConfig {
    fn iterations(&self) -> u64 {
        if self.iterations == 0 {
            DEFAULT_ITERATIONS
        } else {
            self.iterations
        }
    }

    fn step(&self) -> f64 {
        if self.step > 0.0 {
            self.step
        } else {
            DEFAULT_STEP
        }
    }
}

/// Result of a fit. The fitter never fails: with no accepted step it
/// returns the initial parameters unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitOutcome {
    pub params: UslParameters,
    pub initial_error: f64,
    pub final_error: f64,
    /// Iterations actually executed (less than the budget only when
    /// cancelled)
    pub iterations_run: u64,
}

/// Mean squared error of the model against the observed table.
///
/// Unweighted per load bucket; rows below load 1 are skipped, and loads
/// with no observation simply contribute nothing. An empty table reads as
/// zero error.
pub fn fit_error(params: &UslParameters, table: &[ThroughputAtLoad]) -> f64 {
    let mut err = 0.0;
    let mut rows = 0u32;
    for row in table.iter().filter(|row| row.load >= 1) {
        let dist = params.throughput_at(f64::from(row.load)) - row.throughput;
        err += dist * dist;
        rows += 1;
    }
    if rows == 0 {
        0.0
    } else {
        err / f64::from(rows)
    }
}

/// Direction that reduces [`fit_error`]: the negated gradient, evaluated at
/// the current parameters
fn descent_direction(params: &UslParameters, table: &[ThroughputAtLoad]) -> (f64, f64, f64) {
    let mut da = 0.0;
    let mut db = 0.0;
    let mut dg = 0.0;
    let mut rows = 0u32;
    for row in table.iter().filter(|row| row.load >= 1) {
        let n = f64::from(row.load);
        let dist = params.throughput_at(n) - row.throughput;
        da += dist * params.d_alpha(n);
        db += dist * params.d_beta(n);
        dg += dist * params.d_gamma(n);
        rows += 1;
    }
    if rows == 0 {
        return (0.0, 0.0, 0.0);
    }
    let rows = f64::from(rows);
    (-da / rows, -db / rows, -dg / rows)
}

fn initial_parameters(table: &[ThroughputAtLoad]) -> UslParameters {
    let gamma = table
        .iter()
        .find(|row| row.load == 1)
        .map(|row| row.throughput)
        .filter(|&throughput| throughput > 0.0)
        .unwrap_or(FALLBACK_GAMMA);
    UslParameters {
        alpha: 0.01,
        beta: 0.001,
        gamma,
    }
}

/// Accept the candidate only when it is feasible and strictly improves
fn try_accept(
    params: &mut UslParameters,
    best_error: &mut f64,
    (da, db, dg): (f64, f64, f64),
    table: &[ThroughputAtLoad],
) -> bool {
    let candidate = params.offset(da, db, dg);
    if !candidate.is_feasible() {
        return false;
    }
    let err = fit_error(&candidate, table);
    if err < *best_error {
        *params = candidate;
        *best_error = err;
        true
    } else {
        false
    }
}

/// Draw from the discrete symmetric set `{-5, …, 5}`
fn random_unit(rng: &mut StdRng) -> f64 {
    f64::from(rng.gen_range(-5i32..=5))
}

/// Fit the table to the scalability model within a fixed iteration budget.
pub fn fit(table: &[ThroughputAtLoad], config: &FitConfig) -> FitOutcome {
    let mut params = initial_parameters(table);
    let initial_error = fit_error(&params, table);

    if !table.iter().any(|row| row.load >= 1) {
        return FitOutcome {
            params,
            initial_error,
            final_error: initial_error,
            iterations_run: 0,
        };
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let step = config.step();
    let mut best_error = initial_error;
    let mut iterations_run = 0;

    for i in 0..config.iterations() {
        if i % CANCEL_CHECK_STRIDE == 0 {
            if let Some(cancel) = &config.cancel {
                if cancel.load(Ordering::Relaxed) {
                    debug!(iterations_run, "fit cancelled");
                    break;
                }
            }
        }
        iterations_run = i + 1;

        let (ga, gb, gg) = descent_direction(&params, table);
        let gradient_delta = (ga * step * step, gb * step * step, gg * step * step);
        if !try_accept(&mut params, &mut best_error, gradient_delta, table) {
            // Randomized local move; gamma probes on a coarser scale than
            // the shape coefficients.
            let random_delta = (
                random_unit(&mut rng) * step * step,
                random_unit(&mut rng) * step * step,
                random_unit(&mut rng) * step,
            );
            try_accept(&mut params, &mut best_error, random_delta, table);
        }
    }

    debug!(
        alpha = params.alpha,
        beta = params.beta,
        gamma = params.gamma,
        final_error = best_error,
        "fit complete"
    );
    FitOutcome {
        params,
        initial_error,
        final_error: best_error,
        iterations_run,
    }
}
