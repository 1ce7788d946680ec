//! The Universal Scalability Law model
//!
//! `X(n) = n·γ / (1 + α·(n − 1) + β·n·(n − 1))` relates concurrency `n` to
//! total throughput. `α` is the contention coefficient (queueing on shared
//! resources), `β` the coherency coefficient (cross-talk between workers),
//! and `γ` the ideal single-worker throughput. At `α = β = 0` the model
//! reduces to perfectly linear scaling `X = nγ`; with `β > 0` throughput
//! eventually peaks and then degrades as workers are added.
//!
//! # References
//!
//! Gunther, N. J. (2007). Guerrilla Capacity Planning. Springer.

use serde::{Deserialize, Serialize};

/// Fitted model parameters.
///
/// The fitter maintains the feasible region `0 ≤ α ≤ 1`, `β ≥ 0`, `γ ≥ 0`
/// at every accepted update; see [`UslParameters::is_feasible`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UslParameters {
    /// Contention coefficient
    pub alpha: f64,
    /// Coherency (cross-talk) coefficient
    pub beta: f64,
    /// Ideal single-worker throughput
    pub gamma: f64,
}

impl UslParameters {
    fn denominator(&self, n: f64) -> f64 {
        1.0 + self.alpha * (n - 1.0) + self.beta * n * (n - 1.0)
    }

    /// Model throughput at concurrency `n`
    pub fn throughput_at(&self, n: f64) -> f64 {
        n * self.gamma / self.denominator(n)
    }

    /// `∂X/∂α = −nγ(n−1) / D²`
    pub(crate) fn d_alpha(&self, n: f64) -> f64 {
        let d = self.denominator(n);
        -(n * self.gamma) * (n - 1.0) / (d * d)
    }

    /// `∂X/∂β = −nγ·n(n−1) / D²`
    pub(crate) fn d_beta(&self, n: f64) -> f64 {
        let d = self.denominator(n);
        -(n * self.gamma) * n * (n - 1.0) / (d * d)
    }

    /// `∂X/∂γ = n / D`
    pub(crate) fn d_gamma(&self, n: f64) -> f64 {
        n / self.denominator(n)
    }

    /// The candidate reached by shifting each parameter
    pub(crate) fn offset(&self, d_alpha: f64, d_beta: f64, d_gamma: f64) -> Self {
        UslParameters {
            alpha: self.alpha + d_alpha,
            beta: self.beta + d_beta,
            gamma: self.gamma + d_gamma,
        }
    }

    /// Whether the parameters lie inside the feasible region
    pub fn is_feasible(&self) -> bool {
        (0.0..=1.0).contains(&self.alpha) && self.beta >= 0.0 && self.gamma >= 0.0
    }
}

/// Peak operating point derived from fitted parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeakResult {
    /// With `β > 0` throughput peaks at a finite concurrency
    Peak {
        /// Concurrency at which `∂X/∂n = 0`
        n_peak: f64,
        /// Model throughput at the peak
        throughput: f64,
        /// Fraction of ideal linear throughput retained at the peak
        efficiency: f64,
    },
    /// With `β = 0` the model is monotonically non-decreasing: there is no
    /// finite peak to report
    Unbounded,
}

/// Locate the concurrency of maximum throughput.
///
/// `n_peak = sqrt((1 − α)/β)`, evaluated on the continuous model. A zero
/// `β` is reported as [`PeakResult::Unbounded`], never computed through.
pub fn analyze_peak(params: &UslParameters) -> PeakResult {
    if params.beta <= 0.0 {
        return PeakResult::Unbounded;
    }
    let n_peak = ((1.0 - params.alpha) / params.beta).sqrt();
    let throughput = params.throughput_at(n_peak);
    let ideal = n_peak * params.gamma;
    let efficiency = if ideal > 0.0 { throughput / ideal } else { 0.0 };
    PeakResult::Peak {
        n_peak,
        throughput,
        efficiency,
    }
}
