//! Raw span collection for one observation window
//!
//! A span is the raw measured fact: `count` units of work completed between
//! `start` and `stop` while `load` workers were concurrently active. Spans
//! may arrive in any order and may overlap; the sweep in [`crate::sweep`]
//! untangles them. The stop instant is excluded from the range, so a span
//! must have `stop > start` to prevent a zero interval.
//!
//! The store makes no concurrency guarantee. Concurrent producers must
//! serialize mutating calls themselves (see [`crate::workload`] for the
//! mutex-guarded pattern); the derived computations are pure functions over
//! a stable snapshot.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Timestamps and durations in integer nanoseconds.
pub type Nanos = i64;

/// Errors surfaced by span ingestion
///
/// Every variant is local and recoverable: the store is left unchanged and
/// the caller decides whether to drop, log, or propagate.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum SpanError {
    /// The half-open interval `[start, stop)` would be empty or inverted
    #[error("degenerate span: stop {stop} must be greater than start {start}")]
    DegenerateSpan { start: Nanos, stop: Nanos },

    /// Completed work was reported with zero concurrency
    #[error("span reports {count} completed units at zero load")]
    WorkWithoutLoad { count: f64 },

    /// Work counts must be finite and non-negative
    #[error("invalid work count: {count}")]
    InvalidCount { count: f64 },
}

/// Distinguishes measured spans from the window-bracketing anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SpanKind {
    /// A real measurement submitted through [`SpanStore::add`]
    #[default]
    Measured,
    /// The zero-load, zero-count span inserted by
    /// [`SpanStore::end_observation`]. It exists only so the window's first
    /// and last instants appear as waypoints; it never contributes work or
    /// load.
    Anchor,
}

/// One observed fact, immutable once stored
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: Nanos,
    pub stop: Nanos,
    pub count: f64,
    pub load: u32,
    pub kind: SpanKind,
}

impl Span {
    /// Average rate at which `count` accumulated over the span's lifetime.
    ///
    /// The span contributes this constant rate for its entire active
    /// interval; the sweep sums these per-span averages, not instantaneous
    /// rates.
    pub fn count_rate(&self) -> f64 {
        self.count / (self.stop - self.start) as f64
    }
}

/// Accumulates spans for one observation window
///
/// # Example
///
/// ```
/// use escala::span_store::SpanStore;
///
/// let mut store = SpanStore::new();
/// store.begin_observation(0);
/// store.add(0, 5, 22.0, 1).unwrap();
/// store.add(5, 9, 23.0, 1).unwrap();
/// store.end_observation(10).unwrap();
/// assert_eq!(store.len(), 3); // two measured spans plus the anchor
/// ```
#[derive(Debug, Clone, Default)]
pub struct SpanStore {
    spans: Vec<Span>,
    observe_start: Nanos,
}

impl SpanStore {
    /// Create an empty store with the observation origin at 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one measured span.
    ///
    /// Rejects without mutation when `stop <= start`, when `count` is not a
    /// finite non-negative number, or when work is reported at zero load.
    pub fn add(&mut self, start: Nanos, stop: Nanos, count: f64, load: u32) -> Result<(), SpanError> {
        let err = if stop <= start {
            Some(SpanError::DegenerateSpan { start, stop })
        } else if !count.is_finite() || count < 0.0 {
            Some(SpanError::InvalidCount { count })
        } else if load == 0 && count != 0.0 {
            Some(SpanError::WorkWithoutLoad { count })
        } else {
            None
        };
        if let Some(err) = err {
            warn!(%err, "rejected span");
            return Err(err);
        }
        self.spans.push(Span {
            start,
            stop,
            count,
            load,
            kind: SpanKind::Measured,
        });
        Ok(())
    }

    /// Mark the first instant of the observation window
    pub fn begin_observation(&mut self, at: Nanos) {
        self.observe_start = at;
    }

    /// Mark the last instant of the observation window.
    ///
    /// Inserts the anchor span `[observe_start, at)` so the window's
    /// boundary instants exist as waypoints even when no measured span
    /// starts or stops exactly there. Rejected like any degenerate span
    /// when `at` does not lie after the recorded start.
    pub fn end_observation(&mut self, at: Nanos) -> Result<(), SpanError> {
        if at <= self.observe_start {
            let err = SpanError::DegenerateSpan {
                start: self.observe_start,
                stop: at,
            };
            warn!(%err, "rejected observation window");
            return Err(err);
        }
        self.spans.push(Span {
            start: self.observe_start,
            stop: at,
            count: 0.0,
            load: 0,
            kind: SpanKind::Anchor,
        });
        Ok(())
    }

    /// The collected spans, anchors included, in insertion order
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Number of stored spans, anchors included
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// True when nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}
