//! Interval sweep over the span set
//!
//! Every span occurs twice on the timeline: once at its start with a
//! positive contribution and once at its stop with a negative one. Sorting
//! those waypoints and sweeping left to right yields a piecewise-constant
//! timeline of aggregate load and aggregate throughput rate: the
//! [`Section`] sequence consumed by [`crate::aggregate`].

use serde::Serialize;

use crate::span_store::{Nanos, SpanStore};

/// Waypoint classification, ordered so that `Stop` sorts before `Start` at
/// equal timestamps.
///
/// A span's half-open interval excludes its stop instant, so the decrement
/// must be processed first: otherwise one span ending exactly as another
/// begins would show a one-instant load spike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventKind {
    Stop,
    Start,
}

/// A timestamped start or stop event derived from one span
#[derive(Debug, Clone, Copy)]
struct Waypoint {
    at: Nanos,
    kind: EventKind,
    load: u32,
    count_rate: f64,
}

/// A maximal half-open interval `[start, start + duration)` of constant
/// aggregate load and throughput rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Section {
    pub start: Nanos,
    pub duration: Nanos,
    pub load: u32,
    pub count_rate: f64,
}

/// Reduce the span set to its piecewise-constant timeline.
///
/// Sections come out sorted by `start`, cover the window gaplessly, and
/// contain no zero-duration entries; the degenerate final section at the
/// last waypoint is dropped. An empty store yields an empty sequence.
///
/// This is a pure function of the store snapshot: recomputation over the
/// same spans is bit-identical.
pub fn sweep_sections(store: &SpanStore) -> Vec<Section> {
    let mut waypoints = Vec::with_capacity(store.len() * 2);
    for span in store.spans() {
        let count_rate = span.count_rate();
        waypoints.push(Waypoint {
            at: span.start,
            kind: EventKind::Start,
            load: span.load,
            count_rate,
        });
        waypoints.push(Waypoint {
            at: span.stop,
            kind: EventKind::Stop,
            load: span.load,
            count_rate,
        });
    }
    // Composite key: timestamp first, then stop-before-start at ties. The
    // sort is stable, so equal keys keep submission order and the sweep
    // stays deterministic.
    waypoints.sort_by_key(|wp| (wp.at, wp.kind));

    let mut sections = Vec::new();
    let mut load: u32 = 0;
    let mut count_rate: f64 = 0.0;
    for (i, wp) in waypoints.iter().enumerate() {
        match wp.kind {
            EventKind::Start => {
                load += wp.load;
                count_rate += wp.count_rate;
            }
            EventKind::Stop => {
                load -= wp.load;
                count_rate -= wp.count_rate;
            }
        }
        match waypoints.get(i + 1) {
            // Same-instant waypoints collapse: only the last state at a
            // timestamp materializes a section.
            Some(next) if next.at == wp.at => {}
            Some(next) => sections.push(Section {
                start: wp.at,
                duration: next.at - wp.at,
                load,
                count_rate,
            }),
            // The last waypoint would open a zero-duration section.
            None => {}
        }
    }
    sections
}
