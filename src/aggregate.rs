//! Load-indexed throughput reduction
//!
//! Collapses the section timeline into one row per distinct load value: the
//! duration-weighted average throughput observed while exactly that many
//! workers were active. Also derives the whole-window summary statistics
//! used by the report.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::sweep::Section;

/// One row of the throughput table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThroughputAtLoad {
    pub load: u32,
    /// Duration-weighted average of section throughput at this load
    pub throughput: f64,
}

/// Reduce sections to throughput rows, ascending by load.
///
/// Loads never observed are simply absent; the table is sparse, not
/// zero-filled. A group whose total duration is zero cannot arise from
/// [`crate::sweep::sweep_sections`] output, but is skipped rather than
/// divided through.
pub fn throughput_by_load(sections: &[Section]) -> Vec<ThroughputAtLoad> {
    let mut groups: BTreeMap<u32, (f64, f64)> = BTreeMap::new();
    for section in sections {
        let entry = groups.entry(section.load).or_insert((0.0, 0.0));
        entry.0 += section.count_rate * section.duration as f64;
        entry.1 += section.duration as f64;
    }
    groups
        .into_iter()
        .filter(|&(_, (_, weight))| weight > 0.0)
        .map(|(load, (weighted, weight))| ThroughputAtLoad {
            load,
            throughput: weighted / weight,
        })
        .collect()
}

/// Whole-window summary of the section timeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowStats {
    pub min_throughput: f64,
    pub max_throughput: f64,
    /// Time-weighted average throughput over the window
    pub avg_throughput: f64,
    pub min_load: u32,
    pub max_load: u32,
    /// Time-weighted average load over the window
    pub avg_load: f64,
}

/// Summarize the window, or `None` when there are no sections to summarize
pub fn window_stats(sections: &[Section]) -> Option<WindowStats> {
    let mut total_time = 0.0;
    let mut total_work = 0.0;
    let mut total_load = 0.0;
    let mut min_throughput = f64::INFINITY;
    let mut max_throughput = f64::NEG_INFINITY;
    let mut min_load = u32::MAX;
    let mut max_load = 0;

    for section in sections {
        min_throughput = min_throughput.min(section.count_rate);
        max_throughput = max_throughput.max(section.count_rate);
        min_load = min_load.min(section.load);
        max_load = max_load.max(section.load);

        let duration = section.duration as f64;
        total_time += duration;
        total_work += section.count_rate * duration;
        total_load += f64::from(section.load) * duration;
    }

    if total_time <= 0.0 {
        return None;
    }
    Some(WindowStats {
        min_throughput,
        max_throughput,
        avg_throughput: total_work / total_time,
        min_load,
        max_load,
        avg_load: total_load / total_time,
    })
}
