//! End-to-end pipeline tests: spans through sweep, aggregation, fit, and
//! peak analysis.

use escala::aggregate::throughput_by_load;
use escala::fit::{fit, fit_error, FitConfig};
use escala::model::{analyze_peak, PeakResult, UslParameters};
use escala::report::Report;
use escala::span_store::SpanStore;
use escala::sweep::sweep_sections;

#[test]
fn disjoint_spans_collapse_to_one_row() {
    let mut store = SpanStore::new();
    store.add(0, 5, 10.0, 1).unwrap();
    store.add(5, 9, 8.0, 1).unwrap();

    let table = throughput_by_load(&sweep_sections(&store));
    assert_eq!(table.len(), 1);
    assert_eq!(table[0].load, 1);
    // Both spans run at rate 2; the weighted average stays 2.
    assert_eq!(table[0].throughput, 2.0);
}

#[test]
fn overlapping_spans_split_by_load() {
    let mut store = SpanStore::new();
    store.add(0, 10, 10.0, 1).unwrap();
    store.add(3, 7, 8.0, 1).unwrap();

    let sections = sweep_sections(&store);
    let durations: Vec<i64> = sections.iter().map(|s| s.duration).collect();
    let loads: Vec<u32> = sections.iter().map(|s| s.load).collect();
    let rates: Vec<f64> = sections.iter().map(|s| s.count_rate).collect();
    assert_eq!(durations, vec![3, 4, 3]);
    assert_eq!(loads, vec![1, 2, 1]);
    assert_eq!(rates, vec![1.0, 3.0, 1.0]);

    let table = throughput_by_load(&sections);
    assert_eq!(table.len(), 2);
    assert_eq!((table[0].load, table[0].throughput), (1, 1.0));
    assert_eq!((table[1].load, table[1].throughput), (2, 3.0));
}

#[test]
fn degenerate_spans_change_nothing() {
    let mut store = SpanStore::new();
    store.begin_observation(0);
    store.add(0, 5, 10.0, 1).unwrap();
    store.end_observation(6).unwrap();
    let baseline_sections = sweep_sections(&store);
    let baseline_table = throughput_by_load(&baseline_sections);

    assert!(store.add(5, 5, 1.0, 1).is_err());
    assert!(store.add(7, 3, 1.0, 1).is_err());

    assert_eq!(sweep_sections(&store), baseline_sections);
    assert_eq!(throughput_by_load(&sweep_sections(&store)), baseline_table);
}

#[test]
fn section_durations_cover_the_window() {
    let mut store = SpanStore::new();
    store.begin_observation(100);
    store.add(120, 180, 40.0, 2).unwrap();
    store.add(150, 300, 75.0, 1).unwrap();
    store.add(150, 160, 5.0, 3).unwrap();
    store.end_observation(350).unwrap();

    let total: i64 = sweep_sections(&store).iter().map(|s| s.duration).sum();
    assert_eq!(total, 350 - 100);
}

#[test]
fn sweep_and_aggregation_are_bit_identical_across_runs() {
    let mut store = SpanStore::new();
    store.begin_observation(0);
    store.add(0, 7, 13.0, 1).unwrap();
    store.add(2, 5, 3.0, 2).unwrap();
    store.add(4, 11, 21.0, 1).unwrap();
    store.end_observation(12).unwrap();

    let first = sweep_sections(&store);
    let second = sweep_sections(&store);
    assert_eq!(first, second);
    assert_eq!(throughput_by_load(&first), throughput_by_load(&second));
}

#[test]
fn fit_recovers_known_parameters() {
    let truth = UslParameters {
        alpha: 0.2,
        beta: 0.001,
        gamma: 1.0,
    };
    let table: Vec<_> = (1..=50)
        .map(|load| escala::aggregate::ThroughputAtLoad {
            load,
            throughput: truth.throughput_at(f64::from(load)),
        })
        .collect();

    let config = FitConfig {
        iterations: 300_000,
        seed: 42,
        ..Default::default()
    };
    let outcome = fit(&table, &config);

    assert!(outcome.final_error < outcome.initial_error);
    assert!(outcome.final_error < 1e-3, "final error {}", outcome.final_error);
    assert!(
        (outcome.params.alpha - truth.alpha).abs() < 0.05,
        "alpha {}",
        outcome.params.alpha
    );
    assert!(
        (outcome.params.beta - truth.beta).abs() < 5e-4,
        "beta {}",
        outcome.params.beta
    );
    assert!(
        (outcome.params.gamma - truth.gamma).abs() < 0.05,
        "gamma {}",
        outcome.params.gamma
    );

    match analyze_peak(&outcome.params) {
        PeakResult::Peak { n_peak, .. } => {
            let expected = (0.8f64 / 0.001).sqrt();
            assert!((n_peak - expected).abs() < 5.0, "n_peak {n_peak}");
        }
        PeakResult::Unbounded => panic!("beta collapsed to zero during fit"),
    }
}

#[test]
fn fit_error_matches_observed_table_exactly_at_truth() {
    let truth = UslParameters {
        alpha: 0.1,
        beta: 0.002,
        gamma: 2.0,
    };
    let table: Vec<_> = (1..=20)
        .map(|load| escala::aggregate::ThroughputAtLoad {
            load,
            throughput: truth.throughput_at(f64::from(load)),
        })
        .collect();
    assert!(fit_error(&truth, &table) < 1e-24);
}

#[test]
fn report_over_synthetic_workload_is_complete() {
    let store = escala::workload::generate(&escala::workload::WorkloadConfig {
        workers: 8,
        bursts: 2,
        max_burst_tasks: 200,
        queue_depth: 4,
        seed: 5,
    });
    let report = Report::build(
        &store,
        &FitConfig {
            iterations: 2_000,
            seed: 5,
            ..Default::default()
        },
    );

    assert!(report.window.is_some());
    assert!(report.fit.params.is_feasible());

    // The anchor span guarantees idle time exists at the window edges, so
    // the table reaches down to load 0.
    assert_eq!(report.table.first().map(|row| row.load), Some(0));
}
