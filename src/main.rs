use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use escala::cli::{Cli, OutputFormat};
use escala::csv_output;
use escala::fit::FitConfig;
use escala::report::Report;
use escala::span_store::{Nanos, SpanStore};
use escala::workload::{self, WorkloadConfig};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Load a span CSV (header row, then `start,stop,count,load`) and bracket
/// the observation window at the earliest start and latest stop.
fn load_spans(path: &Path) -> Result<SpanStore> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open spans file {}", path.display()))?;

    let mut store = SpanStore::new();
    let mut bounds: Option<(Nanos, Nanos)> = None;
    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("bad CSV record at row {}", index + 1))?;
        if record.len() < 4 {
            bail!("row {} has {} fields, expected 4", index + 1, record.len());
        }
        let start: Nanos = record[0]
            .trim()
            .parse()
            .with_context(|| format!("bad start at row {}", index + 1))?;
        let stop: Nanos = record[1]
            .trim()
            .parse()
            .with_context(|| format!("bad stop at row {}", index + 1))?;
        let count: f64 = record[2]
            .trim()
            .parse()
            .with_context(|| format!("bad count at row {}", index + 1))?;
        let load: u32 = record[3]
            .trim()
            .parse()
            .with_context(|| format!("bad load at row {}", index + 1))?;

        store
            .add(start, stop, count, load)
            .with_context(|| format!("rejected span at row {}", index + 1))?;
        bounds = Some(match bounds {
            None => (start, stop),
            Some((first, last)) => (first.min(start), last.max(stop)),
        });
    }

    if let Some((first, last)) = bounds {
        store.begin_observation(first);
        store.end_observation(last).context("observation window")?;
    }
    Ok(store)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let store = if cli.selftest {
        let config = WorkloadConfig {
            workers: cli.workers,
            seed: cli.seed,
            ..Default::default()
        };
        workload::generate(&config)
    } else if let Some(path) = &cli.input {
        load_spans(path)?
    } else {
        bail!("provide a spans CSV or --selftest (see --help)");
    };

    let config = FitConfig {
        iterations: cli.iterations,
        seed: cli.seed,
        ..Default::default()
    };
    let report = Report::build(&store, &config);

    match cli.format {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Csv => print!("{}", csv_output::table_to_csv(&report.table)),
    }

    for n in &cli.predict {
        println!("{},{:.6}", n, report.fit.params.throughput_at(f64::from(*n)));
    }

    Ok(())
}
