//! CSV output for the throughput table
//!
//! `load,throughput` rows for spreadsheet analysis or feeding an external
//! plotting/fitting pipeline.

use crate::aggregate::ThroughputAtLoad;

/// Render the table as CSV with a header row
pub fn table_to_csv(table: &[ThroughputAtLoad]) -> String {
    let mut output = String::from("load,throughput\n");
    for row in table {
        output.push_str(&format!("{},{:.6}\n", row.load, row.throughput));
    }
    output
}
