//! Summary CSV export.
//!
//! Display rounding happens here and only here: horizon and collision
//! count to integers, success rate to 4 decimals, mean collisions to 2.

use crate::models::{RunRecord, SummaryTable};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Identity and metric columns, in export order.
pub const BASE_COLUMNS: [&str; 9] = [
    "Environment",
    "Method",
    "Method_Full",
    "Horizon",
    "Success_Rate",
    "N_Critical_Collisions",
    "Mean_Critical_Collisions",
    "Method_Dir",
    "N_Runs",
];

/// Prefix of the variable-width parameter columns.
pub const PARAM_PREFIX: &str = "Param_";

/// Header row for a table: base columns then `Param_<key>` per key.
pub fn header(table: &SummaryTable) -> Vec<String> {
    BASE_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(table.param_keys.iter().map(|k| format!("{PARAM_PREFIX}{k}")))
        .collect()
}

/// Export cells for one record. Absent parameters and non-finite metrics are empty.
pub fn export_row(record: &RunRecord, param_keys: &[String]) -> Vec<String> {
    let mut row = vec![
        record.environment.clone(),
        record.method.clone(),
        record.method_full.clone(),
        format_integer(record.horizon),
        format_decimal(record.success_rate, 4),
        format_integer(record.n_critical_collisions),
        format_decimal(record.mean_critical_collisions, 2),
        record.method_dir.clone(),
        record.n_runs.to_string(),
    ];

    row.extend(
        param_keys
            .iter()
            .map(|key| record.parameters.get(key).unwrap_or_default().to_string()),
    );

    row
}

/// Serialize the table as CSV with a header row.
pub fn write_table<W: Write>(table: &SummaryTable, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(header(table))?;
    for record in &table.records {
        csv_writer.write_record(export_row(record, &table.param_keys))?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write the summary to `path`, replacing any existing file.
///
/// Content goes to a temporary file in the same directory first and is
/// then persisted over the target.
pub fn write_summary(table: &SummaryTable, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;

    write_table(table, &mut temp)
        .with_context(|| format!("Failed to serialize summary for {}", path.display()))?;

    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to write summary to {}", path.display()))?;

    debug!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Round half to even at `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}

fn format_integer(value: f64) -> String {
    if !value.is_finite() {
        String::new()
    } else {
        format!("{}", value.round_ties_even() as i64)
    }
}

fn format_decimal(value: f64, places: i32) -> String {
    if !value.is_finite() {
        String::new()
    } else {
        format!("{}", round_to(value, places))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::build_table;
    use crate::models::{FileStats, Parameters};
    use tempfile::TempDir;

    fn record(method: &str, params: &[(&str, &str)], stats: FileStats) -> RunRecord {
        let parameters: Parameters = params.iter().copied().collect();
        RunRecord::new(
            "lift",
            "failsafe_single".to_string(),
            method.to_string(),
            parameters,
            stats,
            String::new(),
        )
    }

    fn scenario_stats() -> FileStats {
        FileStats {
            n_runs: 10,
            success_rate: 0.7,
            horizon: 150.4,
            total_critical_collisions: 3.0,
            mean_critical_collisions: 0.3,
        }
    }

    fn read_back(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::Reader::from_path(path).unwrap();
        let header = reader.headers().unwrap().iter().map(String::from).collect();
        let rows = reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        (header, rows)
    }

    #[test]
    fn test_export_row_scenario() {
        let table = build_table(vec![record("PFL", &[("Ta", "8"), ("cf", "20")], scenario_stats())]);
        let row = export_row(&table.records[0], &table.param_keys);

        assert_eq!(
            row,
            vec![
                "Lift",
                "PFL",
                "PFL_Ta8_cf20",
                "150",
                "0.7",
                "3",
                "0.3",
                "failsafe_single",
                "10",
                "8",
                "20"
            ]
        );
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_to(0.123_456, 4), 0.1235);
        assert_eq!(round_to(1.0 / 3.0, 2), 0.33);
        assert_eq!(format_integer(150.5), "150");
        assert_eq!(format_integer(151.5), "152");
        assert_eq!(format_integer(150.6), "151");
        assert_eq!(format_decimal(f64::NAN, 2), "");
    }

    #[test]
    fn test_absent_parameters_are_empty() {
        let table = build_table(vec![
            record("PFL", &[("Ta", "8")], scenario_stats()),
            record("PFL", &[], scenario_stats()),
        ]);

        assert_eq!(header(&table).last().map(String::as_str), Some("Param_Ta"));

        // parameter-less row sorts first
        let bare = export_row(&table.records[0], &table.param_keys);
        assert_eq!(bare[2], "PFL");
        assert_eq!(bare[9], "");

        let with = export_row(&table.records[1], &table.param_keys);
        assert_eq!(with[9], "8");
    }

    #[test]
    fn test_write_summary_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("experiment_summary.csv");
        std::fs::write(&path, "stale content\n").unwrap();

        let table = build_table(vec![
            record("PFL", &[("Ta", "8"), ("cf", "20")], scenario_stats()),
            record(
                "BC",
                &[],
                FileStats {
                    n_runs: 3,
                    success_rate: 2.0 / 3.0,
                    horizon: 99.5,
                    total_critical_collisions: 1.0,
                    mean_critical_collisions: 1.0 / 3.0,
                },
            ),
        ]);

        write_summary(&table, &path).unwrap();
        let (header_row, rows) = read_back(&path);

        assert_eq!(header_row, header(&table));
        assert_eq!(rows.len(), table.len());

        let bc = &rows[0];
        assert_eq!(bc[1], "BC");
        assert_eq!(bc[3], "100");
        assert_eq!(bc[4].parse::<f64>().unwrap(), 0.6667);
        assert_eq!(bc[6].parse::<f64>().unwrap(), 0.33);
        assert_eq!(bc[9], "");
        assert_eq!(bc[10], "");

        let pfl = &rows[1];
        assert_eq!(pfl[2], "PFL_Ta8_cf20");
        assert_eq!(pfl[4].parse::<f64>().unwrap(), 0.7);
    }

    #[test]
    fn test_nan_metrics_export_empty() {
        let table = build_table(vec![record(
            "Empty",
            &[],
            FileStats {
                n_runs: 0,
                success_rate: f64::NAN,
                horizon: f64::NAN,
                total_critical_collisions: 0.0,
                mean_critical_collisions: f64::NAN,
            },
        )]);

        let row = export_row(&table.records[0], &table.param_keys);
        assert_eq!(row[3], "");
        assert_eq!(row[4], "");
        assert_eq!(row[5], "0");
        assert_eq!(row[6], "");
        assert_eq!(row[8], "0");
    }

    #[test]
    fn test_infinite_metrics_export_empty() {
        let table = build_table(vec![record(
            "M",
            &[],
            FileStats {
                n_runs: 2,
                success_rate: 1.0,
                horizon: f64::INFINITY,
                total_critical_collisions: f64::INFINITY,
                mean_critical_collisions: f64::NEG_INFINITY,
            },
        )]);

        let row = export_row(&table.records[0], &table.param_keys);
        assert_eq!(row[3], "");
        assert_eq!(row[5], "");
        assert_eq!(row[6], "");
        assert_eq!(row[8], "2");
    }
}
