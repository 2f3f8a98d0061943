//! Per-file summary statistics.
//!
//! Reads one result CSV and reduces its `success`, `n_steps` and
//! `critical_collisions` columns to a [`FileStats`].

use crate::error::FileParseError;
use crate::models::FileStats;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const SUCCESS_COLUMN: &str = "success";
pub const STEPS_COLUMN: &str = "n_steps";
pub const COLLISIONS_COLUMN: &str = "critical_collisions";

/// Cell contents read as missing values, in addition to the empty cell.
pub const MISSING_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Running sum and count of the non-missing values of one column.
#[derive(Debug, Clone, Copy, Default)]
pub struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    /// Push a parsed cell; `None` (missing) and NaN values are skipped.
    pub fn push_present(&mut self, value: Option<f64>) {
        if let Some(value) = value.filter(|v| !v.is_nan()) {
            self.push(value);
        }
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Arithmetic mean, NaN when no values were pushed.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Summarize the result file at `path`.
pub fn summarize_file(path: &Path) -> Result<FileStats, FileParseError> {
    let file = File::open(path).map_err(|source| FileParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    summarize_reader(file, path)
}

/// Summarize CSV content from any reader; `path` is used for error context.
pub fn summarize_reader<R: Read>(reader: R, path: &Path) -> Result<FileStats, FileParseError> {
    let csv_error = |source: csv::Error| FileParseError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().map_err(csv_error)?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| FileParseError::MissingColumn {
                path: path.to_path_buf(),
                column: name,
            })
    };

    let success_idx = column(SUCCESS_COLUMN)?;
    let steps_idx = column(STEPS_COLUMN)?;
    let collisions_idx = column(COLLISIONS_COLUMN)?;

    let mut n_runs = 0usize;
    let mut success = Accumulator::default();
    let mut steps = Accumulator::default();
    let mut collisions = Accumulator::default();

    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        n_runs += 1;

        let cell = |idx: usize| record.get(idx).unwrap_or("");
        let invalid = |column: &'static str, value: &str| FileParseError::InvalidValue {
            path: path.to_path_buf(),
            line,
            column,
            value: value.to_string(),
        };

        let raw = cell(success_idx);
        match parse_success(raw) {
            Some(value) => success.push_present(value),
            None => return Err(invalid(SUCCESS_COLUMN, raw)),
        }

        let raw = cell(steps_idx);
        match parse_number(raw) {
            Some(value) => steps.push_present(value),
            None => return Err(invalid(STEPS_COLUMN, raw)),
        }

        let raw = cell(collisions_idx);
        match parse_number(raw) {
            Some(value) => collisions.push_present(value),
            None => return Err(invalid(COLLISIONS_COLUMN, raw)),
        }
    }

    for (column, total) in [
        (SUCCESS_COLUMN, success.sum()),
        (STEPS_COLUMN, steps.sum()),
        (COLLISIONS_COLUMN, collisions.sum()),
    ] {
        if !total.is_finite() {
            return Err(FileParseError::Overflow {
                path: path.to_path_buf(),
                column,
            });
        }
    }

    Ok(FileStats {
        n_runs,
        success_rate: success.mean(),
        horizon: steps.mean(),
        total_critical_collisions: collisions.sum(),
        mean_critical_collisions: collisions.mean(),
    })
}

/// Parse a success flag: `true`/`false` in any case, or any number.
///
/// `Some(None)` is a missing cell, `None` is malformed.
fn parse_success(raw: &str) -> Option<Option<f64>> {
    if raw.eq_ignore_ascii_case("true") {
        Some(Some(1.0))
    } else if raw.eq_ignore_ascii_case("false") {
        Some(Some(0.0))
    } else {
        parse_number(raw)
    }
}

/// Parse a numeric cell. Empty cells and [`MISSING_TOKENS`] are missing,
/// infinities are malformed.
fn parse_number(raw: &str) -> Option<Option<f64>> {
    if raw.is_empty() || MISSING_TOKENS.iter().any(|token| *token == raw) {
        return Some(None);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| !v.is_infinite())
        .map(Some)
}
