//! Data models for the result aggregator.
//!
//! This module contains the core data structures used throughout
//! the application for representing runs, summary tables, and reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hyperparameters parsed from a filename, in order of first appearance.
///
/// Inserting an existing key replaces its value but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameters(Vec<(String, String)>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a parameter. Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();

        if let Some(slot) = self.0.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }

        self.0.push((key, value));
        None
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Parameters::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// Summary statistics of a single result file.
///
/// Means are NaN when the file has no usable values for that column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FileStats {
    /// Number of rows (runs) in the file.
    pub n_runs: usize,
    /// Mean of the `success` column.
    pub success_rate: f64,
    /// Mean of the `n_steps` column.
    pub horizon: f64,
    /// Sum of the `critical_collisions` column.
    pub total_critical_collisions: f64,
    /// Mean of the `critical_collisions` column.
    pub mean_critical_collisions: f64,
}

/// One row of the summary table: a single summarized result file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Display-cased top-level directory name.
    pub environment: String,
    /// Raw method directory name (third path segment).
    pub method_dir: String,
    /// Leading filename token.
    pub method: String,
    /// Method plus `_{key}{value}` for every parameter.
    pub method_full: String,
    pub parameters: Parameters,
    pub horizon: f64,
    pub success_rate: f64,
    pub n_critical_collisions: f64,
    pub mean_critical_collisions: f64,
    pub n_runs: usize,
    /// Source path relative to the results root.
    pub source: String,
}

impl RunRecord {
    /// Build a record, deriving `method_full` from the method and parameters.
    pub fn new(
        environment_dir: &str,
        method_dir: String,
        method: String,
        parameters: Parameters,
        stats: FileStats,
        source: String,
    ) -> Self {
        let method_full = method_full(&method, &parameters);
        Self {
            environment: display_case(environment_dir),
            method_dir,
            method,
            method_full,
            parameters,
            horizon: stats.horizon,
            success_rate: stats.success_rate,
            n_critical_collisions: stats.total_critical_collisions,
            mean_critical_collisions: stats.mean_critical_collisions,
            n_runs: stats.n_runs,
            source,
        }
    }
}

/// Method name with every parameter appended as `_{key}{value}`.
pub fn method_full(method: &str, parameters: &Parameters) -> String {
    if parameters.is_empty() {
        return method.to_string();
    }

    let mut full = method.to_string();
    for (key, value) in parameters.iter() {
        full.push('_');
        full.push_str(key);
        full.push_str(value);
    }
    full
}

/// First character upper-cased, the rest lower-cased (`lift` -> `Lift`).
pub fn display_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Sorted summary rows plus the union of parameter keys in first-seen order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryTable {
    pub records: Vec<RunRecord>,
    pub param_keys: Vec<String>,
}

impl SummaryTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Mean and sample standard deviation of one metric within a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    /// `None` when the group has no usable values.
    pub mean: Option<f64>,
    /// `None` when the group has fewer than two usable values.
    pub std: Option<f64>,
}

/// Descriptive statistics for one group of summary rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub key: String,
    /// Rows in the group with a defined success rate.
    pub count: usize,
    pub success_rate: MetricStats,
    pub horizon: MetricStats,
    pub critical_collisions: MetricStats,
}

/// Grouping dimension for the descriptive-statistics views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Environment,
    Method,
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupBy::Environment => write!(f, "Environment"),
            GroupBy::Method => write!(f, "Method"),
        }
    }
}

/// A result file that was excluded because it could not be summarized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: String,
    pub error: String,
}

/// Counters describing what happened to every discovered path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Files with the result extension that passed the marker filter.
    pub files_discovered: usize,
    /// Files dropped because a path segment contains an exclusion marker.
    pub files_excluded: usize,
    /// Files dropped because their path has too few segments.
    pub paths_skipped: usize,
    /// Files that produced a summary row.
    pub files_processed: usize,
    /// Files that failed to parse.
    pub files_failed: usize,
}

/// Metadata about a run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub root: String,
    pub output_path: String,
    pub generated_at: DateTime<Utc>,
    pub stats: RunStats,
    pub duration_seconds: f64,
}

/// The complete run report (Markdown/JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub metadata: ReportMetadata,
    pub table: SummaryTable,
    pub by_environment: Vec<GroupStats>,
    pub by_method: Vec<GroupStats>,
    pub failures: Vec<FileFailure>,
}
