//! Summary table assembly and grouped statistics.
//!
//! This module merges per-file records into the sorted [`SummaryTable`]
//! and computes the descriptive statistics views over it.

use crate::models::{GroupBy, GroupStats, MetricStats, RunRecord, SummaryTable};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Build the summary table from records given in discovery order.
///
/// Parameter columns follow first-seen order over the input. Rows are then
/// stable-sorted by (environment, method, method_full).
pub fn build_table(mut records: Vec<RunRecord>) -> SummaryTable {
    let param_keys = collect_param_keys(&records);
    sort_records(&mut records);

    SummaryTable {
        records,
        param_keys,
    }
}

/// Union of parameter keys across all records, in first-seen order.
pub fn collect_param_keys(records: &[RunRecord]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();

    for key in records.iter().flat_map(|r| r.parameters.keys()) {
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }

    keys
}

/// Stable sort by (environment, method, method_full), byte-wise ascending.
pub fn sort_records(records: &mut [RunRecord]) {
    records.sort_by(compare_records);
}

fn compare_records(a: &RunRecord, b: &RunRecord) -> Ordering {
    a.environment
        .cmp(&b.environment)
        .then_with(|| a.method.cmp(&b.method))
        .then_with(|| a.method_full.cmp(&b.method_full))
}

/// Group records and compute count, mean and sample std per group.
///
/// Groups are returned sorted by key.
pub fn group_stats(records: &[RunRecord], by: GroupBy) -> Vec<GroupStats> {
    let mut groups: BTreeMap<&str, Vec<&RunRecord>> = BTreeMap::new();

    for record in records {
        let key = match by {
            GroupBy::Environment => record.environment.as_str(),
            GroupBy::Method => record.method.as_str(),
        };
        groups.entry(key).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(key, members)| GroupStats {
            key: key.to_string(),
            count: members.iter().filter(|r| !r.success_rate.is_nan()).count(),
            success_rate: metric_stats(members.iter().map(|r| r.success_rate)),
            horizon: metric_stats(members.iter().map(|r| r.horizon)),
            critical_collisions: metric_stats(members.iter().map(|r| r.n_critical_collisions)),
        })
        .collect()
}

/// Mean and sample (N-1) standard deviation, ignoring NaN values.
pub fn metric_stats(values: impl Iterator<Item = f64>) -> MetricStats {
    let values: Vec<f64> = values.filter(|v| !v.is_nan()).collect();
    let n = values.len();

    if n == 0 {
        return MetricStats::default();
    }

    let mean = values.iter().sum::<f64>() / n as f64;

    let std = if n < 2 {
        None
    } else {
        let sum_sq_dev: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        Some((sum_sq_dev / (n - 1) as f64).sqrt())
    };

    MetricStats {
        mean: Some(mean),
        std,
    }
}
