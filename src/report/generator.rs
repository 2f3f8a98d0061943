//! Console tables and Markdown/JSON run reports.
//!
//! This module renders the grouped statistics and the summary table for
//! the terminal, and generates the optional run report file.

use crate::models::{GroupBy, GroupStats, MetricStats, ReportMetadata, RunReport, SummaryTable};
use crate::report::writer::{export_row, header, round_to};
use anyhow::Result;

/// Marker printed where a value is not available.
pub const NOT_AVAILABLE: &str = "n/a";

/// Marker printed for an absent parameter cell in console tables.
pub const ABSENT: &str = "-";

/// Render rows as a right-aligned plain-text table.
fn render_text_table(header: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let render_line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:>width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut output = String::new();
    output.push_str(&render_line(header));
    output.push('\n');
    for row in rows {
        output.push_str(&render_line(row));
        output.push('\n');
    }

    output
}

fn format_stat(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4}", round_to(v, 4)),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn metric_cells(stats: &MetricStats) -> [String; 2] {
    [format_stat(stats.mean), format_stat(stats.std)]
}

const GROUP_COLUMNS: [&str; 7] = [
    "Count",
    "Success_Mean",
    "Success_Std",
    "Horizon_Mean",
    "Horizon_Std",
    "Collisions_Mean",
    "Collisions_Std",
];

fn group_header(by: GroupBy) -> Vec<String> {
    std::iter::once(by.to_string())
        .chain(GROUP_COLUMNS.iter().map(|c| c.to_string()))
        .collect()
}

fn group_row(group: &GroupStats) -> Vec<String> {
    let mut row = vec![group.key.clone(), group.count.to_string()];
    row.extend(metric_cells(&group.success_rate));
    row.extend(metric_cells(&group.horizon));
    row.extend(metric_cells(&group.critical_collisions));
    row
}

/// Render a grouped-statistics view for the console.
pub fn render_group_table(by: GroupBy, groups: &[GroupStats]) -> String {
    let rows: Vec<Vec<String>> = groups.iter().map(group_row).collect();
    render_text_table(&group_header(by), &rows)
}

/// Summary rows with empty export cells replaced by console markers.
fn display_rows(table: &SummaryTable) -> Vec<Vec<String>> {
    let first_param = header(table).len() - table.param_keys.len();

    table
        .records
        .iter()
        .map(|record| {
            export_row(record, &table.param_keys)
                .into_iter()
                .enumerate()
                .map(|(i, cell)| match (cell.is_empty(), i >= first_param) {
                    (true, true) => ABSENT.to_string(),
                    (true, false) => NOT_AVAILABLE.to_string(),
                    (false, _) => cell,
                })
                .collect()
        })
        .collect()
}

/// Render every summary row for the console.
pub fn render_summary_table(table: &SummaryTable) -> String {
    render_text_table(&header(table), &display_rows(table))
}

/// Generate a complete Markdown run report.
pub fn generate_markdown_report(report: &RunReport) -> String {
    let mut output = String::new();

    output.push_str("# Experiment Summary\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_group_section(
        GroupBy::Environment,
        &report.by_environment,
    ));
    output.push_str(&generate_group_section(GroupBy::Method, &report.by_method));
    output.push_str(&generate_results_section(&report.table));
    output.push_str(&generate_failures_section(report));

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();
    let stats = &metadata.stats;

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Results Root:** `{}`\n", metadata.root));
    section.push_str(&format!("- **Summary File:** `{}`\n", metadata.output_path));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Files Discovered:** {}\n", stats.files_discovered));
    section.push_str(&format!("- **Files Processed:** {}\n", stats.files_processed));
    if stats.files_failed > 0 {
        section.push_str(&format!("- **Files Failed:** {}\n", stats.files_failed));
    }
    if stats.paths_skipped > 0 {
        section.push_str(&format!(
            "- **Paths Skipped (layout):** {}\n",
            stats.paths_skipped
        ));
    }
    if stats.files_excluded > 0 {
        section.push_str(&format!("- **Files Excluded:** {}\n", stats.files_excluded));
    }
    section.push_str(&format!(
        "- **Duration:** {:.2}s\n\n",
        metadata.duration_seconds
    ));

    section
}

fn markdown_table(header: &[String], rows: &[Vec<String>]) -> String {
    let mut table = String::new();

    table.push_str(&format!("| {} |\n", header.join(" | ")));
    table.push_str(&format!(
        "|{}\n",
        header.iter().map(|_| ":---|").collect::<String>()
    ));
    for row in rows {
        table.push_str(&format!("| {} |\n", row.join(" | ")));
    }
    table.push('\n');

    table
}

fn generate_group_section(by: GroupBy, groups: &[GroupStats]) -> String {
    if groups.is_empty() {
        return String::new();
    }

    let rows: Vec<Vec<String>> = groups.iter().map(group_row).collect();
    format!(
        "## Summary by {}\n\n{}",
        by,
        markdown_table(&group_header(by), &rows)
    )
}

fn generate_results_section(table: &SummaryTable) -> String {
    let mut section = String::from("## Results\n\n");

    if table.is_empty() {
        section.push_str("No result files were summarized.\n\n");
        return section;
    }

    section.push_str(&markdown_table(&header(table), &display_rows(table)));
    section
}

fn generate_failures_section(report: &RunReport) -> String {
    if report.failures.is_empty() {
        return String::new();
    }

    let mut section = String::from("## Skipped Files\n\n");
    for failure in &report.failures {
        section.push_str(&format!("- `{}`: {}\n", failure.path, failure.error));
    }
    section.push('\n');

    section
}

/// Generate a JSON run report.
pub fn generate_json_report(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{build_table, group_stats};
    use crate::models::{FileFailure, FileStats, Parameters, RunRecord, RunStats};
    use chrono::Utc;

    fn record(env: &str, method: &str, params: &[(&str, &str)], success: f64) -> RunRecord {
        let parameters: Parameters = params.iter().copied().collect();
        RunRecord::new(
            env,
            "failsafe_single".to_string(),
            method.to_string(),
            parameters,
            FileStats {
                n_runs: 10,
                success_rate: success,
                horizon: 150.4,
                total_critical_collisions: 3.0,
                mean_critical_collisions: 0.3,
            },
            String::new(),
        )
    }

    fn create_test_report() -> RunReport {
        let table = build_table(vec![
            record("lift", "PFL", &[("Ta", "8")], 0.7),
            record("lift", "BC", &[], 0.5),
            record("can", "PFL", &[("Ta", "4")], 0.9),
        ]);

        RunReport {
            metadata: ReportMetadata {
                root: "results".to_string(),
                output_path: "results/experiment_summary.csv".to_string(),
                generated_at: Utc::now(),
                stats: RunStats {
                    files_discovered: 4,
                    files_excluded: 0,
                    paths_skipped: 1,
                    files_processed: 3,
                    files_failed: 1,
                },
                duration_seconds: 0.5,
            },
            by_environment: group_stats(&table.records, GroupBy::Environment),
            by_method: group_stats(&table.records, GroupBy::Method),
            table,
            failures: vec![FileFailure {
                path: "lift/ph/x/DP.csv".to_string(),
                error: "missing required column 'success'".to_string(),
            }],
        }
    }

    #[test]
    fn test_render_group_table_marks_missing_std() {
        let report = create_test_report();
        let rendered = render_group_table(GroupBy::Environment, &report.by_environment);

        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Success_Std"));
        // Can has a single row
        assert!(lines[1].trim_start().starts_with("Can"));
        assert!(lines[1].contains(NOT_AVAILABLE));
        assert!(lines[2].contains("0.6000"));
    }

    #[test]
    fn test_render_summary_table_marks_absent_params() {
        let report = create_test_report();
        let rendered = render_summary_table(&report.table);

        let bc_line = rendered.lines().find(|l| l.contains(" BC ")).unwrap();
        assert!(bc_line.trim_end().ends_with(ABSENT));
        assert!(rendered.lines().next().unwrap().contains("Param_Ta"));
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# Experiment Summary"));
        assert!(markdown.contains("## Summary by Environment"));
        assert!(markdown.contains("## Summary by Method"));
        assert!(markdown.contains("| PFL_Ta8 |"));
        assert!(markdown.contains("Files Failed:** 1"));
        assert!(markdown.contains("## Skipped Files"));
        assert!(markdown.contains("lift/ph/x/DP.csv"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"by_environment\""));
        assert!(json.contains("\"param_keys\""));
        assert!(json.contains("\"method_full\": \"PFL_Ta8\""));
    }
}
