//! Aggregation pipeline.
//!
//! Discover → parse → summarize per file → aggregate → persist. Per-file
//! work fans out over blocking tasks; the final sort in
//! [`build_table`] decides row order, so results never depend on which
//! task finishes first.

use crate::analysis::{build_table, group_stats, summarize_file};
use crate::error::FileParseError;
use crate::models::{FileFailure, GroupBy, GroupStats, RunRecord, RunStats, SummaryTable};
use crate::report::write_summary;
use crate::scanner::{parse_filename, DiscoveredFile, ResultScanner, ScanConfig};
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Inputs for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub root: PathBuf,
    /// Summary file destination.
    pub output: PathBuf,
    pub scan: ScanConfig,
    pub delimiter: char,
    /// Maximum number of files summarized at once.
    pub concurrency: usize,
    pub show_progress: bool,
}

/// Records and failures collected from the summarize stage.
#[derive(Debug, Default)]
pub struct Collected {
    /// Successfully summarized files, in discovery order.
    pub records: Vec<RunRecord>,
    /// Files that could not be summarized, in discovery order.
    pub failures: Vec<FileFailure>,
}

/// Everything produced by a run that wrote a summary.
#[derive(Debug)]
pub struct Summary {
    pub table: SummaryTable,
    pub by_environment: Vec<GroupStats>,
    pub by_method: Vec<GroupStats>,
    pub failures: Vec<FileFailure>,
    pub stats: RunStats,
    pub output_path: PathBuf,
}

/// Terminal state of a successful run.
#[derive(Debug)]
pub enum Outcome {
    /// No result file could be summarized; nothing was written.
    Empty {
        stats: RunStats,
        failures: Vec<FileFailure>,
    },
    /// The summary file was written.
    Written(Summary),
}

/// Run the complete pipeline.
///
/// Fails only when the root is missing or the summary cannot be written.
pub async fn run_pipeline(options: &PipelineOptions) -> Result<Outcome> {
    let scanner = ResultScanner::new(options.root.clone(), options.scan.clone())?;
    let discovery = scanner.discover();

    let mut stats = RunStats {
        files_discovered: discovery.files.len() + discovery.skipped_paths.len(),
        files_excluded: discovery.excluded,
        paths_skipped: discovery.skipped_paths.len(),
        ..RunStats::default()
    };

    info!(
        "Discovered {} result files under {} ({} skipped by layout, {} excluded)",
        discovery.files.len(),
        scanner.root().display(),
        stats.paths_skipped,
        stats.files_excluded
    );

    if discovery.files.is_empty() {
        return Ok(Outcome::Empty {
            stats,
            failures: Vec::new(),
        });
    }

    let progress = options
        .show_progress
        .then(|| progress_bar(discovery.files.len() as u64));

    let collected = summarize_files(
        discovery.files,
        options.delimiter,
        options.concurrency,
        progress.as_ref(),
    )
    .await?;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    stats.files_processed = collected.records.len();
    stats.files_failed = collected.failures.len();

    if collected.records.is_empty() {
        return Ok(Outcome::Empty {
            stats,
            failures: collected.failures,
        });
    }

    let table = build_table(collected.records);
    write_summary(&table, &options.output)?;
    info!(
        "Wrote {} summary rows to {}",
        table.len(),
        options.output.display()
    );

    let by_environment = group_stats(&table.records, GroupBy::Environment);
    let by_method = group_stats(&table.records, GroupBy::Method);

    Ok(Outcome::Written(Summary {
        table,
        by_environment,
        by_method,
        failures: collected.failures,
        stats,
        output_path: options.output.clone(),
    }))
}

/// Summarize discovered files with at most `concurrency` in flight.
///
/// A failing file is logged and recorded; it never aborts the batch.
pub async fn summarize_files(
    files: Vec<DiscoveredFile>,
    delimiter: char,
    concurrency: usize,
    progress: Option<&ProgressBar>,
) -> Result<Collected> {
    debug!(
        "Summarizing {} files with concurrency {}",
        files.len(),
        concurrency
    );

    let mut completed = stream::iter(files.into_iter().map(|file| {
        tokio::task::spawn_blocking(move || {
            let result = summarize_discovered(&file, delimiter);
            (file, result)
        })
    }))
    .buffer_unordered(concurrency.max(1));

    let mut records: Vec<(usize, RunRecord)> = Vec::new();
    let mut failures: Vec<(usize, FileFailure)> = Vec::new();

    while let Some(joined) = completed.next().await {
        let (file, result) = joined.context("Summarizer task failed")?;

        match result {
            Ok(record) => {
                info!("Processed: {}", record.source);
                records.push((file.index, record));
            }
            Err(e) => {
                warn!("Skipping {}: {}", file.relative_path.display(), e);
                failures.push((
                    file.index,
                    FileFailure {
                        path: file.relative_path.to_string_lossy().into_owned(),
                        error: e.to_string(),
                    },
                ));
            }
        }

        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    records.sort_by_key(|(index, _)| *index);
    failures.sort_by_key(|(index, _)| *index);

    Ok(Collected {
        records: records.into_iter().map(|(_, r)| r).collect(),
        failures: failures.into_iter().map(|(_, f)| f).collect(),
    })
}

/// Parse the filename and summarize the contents of one result file.
pub fn summarize_discovered(
    file: &DiscoveredFile,
    delimiter: char,
) -> Result<RunRecord, FileParseError> {
    let name = parse_filename(&file.layout.stem, delimiter).map_err(|source| {
        FileParseError::Name {
            path: file.relative_path.clone(),
            source,
        }
    })?;

    let stats = summarize_file(&file.absolute_path)?;

    Ok(RunRecord::new(
        &file.layout.environment,
        file.layout.method_dir.clone(),
        name.method,
        name.parameters,
        stats,
        file.relative_path.to_string_lossy().into_owned(),
    ))
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}
