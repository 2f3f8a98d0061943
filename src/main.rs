//! runsummary - experiment result aggregator
//!
//! A CLI tool that walks a directory tree of per-run result CSVs,
//! parses method identity and hyperparameters from the paths, and writes
//! one sorted summary table plus grouped descriptive statistics.
//!
//! Exit codes:
//!   0 - Success (summary written, or no result files to summarize)
//!   1 - Runtime error (missing results root, invalid config, write failure)

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod runner;
mod scanner;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use models::{FileFailure, GroupBy, ReportMetadata, RunReport, RunStats};
use runner::{Outcome, PipelineOptions, Summary};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args)?;

    info!("runsummary v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Aggregation failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .runsummary.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the output file, extension, markers, and more.");
    Ok(())
}

/// Initialize logging. `RUST_LOG` refines the level chosen by the flags.
fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(args.log_level()).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Run the aggregation workflow. Returns the exit code.
async fn run(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    let root = args
        .root
        .clone()
        .context("A results root is required (--root)")?;

    let mut config = load_config(&args, &root)?;
    config.merge_with_args(&args);
    config.validate().context("Invalid configuration")?;

    let scan_config = scanner::ScanConfig::from(&config.scanner);

    if args.dry_run {
        return handle_dry_run(&root, scan_config);
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| root.join(&config.general.output_file));

    let options = PipelineOptions {
        root: root.clone(),
        output,
        scan: scan_config,
        delimiter: config.parser.delimiter,
        concurrency: config.general.concurrency,
        show_progress: !args.quiet,
    };

    println!("📂 Aggregating results under: {}", root.display());

    let outcome = runner::run_pipeline(&options).await?;
    let duration = start_time.elapsed().as_secs_f64();

    let summary = match outcome {
        Outcome::Empty { stats, failures } => {
            report_failures(&failures);
            if stats.files_failed > 0 {
                println!(
                    "\n⚠️  None of the {} result files could be summarized. No summary written.",
                    stats.files_failed
                );
            } else {
                println!("\n⚠️  No result files found to process. No summary written.");
            }
            return Ok(0);
        }
        Outcome::Written(summary) => summary,
    };

    println!("\n✅ Summary saved to: {}", summary.output_path.display());
    println!("   Total methods analyzed: {}", summary.table.len());
    report_failures(&summary.failures);

    if config.report.print_grouped {
        for (by, groups) in [
            (GroupBy::Environment, &summary.by_environment),
            (GroupBy::Method, &summary.by_method),
        ] {
            println!("\nSummary by {}:", by);
            print!("{}", report::render_group_table(by, groups));
        }
    }

    if config.report.print_summary {
        println!("\nComplete Summary (all methods):");
        print!("{}", report::render_summary_table(&summary.table));
    }

    if let Some(ref report_path) = args.report {
        write_run_report(&root, summary, duration, args.format, report_path)?;
        println!("\n📝 Report saved to: {}", report_path.display());
    }

    Ok(0)
}

/// Print the per-file failures that were skipped.
fn report_failures(failures: &[FileFailure]) {
    if failures.is_empty() {
        return;
    }

    println!("\n⚠️  Skipped {} result files:", failures.len());
    for failure in failures {
        println!("     {}: {}", failure.path, failure.error);
    }
}

/// Build and write the Markdown/JSON run report.
fn write_run_report(
    root: &Path,
    summary: Summary,
    duration: f64,
    format: OutputFormat,
    path: &Path,
) -> Result<()> {
    let report = RunReport {
        metadata: ReportMetadata {
            root: root.display().to_string(),
            output_path: summary.output_path.display().to_string(),
            generated_at: Utc::now(),
            stats: summary.stats,
            duration_seconds: duration,
        },
        table: summary.table,
        by_environment: summary.by_environment,
        by_method: summary.by_method,
        failures: summary.failures,
    };

    let content = match format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

/// Handle --dry-run: list the files that would be summarized, then exit.
fn handle_dry_run(root: &Path, scan_config: scanner::ScanConfig) -> Result<i32> {
    println!("\n🔍 Dry run: scanning {} (nothing is read or written)...\n", root.display());

    let result_scanner = scanner::ResultScanner::new(root.to_path_buf(), scan_config)?;
    let discovery = result_scanner.discover();

    if discovery.files.is_empty() {
        println!("   No matching result files found.");
    } else {
        println!(
            "   Found {} files that would be summarized:\n",
            discovery.files.len()
        );
        for file in &discovery.files {
            println!("     📄 {}", file.relative_path.display());
        }
    }

    if !discovery.skipped_paths.is_empty() {
        println!(
            "\n   Skipped {} files with fewer than {} path segments:",
            discovery.skipped_paths.len(),
            scanner::MIN_SEGMENTS
        );
        for path in &discovery.skipped_paths {
            println!("     ⏭  {}", path.display());
        }
    }

    let stats = RunStats {
        files_discovered: discovery.files.len() + discovery.skipped_paths.len(),
        files_excluded: discovery.excluded,
        paths_skipped: discovery.skipped_paths.len(),
        ..RunStats::default()
    };
    println!(
        "\n   Total: {} discovered, {} excluded by marker",
        stats.files_discovered, stats.files_excluded
    );

    println!("\n✅ Dry run complete.");
    Ok(0)
}

/// Load configuration: explicit path, then the working directory, then the results root.
fn load_config(args: &Args, root: &Path) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    let candidates: [PathBuf; 2] = [PathBuf::from("."), root.to_path_buf()];
    for dir in &candidates {
        match Config::load_from_dir(dir) {
            Ok(Some(config)) => {
                info!("Loaded config from {}", dir.join(CONFIG_FILE_NAME).display());
                return Ok(config);
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Failed to load config: {:#}", e);
                return Ok(Config::default());
            }
        }
    }

    debug!("No config file found, using defaults");
    Ok(Config::default())
}
