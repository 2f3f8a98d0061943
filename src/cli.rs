//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// runsummary - aggregate experiment result CSVs into one summary table
///
/// Walks <ROOT>/<environment>/<mode>/<method_dir>/<Method>[_<Name><Digits>]*.csv,
/// summarizes every result file, and writes <ROOT>/experiment_summary.csv
/// together with grouped statistics on the console.
///
/// Examples:
///   runsummary --root ./results
///   runsummary --root ./results --exclude video,render --concurrency 8
///   runsummary --root ./results --report summary.md
///   runsummary --root ./results --report summary.json --format json
///   runsummary --root ./results --dry-run
///   runsummary --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Results root directory to aggregate
    #[arg(
        short,
        long,
        value_name = "DIR",
        env = "RUNSUMMARY_ROOT",
        required_unless_present = "init_config"
    )]
    pub root: Option<PathBuf>,

    /// Summary output path
    ///
    /// Defaults to <ROOT>/experiment_summary.csv (file name configurable).
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .runsummary.toml in the current directory,
    /// then in the results root.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Result file extension
    #[arg(long, value_name = "EXT")]
    pub extension: Option<String>,

    /// Path markers to exclude (comma-separated)
    ///
    /// Any result path with a segment containing a marker is skipped.
    /// Example: --exclude video,render
    #[arg(long, value_name = "MARKERS", value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,

    /// Follow symbolic links while walking the results root
    #[arg(long)]
    pub follow_links: bool,

    /// Token delimiter inside result filenames
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Number of result files summarized concurrently
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Write a run report to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Run report format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Do not print the full summary table
    #[arg(long)]
    pub no_summary_dump: bool,

    /// Dry run: list the result files that would be summarized and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .runsummary.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if let Some(ref extension) = self.extension {
            if extension.trim_start_matches('.').is_empty() {
                return Err("Extension must not be empty".to_string());
            }
        }

        // Letters and digits belong to parameter tokens
        if let Some(delimiter) = self.delimiter {
            if delimiter.is_ascii_alphanumeric() {
                return Err(format!(
                    "Delimiter must not be a letter or digit: '{}'",
                    delimiter
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_args() -> Args {
        Args {
            root: Some(PathBuf::from("results")),
            output: None,
            config: None,
            verbose: false,
            quiet: false,
            extension: None,
            exclude: None,
            follow_links: false,
            delimiter: None,
            concurrency: None,
            report: None,
            format: OutputFormat::Markdown,
            no_summary_dump: false,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "runsummary",
            "--root",
            "results",
            "--exclude",
            "video,render",
            "--concurrency",
            "2",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.root, Some(PathBuf::from("results")));
        assert_eq!(
            args.exclude,
            Some(vec!["video".to_string(), "render".to_string()])
        );
        assert_eq!(args.concurrency, Some(2));
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_init_config_does_not_need_root() {
        let args = Args::try_parse_from(["runsummary", "--init-config"]).unwrap();
        assert!(args.init_config);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_concurrency() {
        let mut args = make_args();
        args.concurrency = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_delimiter() {
        let mut args = make_args();
        args.delimiter = Some('a');
        assert!(args.validate().is_err());

        args.delimiter = Some('-');
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
