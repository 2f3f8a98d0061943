//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.runsummary.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".runsummary.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Discovery settings.
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Filename parsing settings.
    #[serde(default)]
    pub parser: ParserConfig,

    /// Console report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Summary file name, written inside the results root.
    #[serde(default = "default_output_file")]
    pub output_file: String,

    /// Number of result files summarized concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_file: default_output_file(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_output_file() -> String {
    "experiment_summary.csv".to_string()
}

fn default_concurrency() -> usize {
    4
}

/// Result discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Result file extension.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Path substrings marking auxiliary artifacts to skip.
    #[serde(default = "default_exclude_markers")]
    pub exclude_markers: Vec<String>,

    /// Follow symbolic links while walking.
    #[serde(default)]
    pub follow_links: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            exclude_markers: default_exclude_markers(),
            follow_links: false,
        }
    }
}

fn default_extension() -> String {
    "csv".to_string()
}

fn default_exclude_markers() -> Vec<String> {
    vec!["video".to_string()]
}

/// Filename parsing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Token delimiter inside result filenames.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
        }
    }
}

fn default_delimiter() -> char {
    crate::scanner::DEFAULT_DELIMITER
}

/// Console report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Print the grouped statistics tables.
    #[serde(default = "default_true")]
    pub print_grouped: bool,

    /// Print every summary row.
    #[serde(default = "default_true")]
    pub print_summary: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            print_grouped: true,
            print_summary: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from a directory.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings and only
    /// override when explicitly provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(concurrency) = args.concurrency {
            self.general.concurrency = concurrency;
        }

        if let Some(ref extension) = args.extension {
            self.scanner.extension = extension.trim_start_matches('.').to_string();
        }
        if let Some(ref markers) = args.exclude {
            self.scanner.exclude_markers = markers.clone();
        }
        if args.follow_links {
            self.scanner.follow_links = true;
        }

        if let Some(delimiter) = args.delimiter {
            self.parser.delimiter = delimiter;
        }

        if args.no_summary_dump {
            self.report.print_summary = false;
        }
    }

    /// Check the merged settings, whichever source they came from.
    pub fn validate(&self) -> Result<()> {
        if self.general.concurrency == 0 {
            bail!("Concurrency must be at least 1");
        }

        if self.general.output_file.trim().is_empty() {
            bail!("Output file name must not be empty");
        }

        if self.scanner.extension.trim_start_matches('.').is_empty() {
            bail!("Extension must not be empty");
        }

        // Letters and digits belong to parameter tokens
        if self.parser.delimiter.is_ascii_alphanumeric() {
            bail!(
                "Delimiter must not be a letter or digit: '{}'",
                self.parser.delimiter
            );
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
