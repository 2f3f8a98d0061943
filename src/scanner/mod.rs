//! Result file discovery.
//!
//! This module walks the results root, filters candidate files by
//! extension and exclusion markers, and decomposes their paths into
//! environment / method identity.

pub mod filename;
pub mod layout;

pub use filename::{parse_filename, DEFAULT_DELIMITER};
pub use layout::{decompose, PathLayout, MIN_SEGMENTS};

use crate::error::AggregateError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Configuration for result discovery.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Result file extension without the dot (e.g. "csv")
    pub extension: String,
    /// Substrings that flag auxiliary-artifact paths (e.g. ["video"])
    pub exclude_markers: Vec<String>,
    /// Follow symbolic links while walking
    pub follow_links: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extension: "csv".to_string(),
            exclude_markers: vec!["video".to_string()],
            follow_links: false,
        }
    }
}

impl From<&crate::config::ScannerConfig> for ScanConfig {
    fn from(config: &crate::config::ScannerConfig) -> Self {
        Self {
            extension: config.extension.trim_start_matches('.').to_string(),
            exclude_markers: config.exclude_markers.clone(),
            follow_links: config.follow_links,
        }
    }
}

/// A result file ready to be summarized.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Position in deterministic traversal order.
    pub index: usize,
    pub absolute_path: PathBuf,
    /// Path relative to the results root.
    pub relative_path: PathBuf,
    pub layout: PathLayout,
}

/// Outcome of walking the results root.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub files: Vec<DiscoveredFile>,
    /// Result files whose relative path has too few segments.
    pub skipped_paths: Vec<PathBuf>,
    /// Result files dropped by an exclusion marker.
    pub excluded: usize,
}

/// Walker over a results root.
pub struct ResultScanner {
    config: ScanConfig,
    root: PathBuf,
}

impl ResultScanner {
    /// Create a scanner, failing if the root is missing or not a directory.
    pub fn new(root: PathBuf, config: ScanConfig) -> Result<Self, AggregateError> {
        if !root.exists() {
            return Err(AggregateError::RootNotFound(root));
        }
        if !root.is_dir() {
            return Err(AggregateError::RootNotDirectory(root));
        }

        Ok(Self { config, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily yield every file with the result extension, markers included.
    ///
    /// Entries are visited in file-name order so repeated runs see files in
    /// the same sequence.
    pub fn walk(&self) -> impl Iterator<Item = PathBuf> + '_ {
        WalkDir::new(&self.root)
            .follow_links(self.config.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Cannot read entry under {}: {}", self.root.display(), e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| self.has_extension(path))
    }

    /// Walk the root and split matches into summarizable and skipped files.
    pub fn discover(&self) -> Discovery {
        let mut discovery = Discovery::default();

        for path in self.walk() {
            let relative = path.strip_prefix(&self.root).unwrap_or(&path).to_path_buf();

            if self.is_excluded(&relative) {
                debug!("Skipping auxiliary artifact: {}", relative.display());
                discovery.excluded += 1;
                continue;
            }

            match decompose(&relative) {
                Some(layout) => {
                    debug!("Found {} (mode '{}')", relative.display(), layout.mode);
                    let index = discovery.files.len();
                    discovery.files.push(DiscoveredFile {
                        index,
                        absolute_path: path,
                        relative_path: relative,
                        layout,
                    });
                }
                None => {
                    debug!(
                        "Skipping {}: expected at least {} path segments",
                        relative.display(),
                        MIN_SEGMENTS
                    );
                    discovery.skipped_paths.push(relative);
                }
            }
        }

        discovery
    }

    /// Check the file extension (case-insensitive).
    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(&self.config.extension))
            .unwrap_or(false)
    }

    /// Check whether any relative path segment contains an exclusion marker.
    fn is_excluded(&self, relative: &Path) -> bool {
        relative.components().any(|component| {
            let segment = component.as_os_str().to_string_lossy();
            self.config
                .exclude_markers
                .iter()
                .filter(|marker| !marker.is_empty())
                .any(|marker| segment.contains(marker.as_str()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "success,n_steps,critical_collisions\n").unwrap();
    }

    #[test]
    fn test_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("does-not-exist");

        let result = ResultScanner::new(missing.clone(), ScanConfig::default());
        assert!(matches!(result, Err(AggregateError::RootNotFound(p)) if p == missing));
    }

    #[test]
    fn test_root_is_file() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "results.csv");

        let result = ResultScanner::new(temp_dir.path().join("results.csv"), ScanConfig::default());
        assert!(matches!(result, Err(AggregateError::RootNotDirectory(_))));
    }

    #[test]
    fn test_walk_filters_extension() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "lift/ph/a/PFL.csv");
        touch(temp_dir.path(), "lift/ph/a/PFL.CSV");
        fs::write(temp_dir.path().join("lift/ph/a/notes.txt"), "x").unwrap();

        let scanner =
            ResultScanner::new(temp_dir.path().to_path_buf(), ScanConfig::default()).unwrap();
        let found: Vec<_> = scanner.walk().collect();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_discover_excludes_markers_and_shallow_paths() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "lift/ph/failsafe_single/PFL_Ta8.csv");
        touch(temp_dir.path(), "lift/ph/failsafe_single/videos/PFL_Ta8.csv");
        touch(temp_dir.path(), "lift/ph/PFL_Ta8.csv");
        touch(temp_dir.path(), "experiment_summary.csv");

        let scanner =
            ResultScanner::new(temp_dir.path().to_path_buf(), ScanConfig::default()).unwrap();
        let discovery = scanner.discover();

        assert_eq!(discovery.files.len(), 1);
        assert_eq!(discovery.excluded, 1);
        assert_eq!(discovery.skipped_paths.len(), 2);
        assert_eq!(discovery.files[0].layout.method_dir, "failsafe_single");
    }

    #[test]
    fn test_marker_above_root_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("video_study");
        touch(&root, "lift/ph/a/PFL.csv");

        let scanner = ResultScanner::new(root, ScanConfig::default()).unwrap();
        assert_eq!(scanner.discover().files.len(), 1);
    }

    #[test]
    fn test_discovery_order_is_sorted() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "square/ph/b/Z.csv");
        touch(temp_dir.path(), "can/ph/a/B.csv");
        touch(temp_dir.path(), "can/ph/a/A.csv");

        let scanner =
            ResultScanner::new(temp_dir.path().to_path_buf(), ScanConfig::default()).unwrap();
        let stems: Vec<_> = scanner
            .discover()
            .files
            .into_iter()
            .map(|f| (f.index, f.layout.stem))
            .collect();

        assert_eq!(
            stems,
            vec![
                (0, "A".to_string()),
                (1, "B".to_string()),
                (2, "Z".to_string())
            ]
        );
    }
}
