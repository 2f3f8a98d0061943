//! Decomposition of result paths relative to the results root.
//!
//! Expected shape: `<environment>/<mode>/<method_dir>/.../<file>.<ext>`.

use std::path::{Component, Path};

/// Minimum number of relative path segments for a result file.
pub const MIN_SEGMENTS: usize = 4;

/// Identity fields extracted from a result file's relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathLayout {
    pub environment: String,
    /// Protocol-handling mode directory. Carried but not validated.
    pub mode: String,
    pub method_dir: String,
    /// Filename without extension.
    pub stem: String,
}

/// Split a relative path into its identity fields.
///
/// Returns `None` when the path has fewer than [`MIN_SEGMENTS`] segments.
pub fn decompose(relative: &Path) -> Option<PathLayout> {
    let segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if segments.len() < MIN_SEGMENTS {
        return None;
    }

    let stem = relative.file_stem()?.to_string_lossy().into_owned();

    Some(PathLayout {
        environment: segments[0].clone(),
        mode: segments[1].clone(),
        method_dir: segments[2].clone(),
        stem,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompose_standard_layout() {
        let layout = decompose(Path::new("lift/ph/failsafe_single/PFL_Ta8_cf20.csv")).unwrap();
        assert_eq!(layout.environment, "lift");
        assert_eq!(layout.mode, "ph");
        assert_eq!(layout.method_dir, "failsafe_single");
        assert_eq!(layout.stem, "PFL_Ta8_cf20");
    }

    #[test]
    fn test_decompose_too_shallow() {
        assert_eq!(decompose(Path::new("experiment_summary.csv")), None);
        assert_eq!(decompose(Path::new("lift/PFL.csv")), None);
        assert_eq!(decompose(Path::new("lift/ph/PFL.csv")), None);
    }

    #[test]
    fn test_decompose_deeper_path_uses_file_stem() {
        let layout = decompose(Path::new("can/mh/baseline/seed1/BC_Ta4.csv")).unwrap();
        assert_eq!(layout.environment, "can");
        assert_eq!(layout.method_dir, "baseline");
        assert_eq!(layout.stem, "BC_Ta4");
    }

    #[test]
    fn test_mode_is_not_validated() {
        let layout = decompose(Path::new("square/anything/dir/M.csv")).unwrap();
        assert_eq!(layout.mode, "anything");
    }
}
