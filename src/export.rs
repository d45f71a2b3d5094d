//! Save analysis text to disk.

use crate::error::AnalyzerError;
use crate::output::AnalysisResult;
use crate::prompts::AnalysisMode;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name used when exporting a result, derived from the mode title.
///
/// ```rust
/// use ats_analyzer::{export_file_name, AnalysisMode};
///
/// assert_eq!(export_file_name(AnalysisMode::MatchPercentage), "match_percentage_results.txt");
/// ```
pub fn export_file_name(mode: AnalysisMode) -> String {
    format!("{}_results.txt", mode.title().replace(' ', "_").to_lowercase())
}

/// Write `result.text` to `target`.
///
/// If `target` is a directory the file is named by [`export_file_name`];
/// otherwise `target` is the file path. The write goes through a temp file in
/// the same directory and is renamed into place, so a reader never sees a
/// partial file.
pub fn export_result(result: &AnalysisResult, target: &Path) -> Result<PathBuf, AnalyzerError> {
    let path = if target.is_dir() {
        target.join(export_file_name(result.mode))
    } else {
        target.to_path_buf()
    };
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let wrap = |source: std::io::Error| AnalyzerError::ExportWriteFailed {
        path: path.clone(),
        source,
    };

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(wrap)?;
    tmp.write_all(result.text.as_bytes()).map_err(wrap)?;
    tmp.persist(&path).map_err(|e| wrap(e.error))?;

    info!("Exported {} to {}", result.mode, path.display());
    Ok(path)
}
