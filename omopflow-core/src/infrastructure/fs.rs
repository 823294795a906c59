use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::infrastructure::error::InfrastructureError;

/// `*.csv` files directly inside `dir` (no recursion), sorted by path so logs
/// are stable between runs. The extension match is case-insensitive.
pub fn discover_tabular_files(dir: &Path) -> Result<Vec<PathBuf>, InfrastructureError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            InfrastructureError::Io(
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
            )
        })?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}
