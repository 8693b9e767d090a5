use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Paths directly inside `folder`.
///
/// Listing order is whatever the filesystem returns and differs between
/// platforms; `sorted` orders by file name instead.
pub fn folder_entries(folder: &Path, sorted: bool) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(folder)
        .with_context(|| format!("Failed to read directory '{}'", folder.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in '{}'", folder.display()))?;
        paths.push(entry.path());
    }

    if sorted {
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    }
    Ok(paths)
}

/// Case-sensitive check on the file name, so `A.DOCX` does not end with `.docx`.
pub fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(suffix))
        .unwrap_or(false)
}
