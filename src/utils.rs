//! General utility functions for byki
//!
//! File discovery and formatting helpers shared by the conversion commands.

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};
use std::fs;
use std::path::{Path, PathBuf};

/// Default pattern used when scanning directories for decks
pub const DEFAULT_DECK_PATTERN: &str = "*.byki";

/// Format a file size in human-readable form (B, KB, MB)
pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} B", size)
    }
}

/// Create a glob matcher from a pattern string
///
/// - `*.ext` becomes `**/*.ext` (match in any directory)
/// - Plain text without wildcards becomes `**/*text*` (substring search)
pub fn create_glob_matcher(pattern: &str) -> Result<GlobMatcher> {
    let pattern = if pattern.starts_with("*.") {
        format!("**/{}", pattern)
    } else if !pattern.contains('*') && !pattern.contains('?') {
        format!("**/*{}*", pattern)
    } else {
        pattern.to_string()
    };

    let glob = Glob::new(&pattern).with_context(|| format!("Invalid pattern: {}", pattern))?;
    Ok(glob.compile_matcher())
}

/// Recursively collect all files in a directory, sorted by path
pub fn collect_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_files_recursive(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    if dir.is_dir() {
        for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
            let path = entry?.path();
            if path.is_dir() {
                collect_files_recursive(&path, files)?;
            } else {
                files.push(path);
            }
        }
    }
    Ok(())
}

/// Expand a list of files and directories into deck files.
///
/// Files are taken as given. Directories are scanned recursively and only
/// files matching `pattern` are kept.
pub fn collect_deck_files(inputs: &[PathBuf], pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = create_glob_matcher(pattern)?;
    let mut decks = Vec::new();

    for input in inputs {
        if input.is_dir() {
            decks.extend(
                collect_files(input)?
                    .into_iter()
                    .filter(|path| matcher.is_match(path)),
            );
        } else {
            decks.push(input.clone());
        }
    }
    Ok(decks)
}

/// Make sure `dir` exists and is a directory
pub fn prepare_output_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    } else if !dir.is_dir() {
        anyhow::bail!("{} exists but is not a directory", dir.display());
    }
    Ok(())
}

/// File stem used to name a deck's exported files
pub fn deck_base_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "deck".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn test_collect_deck_files_filters_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("a.byki"), b"").unwrap();
        fs::write(dir.path().join("nested/b.byki"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        let explicit = dir.path().join("notes.txt");

        let files = collect_deck_files(
            &[dir.path().to_path_buf(), explicit.clone()],
            DEFAULT_DECK_PATTERN,
        )
        .unwrap();

        assert_eq!(
            files,
            vec![
                dir.path().join("a.byki"),
                dir.path().join("nested/b.byki"),
                explicit,
            ]
        );
    }

    #[test]
    fn test_prepare_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out/sub");
        prepare_output_dir(&out).unwrap();
        assert!(out.is_dir());

        let file = dir.path().join("file");
        fs::write(&file, b"x").unwrap();
        assert!(prepare_output_dir(&file).is_err());
    }

    #[test]
    fn test_deck_base_name() {
        assert_eq!(deck_base_name(Path::new("/decks/Lesson01.byki")), "Lesson01");
        assert_eq!(deck_base_name(Path::new("/")), "deck");
    }
}
