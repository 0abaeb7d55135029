//! Plain-text directory loader.
//!
//! Walks a directory and returns the text of every file matching the
//! include globs (default `**/*.md`, `**/*.txt`), sorted by relative path.
//! Format parsing (PDF, HTML) is not done here; callers supply plain text.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Texts shorter than this (after trimming) are skipped.
pub const MIN_TEXT_CHARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedText {
    pub relative_path: String,
    pub source_url: String,
    pub text: String,
}

pub fn default_include_globs() -> Vec<String> {
    vec!["**/*.md".to_string(), "**/*.txt".to_string()]
}

pub fn collect_texts(
    root: &Path,
    include_globs: &[String],
    exclude_globs: &[String],
) -> Result<Vec<LoadedText>> {
    if !root.is_dir() {
        bail!("Loader root is not a directory: {}", root.display());
    }

    let include_set = build_globset(include_globs)?;
    let mut excludes = vec!["**/.git/**".to_string(), "**/node_modules/**".to_string()];
    excludes.extend_from_slice(exclude_globs);
    let exclude_set = build_globset(&excludes)?;

    let mut items = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        if text.trim().chars().count() < MIN_TEXT_CHARS {
            debug!(path = %rel_str, "skipping near-empty file");
            continue;
        }

        let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        items.push(LoadedText {
            relative_path: rel_str,
            source_url: format!("file://{}", absolute.display()),
            text,
        });
    }

    items.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(items)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}
