// src/build/sources.rs

//! Resolving a descriptor's `files` patterns into concrete source paths.
//!
//! Descriptors may reference files that do not exist yet (they are filtered
//! out, not an error) and may use glob patterns which expand against the
//! effective cwd. Declared pattern order is preserved because it defines the
//! concatenation order of the artifact.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Resolve `patterns` to the source paths that currently exist under `cwd`.
///
/// - Literal entries are kept iff they exist (relative ones are joined
///   against `cwd`); missing entries are silently dropped.
/// - Glob entries expand to every matching file under `cwd`, sorted within
///   the pattern so the expansion is deterministic.
///
/// Only an invalid glob pattern is an error.
pub fn resolve_sources(patterns: &[String], cwd: &Path) -> Result<Vec<PathBuf>> {
    let mut resolved = Vec::new();

    for pattern in patterns {
        if is_glob(pattern) {
            let set = single_globset(pattern)
                .with_context(|| format!("invalid glob pattern: {pattern}"))?;
            let mut matches = collect_matching_files(cwd, &set)?;
            matches.sort();
            resolved.extend(matches);
        } else {
            let path = if Path::new(pattern).is_absolute() {
                PathBuf::from(pattern)
            } else {
                cwd.join(pattern)
            };
            if path.is_file() {
                resolved.push(path);
            }
        }
    }

    Ok(resolved)
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

fn single_globset(pattern: &str) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    builder.add(Glob::new(pattern)?);
    Ok(builder.build()?)
}

/// Walk `root` and return all files whose root-relative path matches `set`.
fn collect_matching_files(root: &Path, set: &GlobSet) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            // The cwd itself (or a subdirectory) may not exist yet.
            Err(_) => continue,
        };
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.is_file() {
                if let Ok(rel) = path.strip_prefix(root) {
                    let rel_str = rel.to_string_lossy().replace('\\', "/");
                    if set.is_match(&rel_str) {
                        files.push(path);
                    }
                }
            }
        }
    }

    Ok(files)
}
