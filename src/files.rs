use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use glob::glob;
use globset::{Glob, GlobSet, GlobSetBuilder};
use url::Url;

use crate::errors::RenameError;

const FILE_URI_PREFIX: &str = "file://";

/// A file captured from the command line. Never mutated after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub source_path: PathBuf,
    pub display_name: String,
}

impl FileEntry {
    pub fn capture(path: &Path) -> Result<Self> {
        let source_path = std::path::absolute(path)?;
        let display_name = source_path
            .file_name()
            .ok_or_else(|| anyhow!("'{}' has no file name", source_path.display()))?
            .to_str()
            .ok_or_else(|| RenameError::NonUtf8Name {
                path: source_path.clone(),
            })?
            .to_string();
        Ok(Self {
            source_path,
            display_name,
        })
    }

    pub fn directory(&self) -> &Path {
        self.source_path.parent().unwrap_or_else(|| Path::new("/"))
    }
}

/// Turns startup arguments into file entries, preserving argument order.
pub fn resolve_targets(
    explicit: &[String],
    globs: &[String],
    exclude_patterns: &[String],
) -> Result<Vec<FileEntry>> {
    let exclude = build_exclude_globs(exclude_patterns)?;
    let mut entries = Vec::new();

    for raw in explicit {
        let path = normalize_argument(raw);
        append_path(&path, exclude.as_ref(), &mut entries)?;
    }

    for pattern in globs {
        let matches =
            glob(pattern).map_err(|err| anyhow!("invalid glob pattern '{pattern}': {err}"))?;
        for entry in matches {
            let path =
                entry.map_err(|err| anyhow!("error reading matches for '{pattern}': {err}"))?;
            append_path(&path, exclude.as_ref(), &mut entries)?;
        }
    }

    if entries.is_empty() {
        return Err(RenameError::NoTargets.into());
    }

    dedup_in_order(&mut entries);
    Ok(entries)
}

/// Accepts plain paths as well as `file://` URIs handed over by file managers.
pub fn normalize_argument(raw: &str) -> PathBuf {
    if !raw.starts_with(FILE_URI_PREFIX) {
        return PathBuf::from(raw);
    }
    match Url::parse(raw).ok().and_then(|url| url.to_file_path().ok()) {
        Some(path) => path,
        None => {
            let rest = raw.trim_start_matches(FILE_URI_PREFIX).trim_start_matches('/');
            PathBuf::from(format!("/{rest}"))
        }
    }
}

fn append_path(path: &Path, exclude: Option<&GlobSet>, acc: &mut Vec<FileEntry>) -> Result<()> {
    if fs::symlink_metadata(path).is_err() {
        return Err(RenameError::InvalidPath {
            path: path.to_path_buf(),
            suggestion: suggest_path(path),
        }
        .into());
    }

    if is_excluded(path, exclude) {
        return Ok(());
    }

    acc.push(FileEntry::capture(path)?);
    Ok(())
}

fn is_excluded(path: &Path, exclude: Option<&GlobSet>) -> bool {
    let Some(set) = exclude else {
        return false;
    };
    let candidate = normalize_slashes(path);
    set.is_match(candidate.as_str())
        || path
            .file_name()
            .map(|name| set.is_match(name))
            .unwrap_or(false)
}

fn normalize_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn dedup_in_order(entries: &mut Vec<FileEntry>) {
    let mut seen = HashSet::new();
    entries.retain(|entry| seen.insert(entry.source_path.clone()));
}

fn build_exclude_globs(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob =
            Glob::new(pattern).map_err(|err| anyhow!("invalid exclude glob '{pattern}': {err}"))?;
        builder.add(glob);
    }

    builder
        .build()
        .map(Some)
        .map_err(|err| anyhow!("unable to build exclude globs: {err}"))
}

/// Looks for a sibling whose name differs from the missing one only by case.
fn suggest_path(missing: &Path) -> Option<PathBuf> {
    let name = missing.file_name()?.to_str()?.to_lowercase();
    let parent = match missing.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };

    const MAX_SIBLINGS: usize = 1024;
    let iter = fs::read_dir(&parent).ok()?;
    for entry in iter.flatten().take(MAX_SIBLINGS) {
        let candidate = entry.file_name();
        if candidate.to_str().map(str::to_lowercase).as_deref() == Some(name.as_str()) {
            return Some(entry.path());
        }
    }
    None
}
