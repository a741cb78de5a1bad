use std::fs;
use std::io;
use std::path::Path;

use crate::errors::RenameError;
use crate::planner::{PlanEntry, RenamePlan};

/// The filesystem operations the renamer needs.
pub trait FileSystem {
    fn exists(&self, path: &Path) -> bool;
    /// True when both paths name the same file on disk.
    fn same_file(&self, a: &Path, b: &Path) -> bool;
    fn move_path(&self, from: &Path, to: &Path) -> io::Result<()>;
}

pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn same_file(&self, a: &Path, b: &Path) -> bool {
        same_identity(a, b)
    }

    fn move_path(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }
}

#[cfg(unix)]
fn same_identity(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (fs::symlink_metadata(a), fs::symlink_metadata(b)) {
        (Ok(left), Ok(right)) => left.dev() == right.dev() && left.ino() == right.ino(),
        _ => false,
    }
}

// Resolves the parent only, so a link is still compared as itself.
#[cfg(not(unix))]
fn same_identity(a: &Path, b: &Path) -> bool {
    let resolve = |path: &Path| -> Option<std::path::PathBuf> {
        fs::symlink_metadata(path).ok()?;
        let parent = fs::canonicalize(path.parent()?).ok()?;
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        Some(parent.join(name))
    };
    match (resolve(a), resolve(b)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

/// Moves every entry in plan order, stopping at the first failure.
///
/// Renames completed before a failure stay in place.
pub fn execute_plan<F, C>(plan: RenamePlan, fs: &F, mut on_renamed: C) -> Result<usize, RenameError>
where
    F: FileSystem,
    C: FnMut(&PlanEntry),
{
    let mut completed = 0usize;
    for entry in plan.into_entries() {
        if let Err(err) = fs.move_path(&entry.source, &entry.destination) {
            return Err(RenameError::from_move(
                entry.source,
                entry.destination,
                completed,
                err,
            ));
        }
        completed += 1;
        on_renamed(&entry);
    }
    Ok(completed)
}
