use std::collections::{HashMap, HashSet};
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use crate::errors::RenameError;
use crate::files::FileEntry;
use crate::pattern::{Pattern, rename_file_name};
use crate::rename::FileSystem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub old_name: String,
    pub new_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyPlanReason {
    NoMatches,
    NoChanges,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanWarning {
    Overwrites(PathBuf),
    Duplicate(PathBuf),
}

impl PlanWarning {
    pub fn describe(&self) -> String {
        match self {
            PlanWarning::Overwrites(path) => {
                format!("warning: '{}' already exists and will be replaced", path.display())
            }
            PlanWarning::Duplicate(path) => {
                format!("warning: more than one file would be renamed to '{}'", path.display())
            }
        }
    }
}

/// Ordered (source, destination) pairs where the two always differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    entries: Vec<PlanEntry>,
    matched: usize,
}

impl RenamePlan {
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<PlanEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn empty_reason(&self) -> Option<EmptyPlanReason> {
        if !self.entries.is_empty() {
            None
        } else if self.matched == 0 {
            Some(EmptyPlanReason::NoMatches)
        } else {
            Some(EmptyPlanReason::NoChanges)
        }
    }

    /// Collisions worth showing before the user confirms.
    ///
    /// A destination that is also a queued source is only safe when that
    /// source is moved earlier in the plan.
    pub fn warnings(&self, fs: &impl FileSystem) -> Vec<PlanWarning> {
        let source_index: HashMap<&Path, usize> = self
            .entries
            .iter()
            .enumerate()
            .map(|(index, e)| (e.source.as_path(), index))
            .collect();
        let mut destinations = HashSet::new();
        let mut warnings = Vec::new();

        for (index, entry) in self.entries.iter().enumerate() {
            let dest = entry.destination.as_path();
            if !destinations.insert(dest) {
                warnings.push(PlanWarning::Duplicate(dest.to_path_buf()));
                continue;
            }
            let vacated_earlier = source_index.get(dest).is_some_and(|&moved| moved < index);
            if !vacated_earlier && fs.exists(dest) && !fs.same_file(&entry.source, dest) {
                warnings.push(PlanWarning::Overwrites(dest.to_path_buf()));
            }
        }
        warnings
    }
}

pub fn build_plan(
    files: &[FileEntry],
    pattern: &Pattern,
    template: &str,
) -> Result<RenamePlan, RenameError> {
    let regex = pattern.compile()?;
    let mut entries = Vec::new();
    let mut matched = 0usize;

    for file in files {
        if regex.is_match(&file.display_name) {
            matched += 1;
        }
        let new_name = rename_file_name(&regex, &file.display_name, template);
        let destination = file.directory().join(&new_name);
        if destination == file.source_path {
            continue;
        }
        if !is_usable_name(&new_name) {
            return Err(RenameError::InvalidDestination {
                source_path: file.source_path.clone(),
                name: new_name,
            });
        }
        entries.push(PlanEntry {
            source: file.source_path.clone(),
            destination,
            old_name: file.display_name.clone(),
            new_name,
        });
    }

    Ok(RenamePlan { entries, matched })
}

fn is_usable_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains(MAIN_SEPARATOR)
        && !name.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rename::RealFileSystem;
    use std::io;

    struct FakeFileSystem {
        existing: Vec<PathBuf>,
    }

    impl FileSystem for FakeFileSystem {
        fn exists(&self, path: &Path) -> bool {
            self.existing.iter().any(|p| p == path)
        }

        fn same_file(&self, a: &Path, b: &Path) -> bool {
            a == b
        }

        fn move_path(&self, _from: &Path, _to: &Path) -> io::Result<()> {
            Ok(())
        }
    }

    fn files(names: &[&str]) -> Vec<FileEntry> {
        names
            .iter()
            .map(|name| FileEntry::capture(&Path::new("/data").join(name)).expect("capture"))
            .collect()
    }

    fn new_names(plan: &RenamePlan) -> Vec<&str> {
        plan.entries().iter().map(|e| e.new_name.as_str()).collect()
    }

    #[test]
    fn plain_pattern_replaces_prefix() {
        let plan = build_plan(
            &files(&["foo1.txt", "foo2.txt"]),
            &Pattern::Plain("foo".into()),
            "bar",
        )
        .expect("plan");
        assert_eq!(new_names(&plan), vec!["bar1.txt", "bar2.txt"]);
        assert_eq!(
            plan.entries()[0].destination,
            PathBuf::from("/data/bar1.txt")
        );
    }

    #[test]
    fn regex_macro_wraps_unique_digit() {
        let plan = build_plan(
            &files(&["a_1.log", "a_2.log"]),
            &Pattern::Regex(r"\d".into()),
            "[&]",
        )
        .expect("plan");
        assert_eq!(new_names(&plan), vec!["a_[1].log", "a_[2].log"]);
    }

    #[test]
    fn ambiguous_matches_use_template_literally() {
        let plan = build_plan(&files(&["ab.log"]), &Pattern::Regex("[ab]".into()), "[&]")
            .expect("plan");
        assert_eq!(new_names(&plan), vec!["[&][&].log"]);
    }

    #[test]
    fn unchanged_names_are_not_queued() {
        let plan = build_plan(&files(&["same.txt"]), &Pattern::Plain("same".into()), "same")
            .expect("plan");
        assert!(plan.is_empty());
        assert_eq!(plan.len(), 0);
        assert_eq!(plan.empty_reason(), Some(EmptyPlanReason::NoChanges));
    }

    #[test]
    fn no_matches_is_distinguished_from_no_changes() {
        let plan = build_plan(&files(&["a.txt"]), &Pattern::Plain("zzz".into()), "y")
            .expect("plan");
        assert_eq!(plan.empty_reason(), Some(EmptyPlanReason::NoMatches));
    }

    #[test]
    fn only_changed_entries_keep_input_order() {
        let plan = build_plan(
            &files(&["x2", "keep", "x1"]),
            &Pattern::Plain("x".into()),
            "y",
        )
        .expect("plan");
        assert_eq!(new_names(&plan), vec!["y2", "y1"]);
        assert_eq!(plan.empty_reason(), None);
    }

    #[test]
    fn planning_is_deterministic() {
        let inputs = files(&["IMG_001.jpg", "IMG_002.jpg", "notes.txt"]);
        let pattern = Pattern::Regex(r"IMG_(\d+)".into());
        let first = build_plan(&inputs, &pattern, "photo-&").expect("plan");
        let second = build_plan(&inputs, &pattern, "photo-&").expect("plan");
        assert_eq!(first, second);
        assert_eq!(new_names(&first), vec!["photo-IMG_001.jpg", "photo-IMG_002.jpg"]);
    }

    #[test]
    fn invalid_regex_fails_before_planning() {
        let err = build_plan(&files(&["a"]), &Pattern::Regex("[".into()), "b").unwrap_err();
        assert!(matches!(err, RenameError::Pattern { .. }));
    }

    #[test]
    fn separator_in_new_name_is_rejected() {
        let err = build_plan(&files(&["a.txt"]), &Pattern::Plain("a".into()), "sub/a")
            .unwrap_err();
        assert!(matches!(err, RenameError::InvalidDestination { .. }));
    }

    #[test]
    fn empty_new_name_is_rejected() {
        let err = build_plan(&files(&["abc"]), &Pattern::Plain("abc".into()), "").unwrap_err();
        assert!(matches!(err, RenameError::InvalidDestination { .. }));
    }

    #[test]
    fn warnings_flag_overwrites_and_duplicates() {
        let plan = build_plan(
            &files(&["a1", "a2", "b1"]),
            &Pattern::Regex(r"\d".into()),
            "",
        )
        .expect("plan");
        let fs = FakeFileSystem {
            existing: vec![PathBuf::from("/data/b")],
        };
        let warnings = plan.warnings(&fs);
        assert_eq!(
            warnings,
            vec![
                PlanWarning::Duplicate(PathBuf::from("/data/a")),
                PlanWarning::Overwrites(PathBuf::from("/data/b")),
            ]
        );
    }

    #[test]
    fn renaming_onto_a_source_moved_later_is_an_overwrite() {
        let plan = build_plan(
            &files(&["a.txt.bak", "a.txt"]),
            &Pattern::Regex(r"\.bak$|\.txt$".into()),
            "",
        )
        .expect("plan");
        assert_eq!(new_names(&plan), vec!["a.txt", "a"]);
        let fs = FakeFileSystem {
            existing: vec![PathBuf::from("/data/a.txt")],
        };
        assert_eq!(
            plan.warnings(&fs),
            vec![PlanWarning::Overwrites(PathBuf::from("/data/a.txt"))]
        );
    }

    #[test]
    fn renaming_onto_a_source_moved_earlier_is_safe() {
        let plan = build_plan(
            &files(&["a.txt", "a.txt.bak"]),
            &Pattern::Regex(r"\.bak$|\.txt$".into()),
            "",
        )
        .expect("plan");
        assert_eq!(new_names(&plan), vec!["a", "a.txt"]);
        let fs = FakeFileSystem {
            existing: vec![PathBuf::from("/data/a.txt")],
        };
        assert!(plan.warnings(&fs).is_empty());
    }

    #[test]
    fn case_only_rename_warns_about_a_distinct_file_on_disk() {
        let temp = tempfile::tempdir().expect("temp dir");
        let upper = temp.path().join("Foo.txt");
        let lower = temp.path().join("foo.txt");
        std::fs::write(&upper, "UPPER").expect("write");
        std::fs::write(&lower, "LOWER").expect("write");
        let distinct = std::fs::read_to_string(&upper).expect("read") == "UPPER";
        let plan = build_plan(
            &[FileEntry::capture(&upper).expect("capture")],
            &Pattern::Plain("Foo".into()),
            "foo",
        )
        .expect("plan");

        let warnings = plan.warnings(&RealFileSystem);

        if distinct {
            assert_eq!(warnings, vec![PlanWarning::Overwrites(lower)]);
        } else {
            assert!(warnings.is_empty());
        }
    }
}
