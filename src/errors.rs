use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub const REPORT_URL: &str = "https://github.com/ion201/BulkRename";

#[derive(Debug, Error)]
pub enum RenameError {
    #[error("'{}' does not exist{}", .path.display(), suggestion_hint(.suggestion.as_ref()))]
    InvalidPath {
        path: PathBuf,
        suggestion: Option<PathBuf>,
    },

    #[error("'{}' has a file name that is not valid UTF-8", .path.display())]
    NonUtf8Name { path: PathBuf },

    #[error("no files given; pass file paths or --glob")]
    NoTargets,

    #[error("invalid pattern '{pattern}'")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("renaming '{}' would produce an unusable name '{name}'", .source_path.display())]
    InvalidDestination { source_path: PathBuf, name: String },

    #[error(
        "you don't have permission to rename '{}' to '{}' ({completed} rename(s) already done)",
        .from.display(),
        .to.display()
    )]
    Permission {
        from: PathBuf,
        to: PathBuf,
        completed: usize,
        #[source]
        source: io::Error,
    },

    #[error(
        "'{}' does not appear to exist anymore ({completed} rename(s) already done); \
         if it was not moved or deleted meanwhile, please report this at {}",
        .from.display(),
        REPORT_URL
    )]
    NotFound {
        from: PathBuf,
        to: PathBuf,
        completed: usize,
        #[source]
        source: io::Error,
    },

    #[error(
        "failed to rename '{}' to '{}' ({completed} rename(s) already done)",
        .from.display(),
        .to.display()
    )]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        completed: usize,
        #[source]
        source: io::Error,
    },
}

impl RenameError {
    /// Classifies an I/O failure from the move primitive.
    pub fn from_move(from: PathBuf, to: PathBuf, completed: usize, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::PermissionDenied => RenameError::Permission {
                from,
                to,
                completed,
                source,
            },
            io::ErrorKind::NotFound => RenameError::NotFound {
                from,
                to,
                completed,
                source,
            },
            _ => RenameError::RenameFailed {
                from,
                to,
                completed,
                source,
            },
        }
    }
}

fn suggestion_hint(suggestion: Option<&PathBuf>) -> String {
    match suggestion {
        Some(path) => format!("; did you mean '{}'?", path.display()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_is_classified() {
        let err = RenameError::from_move(
            PathBuf::from("/a"),
            PathBuf::from("/b"),
            2,
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, RenameError::Permission { completed: 2, .. }));
        assert!(err.to_string().contains("permission"));
    }

    #[test]
    fn missing_source_is_classified() {
        let err = RenameError::from_move(
            PathBuf::from("/a"),
            PathBuf::from("/b"),
            0,
            io::Error::from(io::ErrorKind::NotFound),
        );
        assert!(matches!(err, RenameError::NotFound { .. }));
        assert!(err.to_string().contains(REPORT_URL));
    }

    #[test]
    fn invalid_path_mentions_suggestion() {
        let err = RenameError::InvalidPath {
            path: PathBuf::from("/tmp/Foo.txt"),
            suggestion: Some(PathBuf::from("/tmp/foo.txt")),
        };
        let message = err.to_string();
        assert!(message.contains("does not exist"));
        assert!(message.contains("did you mean '/tmp/foo.txt'"));
    }
}
