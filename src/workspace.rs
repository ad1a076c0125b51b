//! Source file discovery.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("invalid exclude pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("cannot walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Exclusion rules in gitignore syntax, matched against paths relative to
/// the walk root.
///
/// A pattern ending in `/` only matches directories. A pattern without any
/// other `/` matches at every depth; one with a `/` is anchored at the root.
/// `!pattern` re-includes.
#[derive(Debug, Clone)]
pub struct Excludes {
    rules: Gitignore,
}

impl Excludes {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, WorkspaceError> {
        let mut builder = GitignoreBuilder::new("");
        for pattern in patterns {
            let raw = pattern.as_ref();
            builder
                .add_line(None, raw.trim_start_matches("./"))
                .map_err(|e| WorkspaceError::InvalidPattern {
                    pattern: raw.to_string(),
                    message: e.to_string(),
                })?;
        }
        let rules = builder.build().map_err(|e| WorkspaceError::InvalidPattern {
            pattern: patterns
                .iter()
                .map(|p| p.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
            message: e.to_string(),
        })?;
        Ok(Self { rules })
    }

    pub fn excludes_dir(&self, relative: &Path) -> bool {
        self.rules.matched(relative, true).is_ignore()
    }

    pub fn excludes_file(&self, relative: &Path) -> bool {
        self.rules.matched(relative, false).is_ignore()
    }
}

/// Files under `root` ending in `extension`, minus excluded paths, sorted.
///
/// A file `root` is returned as is when it has the extension.
pub fn find_files<S: AsRef<str>>(
    root: &Path,
    extension: &str,
    excludes: &[S],
) -> Result<Vec<PathBuf>, WorkspaceError> {
    let excludes = Excludes::new(excludes)?;
    let extension = extension.trim_start_matches('.');
    let has_extension =
        |path: &Path| path.extension().is_some_and(|ext| ext == extension);

    if root.is_file() {
        return Ok(if has_extension(root) {
            vec![root.to_path_buf()]
        } else {
            Vec::new()
        });
    }

    let mut files = Vec::new();
    let mut it = WalkDir::new(root).follow_links(false).into_iter();
    while let Some(entry) = it.next() {
        let entry = entry.map_err(|e| WorkspaceError::Walk {
            path: e.path().unwrap_or(root).to_path_buf(),
            source: e,
        })?;
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if relative.as_os_str().is_empty() {
            continue;
        }

        if entry.file_type().is_dir() {
            if excludes.excludes_dir(relative) {
                tracing::trace!(dir = %relative.display(), "skipping excluded directory");
                it.skip_current_dir();
            }
            continue;
        }
        if has_extension(entry.path()) && !excludes.excludes_file(relative) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    tracing::debug!(root = %root.display(), count = files.len(), "found source files");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "package x\n").unwrap();
    }

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn finds_go_files_and_skips_excluded_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "main.go");
        touch(root, "README.md");
        touch(root, "models/user.go");
        touch(root, "vendor/lib/lib.go");
        touch(root, "models/vendor/inner.go");
        touch(root, "models/user_gen.go");

        let files = find_files(root, ".go", &["vendor/", "*_gen.go"]).unwrap();
        assert_eq!(names(root, &files), vec!["main.go", "models/user.go"]);
    }

    #[test]
    fn anchored_patterns_only_match_from_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "internal/a.go");
        touch(root, "pkg/internal/b.go");

        let files = find_files(root, "go", &["internal/"]).unwrap();
        assert!(files.is_empty());

        let files = find_files(root, "go", &["pkg/internal/"]).unwrap();
        assert_eq!(names(root, &files), vec!["internal/a.go"]);
    }

    #[test]
    fn single_file_root() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.go");
        let file = dir.path().join("a.go");
        let none: [&str; 0] = [];
        assert_eq!(find_files(&file, ".go", &none).unwrap(), vec![file.clone()]);
        assert!(find_files(&file, ".rs", &none).unwrap().is_empty());
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            find_files(dir.path(), ".go", &["[oops"]),
            Err(WorkspaceError::InvalidPattern { .. })
        ));
    }
}
