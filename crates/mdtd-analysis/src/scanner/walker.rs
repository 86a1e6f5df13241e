//! Deterministic file discovery on top of `ignore`.
//!
//! The walk itself is sequential; paths come back sorted so that the
//! parallel stage downstream can preserve a stable output order.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use mdtd_core::errors::{ConfigError, ScanError};

/// Directories never worth descending into.
const DEFAULT_SKIPPED_DIRS: &[&str] = &[
    "node_modules",
    "target",
    "__pycache__",
    ".venv",
    "venv",
    ".git",
    ".hg",
    ".svn",
];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Compiled exclusion globs, matched against root-relative paths.
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    patterns: Vec<Pattern>,
}

impl Exclusions {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p.as_ref()).map_err(|e| {
                    ConfigError::invalid("scan.exclude", format!("invalid glob '{}': {e}", p.as_ref()))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_excluded(&self, relative: &Path) -> bool {
        let file_name = relative.file_name().map(Path::new);
        self.patterns.iter().any(|p| {
            p.matches_path_with(relative, MATCH_OPTIONS)
                || file_name.is_some_and(|f| p.matches_path_with(f, MATCH_OPTIONS))
        })
    }
}

/// Walks an analysis root and returns the candidate source files.
pub struct SourceWalker {
    root: PathBuf,
    exclusions: Exclusions,
    respect_gitignore: bool,
}

impl SourceWalker {
    pub fn new(root: impl Into<PathBuf>, exclusions: Exclusions, respect_gitignore: bool) -> Self {
        Self {
            root: root.into(),
            exclusions,
            respect_gitignore,
        }
    }

    /// Collect every regular file under the root, sorted by path.
    /// A root that is itself a file yields just that file.
    pub fn collect(&self) -> Result<Vec<PathBuf>, ScanError> {
        if !self.root.exists() {
            return Err(ScanError::RootNotFound {
                path: self.root.clone(),
            });
        }
        if self.root.is_file() {
            return Ok(vec![self.root.clone()]);
        }

        let root = self.root.clone();
        let exclusions = self.exclusions.clone();
        let walker = ignore::WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(self.respect_gitignore)
            .git_global(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .require_git(false)
            .follow_links(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                if is_dir
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|n| DEFAULT_SKIPPED_DIRS.contains(&n))
                {
                    return false;
                }
                let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
                relative.as_os_str().is_empty() || !exclusions.is_excluded(relative)
            })
            .build();

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_some_and(|t| t.is_file()) {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => {
                    tracing::warn!(root = %self.root.display(), error = %e, "skipping unreadable entry");
                }
            }
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusion_matches_relative_paths_and_names() {
        let ex = Exclusions::new(&["vendor/**", "*.min.js"]).unwrap();
        assert!(ex.is_excluded(Path::new("vendor/lib/a.py")));
        assert!(ex.is_excluded(Path::new("web/app.min.js")));
        assert!(!ex.is_excluded(Path::new("src/app.js")));
    }

    #[test]
    fn invalid_glob_is_config_error() {
        assert!(Exclusions::new(&["a/[b"]).is_err());
    }

    #[test]
    fn walk_is_sorted_and_skips_excluded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules/x")).unwrap();
        std::fs::write(dir.path().join("src/b.py"), "pass").unwrap();
        std::fs::write(dir.path().join("src/a.py"), "pass").unwrap();
        std::fs::write(dir.path().join("src/gen.py"), "pass").unwrap();
        std::fs::write(dir.path().join("node_modules/x/i.js"), "").unwrap();

        let walker = SourceWalker::new(dir.path(), Exclusions::new(&["src/gen.py"]).unwrap(), true);
        let files = walker.collect().unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["src/a.py", "src/b.py"]);
    }

    #[test]
    fn missing_root_is_scan_error() {
        let walker = SourceWalker::new("/definitely/not/here", Exclusions::default(), true);
        assert!(matches!(walker.collect(), Err(ScanError::RootNotFound { .. })));
    }
}
