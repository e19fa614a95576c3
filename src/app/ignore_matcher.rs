use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;
use std::sync::Arc;

/// Answers "is this path ignored?" from the root `.gitignore`.
///
/// Built once per walk or discovery run; clones share the compiled rules.
#[derive(Clone)]
pub struct IgnoreMatcher {
    gitignore: Arc<Gitignore>,
}

impl IgnoreMatcher {
    pub const FILE_NAME: &'static str = ".gitignore";

    /// Loads `<root>/.gitignore`; a missing or unreadable file yields a
    /// matcher that ignores nothing.
    pub fn new(root: &Path) -> Self {
        let path = root.join(Self::FILE_NAME);
        if !path.is_file() {
            return Self::empty();
        }

        let mut builder = GitignoreBuilder::new(root);
        if let Some(err) = builder.add(&path) {
            log::warn!("⚠️ Problem reading {}: {}", path.display(), err);
        }
        match builder.build() {
            Ok(gitignore) => Self {
                gitignore: Arc::new(gitignore),
            },
            Err(err) => {
                log::warn!("⚠️ Ignoring {}: {}", path.display(), err);
                Self::empty()
            }
        }
    }

    pub fn empty() -> Self {
        Self {
            gitignore: Arc::new(Gitignore::empty()),
        }
    }

    /// Matches `path` itself only; ancestors are the caller's business.
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        self.gitignore.matched(path, is_dir).is_ignore()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_gitignore_ignores_nothing() {
        let dir = TempDir::new().unwrap();
        let matcher = IgnoreMatcher::new(dir.path());
        assert!(!matcher.is_ignored(&dir.path().join("anything.log"), false));
    }

    #[test]
    fn test_patterns_and_negation() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "*.log\n!keep.log\ntarget/\n").unwrap();
        let matcher = IgnoreMatcher::new(dir.path());

        assert!(matcher.is_ignored(&dir.path().join("debug.log"), false));
        assert!(!matcher.is_ignored(&dir.path().join("keep.log"), false));
        assert!(matcher.is_ignored(&dir.path().join("target"), true));
        // directory-only pattern does not hit a file of the same name
        assert!(!matcher.is_ignored(&dir.path().join("target"), false));
        assert!(!matcher.is_ignored(&dir.path().join("main.rs"), false));
    }

    #[test]
    fn test_nested_paths_are_matched() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "*.env\n").unwrap();
        let matcher = IgnoreMatcher::new(dir.path());

        assert!(matcher.is_ignored(&dir.path().join("config/secret.env"), false));
    }
}
