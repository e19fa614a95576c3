use crate::app::content::file_extension;
use crate::app::ignore_matcher::IgnoreMatcher;
use crate::app::models::{DirRule, Exclusions, RuleStore, ROOT_KEY};
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Proposes default rules from the extensions found on disk.
///
/// Rules are only created for the root and its immediate subdirectories,
/// but each of those scans its whole subtree to build the extension list.
pub struct Discovery {
    root: PathBuf,
    matcher: IgnoreMatcher,
    exclusions: Exclusions,
}

/// What a discovery run changed in the store.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    pub root_filled: bool,
    pub added: Vec<String>,
}

impl Discovery {
    pub fn new(root: impl Into<PathBuf>, exclusions: Exclusions) -> Self {
        let root = root.into();
        let matcher = IgnoreMatcher::new(&root);
        Self {
            root,
            matcher,
            exclusions,
        }
    }

    /// Merges discovered rules into `store`. Existing keys are left alone,
    /// except a root rule whose extension list is empty.
    ///
    /// Only failing to list the root's children is an error.
    pub fn run(&self, store: &mut RuleStore) -> Result<DiscoveryReport> {
        let children = fs::read_dir(&self.root)
            .with_context(|| format!("Failed to list {}", self.root.display()))?;

        let mut report = DiscoveryReport::default();

        match store.root().cloned() {
            Some(rule) if !rule.extensions.is_empty() => {}
            existing => {
                let extensions = self.scan_extensions(&self.root);
                let rule = existing.unwrap_or_default().with_extensions(extensions);
                store.insert(ROOT_KEY, rule);
                report.root_filled = true;
            }
        }

        let mut subdirs: Vec<(String, PathBuf)> = children
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                Some((name, entry.path()))
            })
            .collect();
        subdirs.sort();

        for (name, path) in subdirs {
            if self.exclusions.contains(&name) || self.matcher.is_ignored(&path, true) {
                continue;
            }
            if store.lookup(&name).is_some() {
                continue;
            }

            let extensions = self.scan_extensions(&path);
            if store.upsert_if_absent(&name, DirRule::default().with_extensions(extensions)) {
                log::debug!("Discovered rule for {}", name);
                report.added.push(name);
            }
        }

        Ok(report)
    }

    /// Union of extensions under `start`, skipping ignored entries.
    /// Unreadable subpaths contribute nothing.
    fn scan_extensions(&self, start: &Path) -> BTreeSet<String> {
        let matcher = self.matcher.clone();
        let exclusions = self.exclusions.clone();

        let walker = WalkBuilder::new(start)
            .standard_filters(false)
            .follow_links(false)
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                let name = entry.file_name().to_string_lossy();
                if is_dir && name == Exclusions::GIT_DIR {
                    return false;
                }
                if !is_dir && exclusions.contains(&name) {
                    return false;
                }
                !matcher.is_ignored(entry.path(), is_dir)
            })
            .build();

        let mut extensions = BTreeSet::new();
        for result in walker {
            match result {
                Ok(entry) => {
                    if entry.file_type().is_some_and(|t| t.is_dir()) {
                        continue;
                    }
                    if let Some(ext) = entry.file_name().to_str().and_then(file_extension) {
                        extensions.insert(ext);
                    }
                }
                Err(err) => log::debug!("Skipping unreadable path during discovery: {}", err),
            }
        }
        extensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn exts(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn discover(root: &Path, store: &mut RuleStore) -> DiscoveryReport {
        Discovery::new(root, Exclusions::new(["codetext.toml", "codebase.txt"]))
            .run(store)
            .unwrap()
    }

    #[test]
    fn test_fresh_discovery_builds_root_and_top_level_rules() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "main.go", "package main");
        write(dir.path(), "README.MD", "# hi");
        write(dir.path(), "frontend/app.ts", "x");
        write(dir.path(), "frontend/deep/nested/style.css", "x");
        write(dir.path(), "api/api.go", "package api");

        let mut store = RuleStore::new();
        let report = discover(dir.path(), &mut store);

        assert!(report.root_filled);
        assert_eq!(report.added, vec!["api".to_string(), "frontend".to_string()]);
        assert_eq!(
            store.root().unwrap().extensions,
            exts(&["css", "go", "md", "ts"])
        );
        assert_eq!(store.lookup("frontend").unwrap().extensions, exts(&["css", "ts"]));
        assert_eq!(store.lookup("api").unwrap().extensions, exts(&["go"]));
        // rule granularity stops at depth one
        assert!(store.lookup("frontend/deep").is_none());
    }

    #[test]
    fn test_ignored_and_git_dirs_get_no_rule() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".gitignore", "node_modules/\n*.log\n");
        write(dir.path(), "node_modules/pkg/index.js", "x");
        write(dir.path(), ".git/config", "[core]");
        write(dir.path(), "src/lib.rs", "x");
        write(dir.path(), "src/debug.log", "x");

        let mut store = RuleStore::new();
        discover(dir.path(), &mut store);

        assert!(store.lookup("node_modules").is_none());
        assert!(store.lookup(".git").is_none());
        assert_eq!(store.lookup("src").unwrap().extensions, exts(&["rs"]));
        let root = &store.root().unwrap().extensions;
        assert!(!root.contains("js"));
        assert!(!root.contains("log"));
    }

    #[test]
    fn test_existing_rules_are_not_overwritten() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "main.go", "x");
        write(dir.path(), "web/app.ts", "x");
        write(dir.path(), "web/app.js", "x");

        let mut store = RuleStore::new();
        store.insert(".", DirRule::default().with_extensions(["md"]));
        store.insert("web", DirRule::disabled());

        let report = discover(dir.path(), &mut store);

        assert!(!report.root_filled);
        assert!(report.added.is_empty());
        assert_eq!(store.root().unwrap().extensions, exts(&["md"]));
        assert!(!store.lookup("web").unwrap().enabled);
    }

    #[test]
    fn test_empty_root_rule_is_filled_but_keeps_other_fields() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "main.go", "x");

        let mut store = RuleStore::new();
        store.insert(".", DirRule::default().with_include([".env.example"]));

        discover(dir.path(), &mut store);

        let root = store.root().unwrap();
        assert_eq!(root.extensions, exts(&["go"]));
        assert_eq!(root.include, vec![".env.example".to_string()]);
    }

    #[test]
    fn test_dotfiles_and_own_files_contribute_no_extension() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".env", "A=1");
        write(dir.path(), "Makefile", "all:");
        write(dir.path(), "codebase.txt", "old output");

        let mut store = RuleStore::new();
        discover(dir.path(), &mut store);

        assert!(store.root().unwrap().extensions.is_empty());
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let mut store = RuleStore::new();
        assert!(Discovery::new(missing, Exclusions::default())
            .run(&mut store)
            .is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        write(dir.path(), "api/main.go", "package api");
        write(dir.path(), "api/locked/secret.rs", "fn main() {}");
        write(dir.path(), "web/app.ts", "x");

        let locked = dir.path().join("api/locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        let denied = fs::read_dir(&locked).is_err();

        let mut store = RuleStore::new();
        let result = Discovery::new(dir.path(), Exclusions::default()).run(&mut store);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let report = result.unwrap();
        assert_eq!(report.added, vec!["api".to_string(), "web".to_string()]);
        assert!(store.lookup("api").unwrap().extensions.contains("go"));
        assert_eq!(store.lookup("web").unwrap().extensions, exts(&["ts"]));
        // running as root can still list the directory
        if denied {
            assert_eq!(store.lookup("api").unwrap().extensions, exts(&["go"]));
            assert!(!store.root().unwrap().extensions.contains("rs"));
        }
    }
}
