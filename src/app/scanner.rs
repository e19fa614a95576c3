use crate::app::content::{file_extension, is_binary};
use crate::app::formatter::OutputGenerator;
use crate::app::ignore_matcher::IgnoreMatcher;
use crate::app::models::{DirRule, Exclusions, FileRecord, RuleStore, WalkSummary, ROOT_KEY};
use crate::app::patterns::PatternSet;
use pathdiff::diff_paths;
use std::collections::HashMap;
use std::fs::{self, DirEntry};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures that abort a walk. Everything else is skipped silently.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Failed to list directory {}: {source}", .path.display())]
    ListDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write output: {0}")]
    Write(#[from] io::Error),
}

/// A rule with its patterns compiled for matching.
struct ActiveRule {
    rule: DirRule,
    include: PatternSet,
    exclude: PatternSet,
}

impl ActiveRule {
    fn compile(rule: &DirRule) -> Self {
        Self {
            rule: rule.clone(),
            include: PatternSet::new(&rule.include),
            exclude: PatternSet::new(&rule.exclude),
        }
    }

    fn allows_extension(&self, name: &str) -> bool {
        let ext = file_extension(name);
        if let Some(ext) = &ext {
            if self.rule.exclude_extensions.contains(ext) {
                return false;
            }
        }
        if self.rule.extensions.is_empty() {
            return true;
        }
        ext.is_some_and(|ext| self.rule.extensions.contains(&ext))
    }
}

/// One directory on the walk stack: its children not yet visited and the
/// rule governing them.
struct Frame<'s> {
    rule: &'s ActiveRule,
    children: std::vec::IntoIter<DirEntry>,
}

/// Depth-first walk over the project applying the rule store.
///
/// Traversal order is by file name within each directory, so two walks over
/// the same tree produce the same records.
pub struct Scanner<'a> {
    root: PathBuf,
    store: &'a RuleStore,
    compiled: HashMap<String, ActiveRule>,
    fallback: ActiveRule,
    matcher: IgnoreMatcher,
    exclusions: Exclusions,
}

impl<'a> Scanner<'a> {
    pub fn new(root: impl Into<PathBuf>, store: &'a RuleStore, exclusions: Exclusions) -> Self {
        let root = root.into();
        let matcher = IgnoreMatcher::new(&root);
        let compiled = store
            .iter()
            .map(|(key, rule)| (key.to_string(), ActiveRule::compile(rule)))
            .collect();

        Self {
            root,
            store,
            compiled,
            fallback: ActiveRule::compile(&DirRule::default()),
            matcher,
            exclusions,
        }
    }

    /// Walks the tree, handing each selected text file to `emit` in order.
    pub fn scan<F>(&self, mut emit: F) -> Result<WalkSummary, ScanError>
    where
        F: FnMut(FileRecord) -> io::Result<()>,
    {
        let mut summary = WalkSummary::default();
        let mut stack: Vec<Frame<'_>> = Vec::new();

        if let Some(frame) = self.enter(&self.root, ROOT_KEY, &self.fallback)? {
            stack.push(frame);
        }

        while let Some(frame) = stack.last_mut() {
            let Some(entry) = frame.children.next() else {
                stack.pop();
                continue;
            };
            let rule = frame.rule;

            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(relative) = self.relative(&path) else {
                continue;
            };

            if self.exclusions.contains(&name) {
                continue;
            }
            if rule.exclude.matches(&name, &relative) {
                log::debug!("Excluded by pattern: {}", relative);
                continue;
            }
            let forced = rule.include.matches(&name, &relative);

            let Ok(file_type) = entry.file_type() else {
                summary.unreadable_skipped += 1;
                continue;
            };

            if file_type.is_dir() {
                if self.store.lookup(&relative).is_some_and(|r| !r.enabled) {
                    log::debug!("Disabled directory: {}", relative);
                    continue;
                }
                if !forced && self.matcher.is_ignored(&path, true) {
                    continue;
                }
                if let Some(child) = self.enter(&path, &relative, rule)? {
                    stack.push(child);
                }
                continue;
            }

            if !forced {
                if self.matcher.is_ignored(&path, false) {
                    continue;
                }
                if !rule.allows_extension(&name) {
                    continue;
                }
            }

            match read_text(&path) {
                Ok(Some(content)) => {
                    summary.files_emitted += 1;
                    summary.bytes_emitted += content.len() as u64;
                    log::debug!("Added: {}", relative);
                    emit(FileRecord {
                        relative_path: relative,
                        content,
                    })?;
                }
                Ok(None) => summary.binary_skipped += 1,
                Err(err) => {
                    log::warn!("⚠️ Skipping {}: {}", relative, err);
                    summary.unreadable_skipped += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Writes every record in the emission format, flushing after each one.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<WalkSummary, ScanError> {
        self.scan(|record| {
            OutputGenerator::write_record(&mut *writer, &record)?;
            writer.flush()
        })
    }

    /// Resolves the rule for a directory and lists its children.
    /// Returns `None` when the resolved rule disables the subtree.
    fn enter<'s>(
        &'s self,
        dir: &Path,
        relative: &str,
        inherited: &'s ActiveRule,
    ) -> Result<Option<Frame<'s>>, ScanError> {
        let rule = self.compiled.get(relative).unwrap_or(inherited);
        if !rule.rule.enabled {
            return Ok(None);
        }

        let list_err = |source: io::Error| ScanError::ListDir {
            path: dir.to_path_buf(),
            source,
        };
        let mut children = fs::read_dir(dir)
            .map_err(list_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(list_err)?;
        children.sort_by_key(|entry| entry.file_name());

        Ok(Some(Frame {
            rule,
            children: children.into_iter(),
        }))
    }

    /// Root-relative path with forward slashes.
    fn relative(&self, path: &Path) -> Option<String> {
        let rel = diff_paths(path, &self.root)?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }
}

/// `Ok(None)` for binary files.
fn read_text(path: &Path) -> io::Result<Option<Vec<u8>>> {
    if is_binary(path)? {
        return Ok(None);
    }
    fs::read(path).map(Some)
}
