use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Paths resolved from the CLI and config layers for one run.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub root: PathBuf,
    pub config_file: PathBuf,
    pub output_file: PathBuf,
}

impl RuntimeConfig {
    /// The tool's own files never end up in the output.
    pub fn exclusions(&self) -> Exclusions {
        let names = [&self.config_file, &self.output_file]
            .into_iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned());
        Exclusions::new(names)
    }
}

/// Key used for the project root in the rule store.
pub const ROOT_KEY: &str = ".";

/// Filtering policy for one directory and, by inheritance, its subtree.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DirRule {
    pub enabled: bool,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub extensions: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub exclude_extensions: BTreeSet<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl Default for DirRule {
    fn default() -> Self {
        Self {
            enabled: true,
            extensions: BTreeSet::new(),
            exclude_extensions: BTreeSet::new(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

impl DirRule {
    /// A rule that switches its whole subtree off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .filter_map(|e| normalize_extension(e.as_ref()))
            .collect();
        self
    }

    pub fn with_exclude_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude_extensions = extensions
            .into_iter()
            .filter_map(|e| normalize_extension(e.as_ref()))
            .collect();
        self
    }

    pub fn with_include<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Canonicalises extension entries written by hand (".EXE" -> "exe").
    fn normalized(mut self) -> Self {
        self.extensions = std::mem::take(&mut self.extensions)
            .into_iter()
            .filter_map(|e| normalize_extension(&e))
            .collect();
        self.exclude_extensions = std::mem::take(&mut self.exclude_extensions)
            .into_iter()
            .filter_map(|e| normalize_extension(&e))
            .collect();
        self
    }
}

/// Strips a leading dot and lower-cases; blank entries are dropped.
pub fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Mapping from a root-relative directory path to its rule.
///
/// Lookups are exact; inheritance is resolved by the walker, not here.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(from = "BTreeMap<String, DirRule>", into = "BTreeMap<String, DirRule>")]
pub struct RuleStore {
    rules: BTreeMap<String, DirRule>,
}

impl From<BTreeMap<String, DirRule>> for RuleStore {
    fn from(raw: BTreeMap<String, DirRule>) -> Self {
        let mut store = RuleStore::default();
        for (key, rule) in raw {
            store.insert(&key, rule);
        }
        store
    }
}

impl From<RuleStore> for BTreeMap<String, DirRule> {
    fn from(store: RuleStore) -> Self {
        store.rules
    }
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, path: &str) -> Option<&DirRule> {
        self.rules.get(path)
    }

    /// Inserts only when the key is missing. Returns whether it was inserted.
    pub fn upsert_if_absent(&mut self, path: &str, rule: DirRule) -> bool {
        match self.rules.entry(canonical_key(path)) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(rule.normalized());
                true
            }
        }
    }

    /// Unconditional insert, replacing any previous rule for the key.
    pub fn insert(&mut self, path: &str, rule: DirRule) {
        self.rules.insert(canonical_key(path), rule.normalized());
    }

    pub fn root(&self) -> Option<&DirRule> {
        self.lookup(ROOT_KEY)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DirRule)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Canonical spelling of a store key: forward slashes, no "./" prefix,
/// no trailing slash, and "." for the root.
pub fn canonical_key(raw: &str) -> String {
    let slashed = raw.trim().replace('\\', "/");
    let mut key = slashed.as_str();
    while let Some(rest) = key.strip_prefix("./") {
        key = rest;
    }
    let key = key.trim_end_matches('/');
    if key.is_empty() || key == ROOT_KEY {
        ROOT_KEY.to_string()
    } else {
        key.to_string()
    }
}

/// Names skipped unconditionally, before any rule is consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusions {
    names: BTreeSet<String>,
}

impl Default for Exclusions {
    fn default() -> Self {
        Self::new(Vec::<String>::new())
    }
}

impl Exclusions {
    pub const GIT_DIR: &'static str = ".git";

    /// `.git` is always part of the list.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        set.insert(Self::GIT_DIR.to_string());
        Self { names: set }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// A single file selected by the walk, ready for emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Root-relative path with forward slashes.
    pub relative_path: String,
    pub content: Vec<u8>,
}

/// Counters collected during one walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub files_emitted: usize,
    pub bytes_emitted: u64,
    pub binary_skipped: usize,
    pub unreadable_skipped: usize,
}
