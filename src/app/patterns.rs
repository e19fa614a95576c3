use crate::app::models::canonical_key;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// A compiled list of include or exclude patterns.
///
/// An entry matches when the pattern globs the bare name, globs the
/// root-relative path, or equals the relative path verbatim.
#[derive(Debug, Clone)]
pub struct PatternSet {
    globs: GlobSet,
    literals: Vec<String>,
}

impl Default for PatternSet {
    fn default() -> Self {
        Self {
            globs: GlobSet::empty(),
            literals: Vec::new(),
        }
    }
}

impl PatternSet {
    pub fn new(patterns: &[String]) -> Self {
        let mut builder = GlobSetBuilder::new();
        let mut literals = Vec::with_capacity(patterns.len());

        for pat in patterns {
            // "./vendor/" and "vendor" name the same path
            literals.push(canonical_key(pat));
            match GlobBuilder::new(pat).literal_separator(true).build() {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => log::warn!("⚠️ Invalid glob pattern {:?}, matching it literally: {}", pat, e),
            }
        }

        let globs = builder.build().unwrap_or_else(|e| {
            log::warn!("⚠️ Could not compile pattern set {:?}: {}", patterns, e);
            GlobSet::empty()
        });

        Self { globs, literals }
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn matches(&self, name: &str, relative_path: &str) -> bool {
        if self.is_empty() {
            return false;
        }
        self.globs.is_match(name)
            || self.globs.is_match(relative_path)
            || self.literals.iter().any(|lit| lit == relative_path)
    }
}
