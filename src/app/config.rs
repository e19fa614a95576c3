use crate::app::models::{DirRule, RuleStore, RuntimeConfig, ROOT_KEY};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "codetext.toml";
pub const DEFAULT_OUTPUT_FILE: &str = "codebase.txt";

/// Extensions blocked at the root of a freshly initialised project.
const DEFAULT_EXCLUDE_EXTENSIONS: &[&str] = &["exe", "dll", "so", "test", "jpg", "png", "gif", "sum"];
/// Force-included at the root: `docs` is walked even when gitignored.
const DEFAULT_INCLUDE: &[&str] = &[".env.example", "docs"];

/// Contents of the per-project `codetext.toml`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    #[serde(default)]
    pub dirs: RuleStore,
}

impl ProjectConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config at {}", path.display()))
    }

    /// Starting point for `init`: output name and root rule from the user
    /// defaults, with an empty extension list for discovery to fill.
    pub fn seeded(defaults: &UserDefaults) -> Self {
        let mut dirs = RuleStore::new();
        dirs.insert(ROOT_KEY, defaults.root_rule());
        Self {
            output_file: defaults.output_file.clone(),
            dirs,
        }
    }
}

/// Optional `~/.config/codetext/defaults.toml`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDefaults {
    pub output_file: Option<String>,
    pub root: Option<DirRule>,
}

impl UserDefaults {
    fn root_rule(&self) -> DirRule {
        self.root.clone().unwrap_or_else(|| {
            DirRule::default()
                .with_include(DEFAULT_INCLUDE.iter().copied())
                .with_exclude_extensions(DEFAULT_EXCLUDE_EXTENSIONS)
        })
    }
}

fn user_defaults_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".config").join("codetext").join("defaults.toml"))
}

/// Loads the user defaults; a missing file or home directory means built-ins.
pub fn load_user_defaults() -> Result<UserDefaults> {
    match user_defaults_path() {
        Some(path) => load_user_defaults_from(&path),
        None => {
            log::debug!("No home directory; using built-in defaults");
            Ok(UserDefaults::default())
        }
    }
}

pub fn load_user_defaults_from(path: &Path) -> Result<UserDefaults> {
    if !path.exists() {
        return Ok(UserDefaults::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read defaults at {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Project root: the given directory or the current one, made absolute.
pub fn resolve_root(dir: Option<&Path>) -> Result<PathBuf> {
    let base = match dir {
        Some(d) => d.to_path_buf(),
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    fs::canonicalize(&base).with_context(|| format!("Project root {} not found", base.display()))
}

/// Output resolution: CLI flag > project file > user defaults > built-in.
/// Relative paths hang off the project root.
pub fn resolve_config(
    root: PathBuf,
    config_name: &str,
    project: Option<&ProjectConfig>,
    defaults: &UserDefaults,
    output_override: Option<&Path>,
) -> RuntimeConfig {
    let output = output_override
        .map(Path::to_path_buf)
        .or_else(|| project.and_then(|p| p.output_file.as_deref()).map(PathBuf::from))
        .or_else(|| defaults.output_file.as_deref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE));

    RuntimeConfig {
        config_file: root.join(config_name),
        output_file: root.join(output),
        root,
    }
}
