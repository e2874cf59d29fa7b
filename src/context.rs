use std::path::{Path, PathBuf};
use tracing::debug;

/// Surface syntax of a project configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    JsonLike,
    StructuredText,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => ConfigFormat::StructuredText,
            _ => ConfigFormat::JsonLike,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ConfigFormat::JsonLike => "json-like",
            ConfigFormat::StructuredText => "structured-text",
        }
    }
}

/// What the working directory looks like at process start.
/// Built once by [`detect`] and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub is_existing_project: bool,
    pub config_path: Option<PathBuf>,
    pub config_format: Option<ConfigFormat>,
    pub entry_file: Option<PathBuf>,
}

/// Recognized configuration file base names, JSON-like forms first.
const CONFIG_CANDIDATES: &[&str] = &["wrangler.jsonc", "wrangler.json", "wrangler.toml"];

/// Entry file candidates, checked in order of confidence.
const ENTRY_CANDIDATES: &[&str] = &[
    "src/index.ts",
    "src/index.js",
    "src/worker.ts",
    "src/worker.js",
];

/// Find the project configuration document under `dir`, preferring the
/// JSON-like forms over the structured-text one.
pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
    for name in CONFIG_CANDIDATES {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Inspect `dir` for project markers and build the context descriptor.
pub fn detect(dir: &Path) -> ProjectContext {
    let config_path = find_config_file(dir);
    let config_format = config_path.as_deref().map(ConfigFormat::from_path);

    let entry_file = ENTRY_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file());

    let is_existing_project = config_path.is_some();
    debug!(
        "Project context: existing={}, config={:?}, entry={:?}",
        is_existing_project, config_path, entry_file
    );

    ProjectContext {
        is_existing_project,
        config_path,
        config_format,
        entry_file,
    }
}
