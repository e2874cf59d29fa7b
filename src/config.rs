use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Tool-level configuration, loaded from `edgekit.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolConfig {
    #[serde(default)]
    pub defaults: BatchDefaults,
    #[serde(default)]
    pub tools: ToolCommands,
}

/// Default consumer batch settings applied when the user does not override
/// them per queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchDefaults {
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: u32,
    #[serde(default = "default_max_batch_timeout")]
    pub max_batch_timeout_seconds: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Names of the external commands the tool shells out to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCommands {
    /// Package manager used for `create` scaffolding (default: "npm")
    #[serde(default = "default_package_manager")]
    pub package_manager: String,

    /// Package runner used for wrangler invocations (default: "npx")
    #[serde(default = "default_runner")]
    pub runner: String,

    /// Template passed to the scaffolding tool (default: "hello-world")
    #[serde(default = "default_scaffold_template")]
    pub scaffold_template: String,
}

impl Default for BatchDefaults {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            max_batch_timeout_seconds: default_max_batch_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for ToolCommands {
    fn default() -> Self {
        Self {
            package_manager: default_package_manager(),
            runner: default_runner(),
            scaffold_template: default_scaffold_template(),
        }
    }
}

fn default_max_batch_size() -> u32 {
    4
}

fn default_max_batch_timeout() -> u32 {
    3
}

fn default_max_retries() -> u32 {
    3
}

fn default_package_manager() -> String {
    "npm".to_string()
}

fn default_runner() -> String {
    "npx".to_string()
}

fn default_scaffold_template() -> String {
    "hello-world".to_string()
}

impl ToolConfig {
    /// Load configuration from a specific path, or use default search paths
    pub fn load_with_path(path: Option<String>) -> Result<Self> {
        // If explicit path provided, use it
        if let Some(config_path) = path {
            debug!("Loading config from explicit path: {}", config_path);
            return Self::load_from_path(&config_path);
        }

        // Try the working directory first (per-project config)
        if let Ok(config) = Self::load_from_path("edgekit.toml") {
            debug!("Loaded config from ./edgekit.toml");
            return Ok(config);
        }

        // Try user config directory
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("edgekit").join("config.toml");
            if let Ok(config) = Self::load_from_path(&config_path) {
                debug!("Loaded config from {:?}", config_path);
                return Ok(config);
            }
        }

        // Return defaults
        debug!("Using default config");
        Ok(Self::default())
    }

    fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ToolConfig = toml::from_str(&content)?;
        Ok(config)
    }
}
