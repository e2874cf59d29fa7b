//! External tool collaborators: project scaffolding and deployment.
//! Both are child processes signalling success via exit code.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use crate::config::ToolCommands;

/// Boundary to the external scaffolding and deploy tools.
pub trait ToolRunner {
    /// Create a base project tree named `project_name` under `parent`.
    /// Returns the project directory. Non-zero exit is fatal to the flow.
    fn scaffold(&self, parent: &Path, project_name: &str) -> Result<PathBuf>;

    /// Create the named remote queue. "Already exists" surfaces as an
    /// error here; the caller treats pre-deploy failures as warnings.
    fn create_queue(&self, dir: &Path, queue_name: &str) -> Result<()>;

    /// Build and publish the project in `dir`.
    fn deploy(&self, dir: &Path) -> Result<()>;
}

/// Shells out to the configured package manager and runner with inherited
/// stdio, so the child tools keep their own interactive output.
pub struct CommandTools {
    commands: ToolCommands,
}

impl CommandTools {
    pub fn new(commands: ToolCommands) -> Self {
        Self { commands }
    }
}

impl ToolRunner for CommandTools {
    fn scaffold(&self, parent: &Path, project_name: &str) -> Result<PathBuf> {
        info!("Scaffolding base project: {}", project_name);
        let status = Command::new(&self.commands.package_manager)
            .args(["create", "cloudflare@latest", project_name, "--"])
            .arg(format!("--template={}", self.commands.scaffold_template))
            .args(["--no-deploy", "--git=false"])
            .current_dir(parent)
            .status()
            .with_context(|| {
                format!(
                    "Failed to run {} (is it installed?)",
                    self.commands.package_manager
                )
            })?;
        if !status.success() {
            bail!("Project scaffolding exited with {}", status);
        }
        Ok(parent.join(project_name))
    }

    fn create_queue(&self, dir: &Path, queue_name: &str) -> Result<()> {
        info!("Creating queue: {}", queue_name);
        let status = Command::new(&self.commands.runner)
            .args(["wrangler", "queues", "create", queue_name])
            .current_dir(dir)
            .status()
            .with_context(|| format!("Failed to run {}", self.commands.runner))?;
        if !status.success() {
            bail!("wrangler queues create exited with {}", status);
        }
        Ok(())
    }

    fn deploy(&self, dir: &Path) -> Result<()> {
        info!("Deploying project in {}", dir.display());
        let status = Command::new(&self.commands.runner)
            .args(["wrangler", "deploy"])
            .current_dir(dir)
            .status()
            .with_context(|| format!("Failed to run {}", self.commands.runner))?;
        if !status.success() {
            bail!("wrangler deploy exited with {}", status);
        }
        Ok(())
    }
}

/// Dry-run tools: scaffold a minimal project skeleton on disk and log the
/// remote operations instead of performing them. Drives `--dry-run` and
/// the integration tests.
pub struct DryRunTools;

impl ToolRunner for DryRunTools {
    fn scaffold(&self, parent: &Path, project_name: &str) -> Result<PathBuf> {
        let dir = parent.join(project_name);
        if dir.exists() {
            bail!("Directory already exists: {}", dir.display());
        }
        fs::create_dir_all(dir.join("src")).context("Failed to create project directory")?;
        fs::write(
            dir.join("wrangler.jsonc"),
            format!(
                "{{\n  // Generated by edgekit --dry-run\n  \"name\": \"{}\",\n  \"main\": \"src/index.ts\"\n}}\n",
                project_name
            ),
        )?;
        fs::write(dir.join("src/index.ts"), "export default {};\n")?;
        info!("[dry-run] scaffolded {}", dir.display());
        Ok(dir)
    }

    fn create_queue(&self, dir: &Path, queue_name: &str) -> Result<()> {
        debug!("[dry-run] would create queue {} in {}", queue_name, dir.display());
        Ok(())
    }

    fn deploy(&self, dir: &Path) -> Result<()> {
        debug!("[dry-run] would deploy {}", dir.display());
        Ok(())
    }
}
