//! Generic lifecycle orchestrator for both the new-project and the
//! add-to-existing-project paths. One implementation drives every
//! primitive; the per-step semantics are:
//! selection/prompt cancellation is a graceful exit, scaffolding and
//! patching failures are fatal with no rollback, pre-deploy failures are
//! warnings, and a failed deployment falls back to local-dev instructions.

use anyhow::{bail, Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;
use tracing::{info, warn};

use crate::context::{self, ProjectContext};
use crate::prompt::Prompter;
use crate::registry::{FlowKind, Primitive, PrimitiveConfig, Registry};
use crate::tools::ToolRunner;

/// How a flow run ended. Cancellation is not an error: the caller exits 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    Completed,
    Cancelled,
}

pub struct Flow<'a> {
    registry: &'a Registry,
    prompter: &'a dyn Prompter,
    tools: &'a dyn ToolRunner,
}

impl<'a> Flow<'a> {
    pub fn new(
        registry: &'a Registry,
        prompter: &'a dyn Prompter,
        tools: &'a dyn ToolRunner,
    ) -> Self {
        Self {
            registry,
            prompter,
            tools,
        }
    }

    /// Step 1: pick a primitive, either forced by id or interactively from
    /// the capability-filtered list.
    fn select_primitive(
        &self,
        kind: FlowKind,
        forced_id: Option<&str>,
    ) -> Result<Option<&dyn Primitive>> {
        if let Some(id) = forced_id {
            let primitive = self
                .registry
                .get(id)
                .with_context(|| format!("Unknown primitive '{}'", id))?;
            return Ok(Some(primitive));
        }

        let candidates = self.registry.list(kind);
        if candidates.is_empty() {
            info!("No primitives available for this project");
            return Ok(None);
        }
        let items: Vec<String> = candidates
            .iter()
            .map(|p| format!("{}: {}", p.info().name, p.info().description))
            .collect();
        match self
            .prompter
            .select("What would you like to set up?", &items)?
        {
            Some(index) => Ok(Some(candidates[index])),
            None => Ok(None),
        }
    }

    /// Scaffold a fresh project under `parent` and wire the primitive in.
    pub fn run_new(&self, parent: &Path, forced_id: Option<&str>) -> Result<FlowOutcome> {
        let primitive = match self.select_primitive(FlowKind::New, forced_id)? {
            Some(primitive) => primitive,
            None => return Ok(FlowOutcome::Cancelled),
        };
        if !primitive.info().supports_new_project {
            bail!(
                "Primitive '{}' cannot scaffold a new project",
                primitive.info().id
            );
        }

        let config = match primitive.prompt_new(self.prompter)? {
            Some(config) => config,
            None => return Ok(FlowOutcome::Cancelled),
        };
        let project_name = config
            .project_name()
            .context("Primitive returned no project name for the new-project path")?
            .to_string();

        // Fatal on non-zero exit; a partially scaffolded tree is left as-is.
        let project_dir = self.tools.scaffold(parent, &project_name)?;

        let config_path = context::find_config_file(&project_dir).with_context(|| {
            format!(
                "No configuration file found in scaffolded project {}",
                project_dir.display()
            )
        })?;

        self.configure(&project_dir, &config_path, FlowKind::New, primitive, &config)
    }

    /// Add the primitive to the already-detected project in `dir`.
    pub fn run_existing(
        &self,
        dir: &Path,
        ctx: &ProjectContext,
        forced_id: Option<&str>,
    ) -> Result<FlowOutcome> {
        let primitive = match self.select_primitive(FlowKind::Existing, forced_id)? {
            Some(primitive) => primitive,
            None => return Ok(FlowOutcome::Cancelled),
        };
        if !primitive.info().supports_existing {
            bail!(
                "Primitive '{}' cannot be added to an existing project",
                primitive.info().id
            );
        }
        // Wiring bug, not user error: supports_existing demands the prompt
        // capability.
        if !primitive.capabilities().prompt_existing {
            bail!(
                "Primitive '{}' is misconfigured: supports existing projects but has no existing-project prompt",
                primitive.info().id
            );
        }

        let config = match primitive.prompt_existing(self.prompter, ctx)? {
            Some(config) => config,
            None => return Ok(FlowOutcome::Cancelled),
        };

        let config_path = ctx
            .config_path
            .clone()
            .context("Project context has no configuration file")?;

        self.configure(dir, &config_path, FlowKind::Existing, primitive, &config)
    }

    /// Steps 5-8: patch, generate, and optionally deploy.
    fn configure(
        &self,
        dir: &Path,
        config_path: &Path,
        kind: FlowKind,
        primitive: &dyn Primitive,
        config: &PrimitiveConfig,
    ) -> Result<FlowOutcome> {
        if primitive.capabilities().patch_config
            && !primitive.patch_config(config_path, config)
        {
            bail!("Failed to update {}", config_path.display());
        }

        primitive.generate_files(dir, kind, config)?;
        info!("Generated project files in {}", dir.display());

        let deploy = match self.prompter.confirm("Deploy now?", true)? {
            Some(choice) => choice,
            None => return Ok(FlowOutcome::Cancelled),
        };
        if !deploy {
            print_local_dev(dir);
            return Ok(FlowOutcome::Completed);
        }

        if primitive.capabilities().pre_deploy {
            if let Err(e) = primitive.pre_deploy(dir, config, self.tools) {
                warn!(
                    "Pre-deploy step failed, continuing (the resource may already exist): {:#}",
                    e
                );
            }
        }

        match self.tools.deploy(dir) {
            Ok(()) => {
                if primitive.capabilities().deployment_info {
                    if let Some(details) = primitive.deployment_info(config) {
                        println!("\n{}", details.message.green().bold());
                        for (i, step) in details.next_steps.iter().enumerate() {
                            println!("  {}. {}", i + 1, step);
                        }
                    }
                } else {
                    println!("\n{}", "Deployed".green().bold());
                }
            }
            Err(e) => {
                // Deploy didn't happen, but setup did: not a flow failure.
                warn!("Deployment failed: {:#}", e);
                print_local_dev(dir);
            }
        }
        Ok(FlowOutcome::Completed)
    }
}

fn print_local_dev(dir: &Path) {
    println!("\n{}", "To develop locally:".bold());
    if dir != Path::new(".") {
        println!("  cd {}", dir.display());
    }
    println!("  npx wrangler dev");
}
