//! The queue primitive: a queue-backed messaging feature with a companion
//! event store and live dashboard.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use tracing::{error, warn};

use crate::config::BatchDefaults;
use crate::context::ProjectContext;
use crate::patcher::{self, QueuePatch};
use crate::prompt::Prompter;
use crate::registry::{
    Capabilities, DeploymentInfo, FlowKind, Primitive, PrimitiveConfig, PrimitiveInfo,
    QueueFeatureConfig,
};
use crate::templates;
use crate::tools::ToolRunner;
use crate::util::{
    binding_from_queue, validate_binding_name, validate_project_name, validate_queue_name,
};

const INFO: PrimitiveInfo = PrimitiveInfo {
    id: "queues",
    name: "Queue",
    description: "Queue-backed messaging with an event store and live dashboard",
    supports_new_project: true,
    supports_existing: true,
};

pub struct QueuePrimitive {
    defaults: BatchDefaults,
}

impl QueuePrimitive {
    pub fn new(defaults: BatchDefaults) -> Self {
        Self { defaults }
    }

    /// Shared tail of both prompt paths: queue name, then a binding name
    /// derived from it as the default.
    fn prompt_queue(
        &self,
        prompter: &dyn Prompter,
        project_name: Option<String>,
        default_queue: &str,
    ) -> Result<Option<PrimitiveConfig>> {
        let queue_name = match prompter.input(
            "Queue name",
            Some(default_queue),
            Some(&validate_queue_name),
        )? {
            Some(name) => name,
            None => return Ok(None),
        };

        let default_binding = binding_from_queue(&queue_name);
        let binding_name = match prompter.input(
            "Binding name",
            Some(&default_binding),
            Some(&validate_binding_name),
        )? {
            Some(name) => name,
            None => return Ok(None),
        };

        Ok(Some(PrimitiveConfig::Queue(QueueFeatureConfig {
            project_name,
            queue_name,
            binding_name,
            max_batch_size: self.defaults.max_batch_size,
            max_batch_timeout_seconds: self.defaults.max_batch_timeout_seconds,
            max_retries: self.defaults.max_retries,
        })))
    }
}

fn queue_config(config: &PrimitiveConfig) -> Result<&QueueFeatureConfig> {
    match config {
        PrimitiveConfig::Queue(cfg) => Ok(cfg),
        other => bail!("Queue primitive handed a foreign config: {:?}", other),
    }
}

/// Write `content` to `dir/relative`, honoring the per-artifact overwrite
/// policy: in an existing project a pre-existing file is skipped with a
/// warning unless `overwrite` is set.
fn write_artifact(
    dir: &Path,
    relative: &str,
    content: &str,
    kind: FlowKind,
    overwrite: bool,
) -> Result<()> {
    let path = dir.join(relative);
    if kind == FlowKind::Existing && !overwrite && path.exists() {
        warn!("{} already exists, skipping", relative);
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

impl Primitive for QueuePrimitive {
    fn info(&self) -> &PrimitiveInfo {
        &INFO
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            prompt_existing: true,
            patch_config: true,
            pre_deploy: true,
            deployment_info: true,
        }
    }

    fn prompt_new(&self, prompter: &dyn Prompter) -> Result<Option<PrimitiveConfig>> {
        let project_name = match prompter.input(
            "Project name",
            Some("queue-worker"),
            Some(&validate_project_name),
        )? {
            Some(name) => name,
            None => return Ok(None),
        };
        let default_queue = format!("{}-queue", project_name);
        self.prompt_queue(prompter, Some(project_name), &default_queue)
    }

    fn prompt_existing(
        &self,
        prompter: &dyn Prompter,
        _ctx: &ProjectContext,
    ) -> Result<Option<PrimitiveConfig>> {
        self.prompt_queue(prompter, None, "my-queue")
    }

    fn patch_config(&self, config_path: &Path, config: &PrimitiveConfig) -> bool {
        let cfg = match queue_config(config) {
            Ok(cfg) => cfg,
            Err(e) => {
                error!("{}", e);
                return false;
            }
        };
        let patch = QueuePatch {
            queue_name: cfg.queue_name.clone(),
            binding_name: cfg.binding_name.clone(),
            max_batch_size: cfg.max_batch_size,
            max_batch_timeout_seconds: cfg.max_batch_timeout_seconds,
            max_retries: cfg.max_retries,
        };
        patcher::patch(config_path, &patch)
    }

    fn generate_files(
        &self,
        target_dir: &Path,
        kind: FlowKind,
        config: &PrimitiveConfig,
    ) -> Result<()> {
        let cfg = queue_config(config)?;

        // The entry file is never overwritten in an existing project; the
        // consumer file is reference-only and always refreshed.
        write_artifact(
            target_dir,
            "src/index.ts",
            &templates::worker_entry(&cfg.queue_name, &cfg.binding_name),
            kind,
            false,
        )?;
        write_artifact(
            target_dir,
            "src/consumer.ts",
            &templates::consumer_reference(&cfg.queue_name),
            kind,
            true,
        )?;
        write_artifact(
            target_dir,
            "src/event-store.ts",
            &templates::event_store_source(),
            kind,
            false,
        )?;
        write_artifact(
            target_dir,
            "src/dashboard.html",
            &templates::dashboard_html(&cfg.queue_name),
            kind,
            false,
        )?;
        Ok(())
    }

    fn pre_deploy(
        &self,
        target_dir: &Path,
        config: &PrimitiveConfig,
        tools: &dyn ToolRunner,
    ) -> Result<()> {
        let cfg = queue_config(config)?;
        tools.create_queue(target_dir, &cfg.queue_name)
    }

    fn deployment_info(&self, config: &PrimitiveConfig) -> Option<DeploymentInfo> {
        let cfg = queue_config(config).ok()?;
        Some(DeploymentInfo {
            message: format!("Queue \"{}\" is live", cfg.queue_name),
            next_steps: vec![
                "Open the deployed URL to see the live dashboard".to_string(),
                "POST a message body to /send to enqueue it".to_string(),
                format!(
                    "Inspect consumer logs with `npx wrangler tail` (binding {})",
                    cfg.binding_name
                ),
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{Answer, ScriptedPrompter};
    use tempfile::TempDir;

    fn demo_config(project_name: Option<&str>) -> PrimitiveConfig {
        PrimitiveConfig::Queue(QueueFeatureConfig {
            project_name: project_name.map(str::to_string),
            queue_name: "demo-queue".to_string(),
            binding_name: "DEMO_QUEUE".to_string(),
            max_batch_size: 4,
            max_batch_timeout_seconds: 3,
            max_retries: 3,
        })
    }

    #[test]
    fn test_prompt_new_collects_all_fields() {
        let primitive = QueuePrimitive::new(BatchDefaults::default());
        let prompter = ScriptedPrompter::new(vec![
            Answer::Text("my-app".to_string()),
            Answer::Text("jobs".to_string()),
            Answer::Text(String::new()), // accept derived binding default
        ]);
        let config = primitive.prompt_new(&prompter).unwrap().unwrap();
        match config {
            PrimitiveConfig::Queue(cfg) => {
                assert_eq!(cfg.project_name.as_deref(), Some("my-app"));
                assert_eq!(cfg.queue_name, "jobs");
                assert_eq!(cfg.binding_name, "JOBS");
                assert_eq!(cfg.max_batch_size, 4);
            }
            other => panic!("unexpected config: {:?}", other),
        }
    }

    #[test]
    fn test_prompt_cancel_mid_sequence() {
        let primitive = QueuePrimitive::new(BatchDefaults::default());
        let prompter = ScriptedPrompter::new(vec![
            Answer::Text("my-app".to_string()),
            Answer::Cancel,
        ]);
        assert!(primitive.prompt_new(&prompter).unwrap().is_none());
    }

    #[test]
    fn test_prompt_existing_has_no_project_name() {
        let primitive = QueuePrimitive::new(BatchDefaults::default());
        let prompter = ScriptedPrompter::new(vec![
            Answer::Text("jobs".to_string()),
            Answer::Text("JOBS".to_string()),
        ]);
        let ctx = crate::context::detect(Path::new("."));
        let config = primitive.prompt_existing(&prompter, &ctx).unwrap().unwrap();
        assert!(config.project_name().is_none());
    }

    #[test]
    fn test_generate_files_new_project() {
        let tmp = TempDir::new().unwrap();
        let primitive = QueuePrimitive::new(BatchDefaults::default());
        primitive
            .generate_files(tmp.path(), FlowKind::New, &demo_config(Some("x")))
            .unwrap();
        assert!(tmp.path().join("src/index.ts").is_file());
        assert!(tmp.path().join("src/consumer.ts").is_file());
        assert!(tmp.path().join("src/event-store.ts").is_file());
        assert!(tmp.path().join("src/dashboard.html").is_file());
        let entry = fs::read_to_string(tmp.path().join("src/index.ts")).unwrap();
        assert!(entry.contains("env.DEMO_QUEUE.send"));
    }

    #[test]
    fn test_generate_files_existing_never_overwrites_entry() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src/index.ts"), "// user code\n").unwrap();
        let primitive = QueuePrimitive::new(BatchDefaults::default());
        primitive
            .generate_files(tmp.path(), FlowKind::Existing, &demo_config(None))
            .unwrap();
        assert_eq!(
            fs::read_to_string(tmp.path().join("src/index.ts")).unwrap(),
            "// user code\n"
        );
        // Other artifacts still generated
        assert!(tmp.path().join("src/event-store.ts").is_file());
    }

    #[test]
    fn test_generate_files_existing_refreshes_reference_file() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src/consumer.ts"), "stale\n").unwrap();
        let primitive = QueuePrimitive::new(BatchDefaults::default());
        primitive
            .generate_files(tmp.path(), FlowKind::Existing, &demo_config(None))
            .unwrap();
        let consumer = fs::read_to_string(tmp.path().join("src/consumer.ts")).unwrap();
        assert!(consumer.contains("demo-queue"));
    }

    #[test]
    fn test_patch_config_writes_queue_sections() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("wrangler.jsonc");
        fs::write(&config_path, "{\"name\":\"x\"}").unwrap();
        let primitive = QueuePrimitive::new(BatchDefaults::default());
        assert!(primitive.patch_config(&config_path, &demo_config(None)));
        let out = fs::read_to_string(&config_path).unwrap();
        assert!(out.contains("demo-queue"));
        assert!(out.contains("EVENT_STORE"));
    }

    #[test]
    fn test_foreign_config_rejected() {
        let tmp = TempDir::new().unwrap();
        let primitive = QueuePrimitive::new(BatchDefaults::default());
        let foreign = PrimitiveConfig::Bare(crate::registry::BareProjectConfig {
            project_name: "x".to_string(),
        });
        assert!(primitive
            .generate_files(tmp.path(), FlowKind::New, &foreign)
            .is_err());
        assert!(!primitive.patch_config(&tmp.path().join("wrangler.jsonc"), &foreign));
    }

    #[test]
    fn test_deployment_info_mentions_queue() {
        let primitive = QueuePrimitive::new(BatchDefaults::default());
        let info = primitive.deployment_info(&demo_config(None)).unwrap();
        assert!(info.message.contains("demo-queue"));
        assert!(!info.next_steps.is_empty());
    }
}
