use anyhow::{bail, Result};
use std::path::Path;
use tracing::debug;

use crate::context::ProjectContext;
use crate::prompt::Prompter;
use crate::tools::ToolRunner;

/// Which flow a primitive is being used in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    New,
    Existing,
}

/// Static descriptor for a primitive.
#[derive(Debug, Clone)]
pub struct PrimitiveInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub supports_new_project: bool,
    pub supports_existing: bool,
}

/// Optional lifecycle capabilities, declared explicitly so the orchestrator
/// branches on flags instead of probing for callables.
#[derive(Debug, Clone, Copy, Default)]
pub struct Capabilities {
    pub prompt_existing: bool,
    pub patch_config: bool,
    pub pre_deploy: bool,
    pub deployment_info: bool,
}

/// Configuration produced by a primitive's prompt step and handed back to
/// its later lifecycle steps. The orchestrator only reads the common
/// project name; the payload is opaque to it.
#[derive(Debug, Clone)]
pub enum PrimitiveConfig {
    Queue(QueueFeatureConfig),
    Bare(BareProjectConfig),
}

impl PrimitiveConfig {
    pub fn project_name(&self) -> Option<&str> {
        match self {
            PrimitiveConfig::Queue(cfg) => cfg.project_name.as_deref(),
            PrimitiveConfig::Bare(cfg) => Some(&cfg.project_name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueueFeatureConfig {
    /// Only present in the new-project path.
    pub project_name: Option<String>,
    pub queue_name: String,
    pub binding_name: String,
    pub max_batch_size: u32,
    pub max_batch_timeout_seconds: u32,
    pub max_retries: u32,
}

#[derive(Debug, Clone)]
pub struct BareProjectConfig {
    pub project_name: String,
}

/// Success message plus next steps shown after a deployment.
#[derive(Debug, Clone)]
pub struct DeploymentInfo {
    pub message: String,
    pub next_steps: Vec<String>,
}

/// A pluggable feature module with a uniform setup lifecycle. `prompt_new`
/// and `generate_files` are mandatory; the rest is gated by
/// [`Capabilities`]. Prompt steps return `Ok(None)` on user cancellation.
pub trait Primitive {
    fn info(&self) -> &PrimitiveInfo;

    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    fn prompt_new(&self, prompter: &dyn Prompter) -> Result<Option<PrimitiveConfig>>;

    fn prompt_existing(
        &self,
        _prompter: &dyn Prompter,
        _ctx: &ProjectContext,
    ) -> Result<Option<PrimitiveConfig>> {
        bail!(
            "Primitive '{}' does not support existing projects",
            self.info().id
        )
    }

    /// Merge this primitive's configuration into the project config
    /// document. A `false` return is fatal for the flow.
    fn patch_config(&self, _config_path: &Path, _config: &PrimitiveConfig) -> bool {
        true
    }

    fn generate_files(
        &self,
        target_dir: &Path,
        kind: FlowKind,
        config: &PrimitiveConfig,
    ) -> Result<()>;

    /// Provision external resources before deployment. Failures here are
    /// warnings, not fatal.
    fn pre_deploy(
        &self,
        _target_dir: &Path,
        _config: &PrimitiveConfig,
        _tools: &dyn ToolRunner,
    ) -> Result<()> {
        Ok(())
    }

    fn deployment_info(&self, _config: &PrimitiveConfig) -> Option<DeploymentInfo> {
        None
    }
}

/// Ordered collection of primitives. Constructed explicitly and passed in
/// (no global state), so tests build their own.
#[derive(Default)]
pub struct Registry {
    primitives: Vec<Box<dyn Primitive>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a primitive. A duplicate id replaces the earlier entry in
    /// place (last write wins), which lets tests swap in doubles.
    pub fn register(&mut self, primitive: Box<dyn Primitive>) {
        let id = primitive.info().id;
        if let Some(existing) = self
            .primitives
            .iter_mut()
            .find(|p| p.info().id == id)
        {
            debug!("Replacing already-registered primitive '{}'", id);
            *existing = primitive;
        } else {
            self.primitives.push(primitive);
        }
    }

    pub fn get(&self, id: &str) -> Option<&dyn Primitive> {
        self.primitives
            .iter()
            .find(|p| p.info().id == id)
            .map(|p| p.as_ref())
    }

    /// Primitives usable in the given flow, in registration order.
    pub fn list(&self, kind: FlowKind) -> Vec<&dyn Primitive> {
        self.primitives
            .iter()
            .filter(|p| match kind {
                FlowKind::New => p.info().supports_new_project,
                FlowKind::Existing => p.info().supports_existing,
            })
            .map(|p| p.as_ref())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakePrimitive {
        info: PrimitiveInfo,
    }

    impl FakePrimitive {
        fn boxed(id: &'static str, new: bool, existing: bool) -> Box<dyn Primitive> {
            Box::new(Self {
                info: PrimitiveInfo {
                    id,
                    name: id,
                    description: "",
                    supports_new_project: new,
                    supports_existing: existing,
                },
            })
        }
    }

    impl Primitive for FakePrimitive {
        fn info(&self) -> &PrimitiveInfo {
            &self.info
        }

        fn prompt_new(&self, _prompter: &dyn Prompter) -> Result<Option<PrimitiveConfig>> {
            Ok(Some(PrimitiveConfig::Bare(BareProjectConfig {
                project_name: self.info.id.to_string(),
            })))
        }

        fn generate_files(
            &self,
            _target_dir: &Path,
            _kind: FlowKind,
            _config: &PrimitiveConfig,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_list_filters_by_capability_flags() {
        let mut registry = Registry::new();
        registry.register(FakePrimitive::boxed("both", true, true));
        registry.register(FakePrimitive::boxed("new-only", true, false));
        registry.register(FakePrimitive::boxed("existing-only", false, true));

        let new_ids: Vec<&str> = registry
            .list(FlowKind::New)
            .iter()
            .map(|p| p.info().id)
            .collect();
        assert_eq!(new_ids, vec!["both", "new-only"]);

        let existing_ids: Vec<&str> = registry
            .list(FlowKind::Existing)
            .iter()
            .map(|p| p.info().id)
            .collect();
        assert_eq!(existing_ids, vec!["both", "existing-only"]);
    }

    #[test]
    fn test_register_preserves_order() {
        let mut registry = Registry::new();
        registry.register(FakePrimitive::boxed("c", true, true));
        registry.register(FakePrimitive::boxed("a", true, true));
        registry.register(FakePrimitive::boxed("b", true, true));
        let ids: Vec<&str> = registry
            .list(FlowKind::New)
            .iter()
            .map(|p| p.info().id)
            .collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_register_last_write_wins_keeps_position() {
        let mut registry = Registry::new();
        registry.register(FakePrimitive::boxed("a", true, true));
        registry.register(FakePrimitive::boxed("b", true, true));
        // Replace "a" with a variant that no longer supports existing
        registry.register(FakePrimitive::boxed("a", true, false));

        let ids: Vec<&str> = registry
            .list(FlowKind::New)
            .iter()
            .map(|p| p.info().id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(registry.list(FlowKind::Existing).iter().all(|p| p.info().id != "a"));
    }

    #[test]
    fn test_get_by_id() {
        let mut registry = Registry::new();
        registry.register(FakePrimitive::boxed("queues", true, true));
        assert!(registry.get("queues").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_config_project_name_accessor() {
        let queue = PrimitiveConfig::Queue(QueueFeatureConfig {
            project_name: None,
            queue_name: "q".to_string(),
            binding_name: "Q".to_string(),
            max_batch_size: 4,
            max_batch_timeout_seconds: 3,
            max_retries: 3,
        });
        assert!(queue.project_name().is_none());
        let bare = PrimitiveConfig::Bare(BareProjectConfig {
            project_name: "demo".to_string(),
        });
        assert_eq!(bare.project_name(), Some("demo"));
    }
}
