//! The bare primitive: a plain scaffolded project with nothing pre-wired.

use anyhow::Result;
use std::path::Path;
use tracing::debug;

use crate::prompt::Prompter;
use crate::registry::{
    BareProjectConfig, FlowKind, Primitive, PrimitiveConfig, PrimitiveInfo,
};
use crate::util::validate_project_name;

const INFO: PrimitiveInfo = PrimitiveInfo {
    id: "hello",
    name: "Bare project",
    description: "A plain worker project with no primitive pre-wired",
    supports_new_project: true,
    supports_existing: false,
};

pub struct BarePrimitive;

impl Primitive for BarePrimitive {
    fn info(&self) -> &PrimitiveInfo {
        &INFO
    }

    fn prompt_new(&self, prompter: &dyn Prompter) -> Result<Option<PrimitiveConfig>> {
        let project_name = match prompter.input(
            "Project name",
            Some("my-worker"),
            Some(&validate_project_name),
        )? {
            Some(name) => name,
            None => return Ok(None),
        };
        Ok(Some(PrimitiveConfig::Bare(BareProjectConfig {
            project_name,
        })))
    }

    fn generate_files(
        &self,
        target_dir: &Path,
        _kind: FlowKind,
        _config: &PrimitiveConfig,
    ) -> Result<()> {
        // The scaffolded base tree is the whole artifact.
        debug!("Bare primitive: nothing to generate in {}", target_dir.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{Answer, ScriptedPrompter};

    #[test]
    fn test_prompt_new_returns_bare_config() {
        let prompter = ScriptedPrompter::new(vec![Answer::Text("my-app".to_string())]);
        let config = BarePrimitive.prompt_new(&prompter).unwrap().unwrap();
        assert_eq!(config.project_name(), Some("my-app"));
    }

    #[test]
    fn test_prompt_new_cancel() {
        let prompter = ScriptedPrompter::new(vec![Answer::Cancel]);
        assert!(BarePrimitive.prompt_new(&prompter).unwrap().is_none());
    }

    #[test]
    fn test_no_optional_capabilities() {
        let caps = BarePrimitive.capabilities();
        assert!(!caps.prompt_existing);
        assert!(!caps.patch_config);
        assert!(!caps.pre_deploy);
        assert!(!caps.deployment_info);
    }
}
