//! Concrete primitives and the default registry wiring.

pub mod bare;
pub mod queue;

use crate::config::ToolConfig;
use crate::registry::Registry;

/// Build the registry the CLI entry point hands to the flows.
pub fn default_registry(config: &ToolConfig) -> Registry {
    let mut registry = Registry::new();
    registry.register(Box::new(queue::QueuePrimitive::new(
        config.defaults.clone(),
    )));
    registry.register(Box::new(bare::BarePrimitive));
    registry
}
