//! Idempotent, format-aware patching of project configuration documents.
//!
//! Adds the queue feature's configuration (text-asset rule, queue producer
//! and consumer, EVENT_STORE storage-object binding, EventStore migration)
//! to a `wrangler.jsonc`/`wrangler.json` or `wrangler.toml` file without
//! clobbering user content or duplicating entries on repeated runs.

mod jsonc;
mod structured;

use std::path::Path;
use thiserror::Error;
use tracing::{error, info};

use crate::config::BatchDefaults;
use crate::context::ConfigFormat;

/// The desired queue configuration to merge into the document.
#[derive(Debug, Clone)]
pub struct QueuePatch {
    pub queue_name: String,
    pub binding_name: String,
    pub max_batch_size: u32,
    pub max_batch_timeout_seconds: u32,
    pub max_retries: u32,
}

impl QueuePatch {
    pub fn new(queue_name: &str, binding_name: &str) -> Self {
        Self::with_defaults(queue_name, binding_name, &BatchDefaults::default())
    }

    pub fn with_defaults(queue_name: &str, binding_name: &str, defaults: &BatchDefaults) -> Self {
        Self {
            queue_name: queue_name.to_string(),
            binding_name: binding_name.to_string(),
            max_batch_size: defaults.max_batch_size,
            max_batch_timeout_seconds: defaults.max_batch_timeout_seconds,
            max_retries: defaults.max_retries,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum PatchOutcome {
    Applied,
    AlreadyApplied,
}

#[derive(Debug, Error)]
pub(crate) enum PatchError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unexpected document shape: {0}")]
    Shape(String),
}

/// Merge `patch` into the configuration document at `path`. Dispatches on
/// the file extension. Errors never escape this boundary: they are logged
/// and reported as `false`, which callers treat as fatal for the flow.
pub fn patch(path: &Path, patch: &QueuePatch) -> bool {
    let result = match ConfigFormat::from_path(path) {
        ConfigFormat::StructuredText => structured::apply(path, patch),
        ConfigFormat::JsonLike => jsonc::apply(path, patch),
    };
    match result {
        Ok(PatchOutcome::Applied) => {
            info!("Updated {}", path.display());
            true
        }
        Ok(PatchOutcome::AlreadyApplied) => {
            info!(
                "Queue \"{}\" already configured in {}, nothing to do",
                patch.queue_name,
                path.display()
            );
            true
        }
        Err(e) => {
            error!("Failed to update {}: {}", path.display(), e);
            false
        }
    }
}
