//! Structured-text (TOML-shaped) patcher.
//!
//! Deliberately simplified: targeted substring checks plus append-only
//! block concatenation at the end of the file, not a full parser. The only
//! duplicate guard is the literal `queue = "<name>"` marker, so a second,
//! different queue appends fresh producer/consumer blocks without
//! cross-checking other sections.

use std::fs;
use std::path::Path;
use tracing::debug;

use super::{PatchError, PatchOutcome, QueuePatch};

const RULE_MARKER: &str = "globs = [\"**/*.html\"]";
const BINDING_MARKER: &str = "name = \"EVENT_STORE\"";
const MIGRATION_MARKER: &str = "new_classes = [\"EventStore\"]";

pub(crate) fn apply(path: &Path, patch: &QueuePatch) -> Result<PatchOutcome, PatchError> {
    let src = fs::read_to_string(path)?;

    let queue_marker = format!("queue = \"{}\"", patch.queue_name);
    if src.contains(&queue_marker) {
        debug!("Found {:?}, treating patch as already applied", queue_marker);
        return Ok(PatchOutcome::AlreadyApplied);
    }

    let mut out = src;
    if !out.ends_with('\n') && !out.is_empty() {
        out.push('\n');
    }

    if !out.contains(RULE_MARKER) {
        out.push_str(
            "\n[[rules]]\ntype = \"Text\"\nglobs = [\"**/*.html\"]\nfallthrough = true\n",
        );
    }

    out.push_str(&format!(
        "\n[[queues.producers]]\nqueue = \"{}\"\nbinding = \"{}\"\n",
        patch.queue_name, patch.binding_name
    ));

    out.push_str(&format!(
        "\n[[queues.consumers]]\nqueue = \"{}\"\nmax_batch_size = {}\nmax_batch_timeout = {}\nmax_retries = {}\n",
        patch.queue_name, patch.max_batch_size, patch.max_batch_timeout_seconds, patch.max_retries
    ));

    if !out.contains(BINDING_MARKER) {
        out.push_str(
            "\n[[durable_objects.bindings]]\nname = \"EVENT_STORE\"\nclass_name = \"EventStore\"\n",
        );
    }

    if !out.contains(MIGRATION_MARKER) {
        out.push_str("\n[[migrations]]\ntag = \"v1\"\nnew_classes = [\"EventStore\"]\n");
    }

    fs::write(path, out)?;
    Ok(PatchOutcome::Applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn demo_patch() -> QueuePatch {
        QueuePatch::new("demo-queue", "DEMO_QUEUE")
    }

    fn write_and_patch(initial: &str, patch: &QueuePatch) -> (TempDir, String) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("wrangler.toml");
        fs::write(&path, initial).unwrap();
        apply(&path, patch).unwrap();
        let out = fs::read_to_string(&path).unwrap();
        (tmp, out)
    }

    #[test]
    fn test_appends_all_blocks() {
        let (_tmp, out) = write_and_patch("name = \"x\"\n", &demo_patch());
        assert!(out.starts_with("name = \"x\"\n"));
        assert!(out.contains("[[rules]]"));
        assert!(out.contains("queue = \"demo-queue\""));
        assert!(out.contains("binding = \"DEMO_QUEUE\""));
        assert!(out.contains("max_batch_size = 4"));
        assert!(out.contains("max_batch_timeout = 3"));
        assert!(out.contains("max_retries = 3"));
        assert!(out.contains("[[durable_objects.bindings]]"));
        assert!(out.contains("[[migrations]]"));
        // The whole output is still valid TOML
        let parsed: toml::Value = toml::from_str(&out).unwrap();
        assert!(parsed.get("queues").is_some());
    }

    #[test]
    fn test_same_queue_short_circuits_without_writing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("wrangler.toml");
        let initial = "name = \"x\"\n\n[[queues.producers]]\nqueue = \"demo-queue\"\nbinding = \"DEMO_QUEUE\"\n";
        fs::write(&path, initial).unwrap();
        let outcome = apply(&path, &demo_patch()).unwrap();
        assert_eq!(outcome, PatchOutcome::AlreadyApplied);
        // Byte content untouched
        assert_eq!(fs::read_to_string(&path).unwrap(), initial);
    }

    #[test]
    fn test_double_apply_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("wrangler.toml");
        fs::write(&path, "name = \"x\"\n").unwrap();
        apply(&path, &demo_patch()).unwrap();
        let once = fs::read_to_string(&path).unwrap();
        apply(&path, &demo_patch()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), once);
    }

    #[test]
    fn test_second_queue_skips_shared_blocks() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("wrangler.toml");
        fs::write(&path, "name = \"x\"\n").unwrap();
        apply(&path, &demo_patch()).unwrap();
        apply(&path, &QueuePatch::new("other-queue", "OTHER_QUEUE")).unwrap();
        let out = fs::read_to_string(&path).unwrap();
        // Producer/consumer blocks appended for the second queue
        assert!(out.contains("queue = \"other-queue\""));
        // Shared blocks stay unique
        assert_eq!(out.matches("[[rules]]").count(), 1);
        assert_eq!(out.matches("name = \"EVENT_STORE\"").count(), 1);
        assert_eq!(out.matches("[[migrations]]").count(), 1);
    }

    #[test]
    fn test_missing_trailing_newline_handled() {
        let (_tmp, out) = write_and_patch("name = \"x\"", &demo_patch());
        assert!(out.contains("name = \"x\"\n"));
        let parsed: toml::Value = toml::from_str(&out).unwrap();
        assert!(parsed.get("queues").is_some());
    }
}
