//! JSON-like patcher, tolerant of comments and trailing commas.
//!
//! The document is never re-serialized. Comments (and, for the parse copy,
//! trailing commas) are masked to spaces so byte offsets stay stable, a
//! `serde_json::Value` of the masked text drives the existence checks, and
//! the edits are applied as minimal textual splices against the original
//! source. Untouched regions keep their exact bytes.

use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

use super::{PatchError, PatchOutcome, QueuePatch};

const RULE_ELEMENT: &str =
    "{ \"type\": \"Text\", \"globs\": [\"**/*.html\"], \"fallthrough\": true }";
const BINDING_ELEMENT: &str = "{ \"name\": \"EVENT_STORE\", \"class_name\": \"EventStore\" }";
const MIGRATION_ELEMENT: &str = "{ \"tag\": \"v1\", \"new_classes\": [\"EventStore\"] }";

pub(crate) fn apply(path: &Path, patch: &QueuePatch) -> Result<PatchOutcome, PatchError> {
    let src = fs::read_to_string(path)?;
    let value = parse_tolerant(&src)?;
    if !value.is_object() {
        return Err(PatchError::Shape("root value is not an object".to_string()));
    }

    // Primary duplicate guard: a producer for this queue means the whole
    // patch already ran.
    if producer_exists(&value, &patch.queue_name) {
        return Ok(PatchOutcome::AlreadyApplied);
    }

    // Names are validated at the prompt, but the patcher splices them into
    // raw JSON text, so reject anything that would break out of a string.
    for name in [&patch.queue_name, &patch.binding_name] {
        if name.contains(['"', '\\']) {
            return Err(PatchError::Shape(format!("unsafe name: {:?}", name)));
        }
    }

    let mut doc = src;
    // Steps below are each independently idempotent against the original
    // document: second line of defense if the short-circuit was bypassed
    // by a different queue name.
    if !html_rule_exists(&value) {
        append_to_array(&mut doc, &["rules"], RULE_ELEMENT)?;
    }
    append_to_array(&mut doc, &["queues", "producers"], &producer_element(patch))?;
    append_to_array(&mut doc, &["queues", "consumers"], &consumer_element(patch))?;
    if !event_store_binding_exists(&value) {
        append_to_array(&mut doc, &["durable_objects", "bindings"], BINDING_ELEMENT)?;
    }
    if !event_store_migration_exists(&value) {
        append_to_array(&mut doc, &["migrations"], MIGRATION_ELEMENT)?;
    }

    fs::write(path, &doc)?;
    Ok(PatchOutcome::Applied)
}

fn producer_element(patch: &QueuePatch) -> String {
    format!(
        "{{ \"queue\": \"{}\", \"binding\": \"{}\" }}",
        patch.queue_name, patch.binding_name
    )
}

fn consumer_element(patch: &QueuePatch) -> String {
    format!(
        "{{ \"queue\": \"{}\", \"max_batch_size\": {}, \"max_batch_timeout\": {}, \"max_retries\": {} }}",
        patch.queue_name, patch.max_batch_size, patch.max_batch_timeout_seconds, patch.max_retries
    )
}

// --- existence checks against the parsed document ---

fn producer_exists(value: &Value, queue_name: &str) -> bool {
    value
        .pointer("/queues/producers")
        .and_then(Value::as_array)
        .is_some_and(|producers| {
            producers
                .iter()
                .any(|p| p.get("queue").and_then(Value::as_str) == Some(queue_name))
        })
}

fn html_rule_exists(value: &Value) -> bool {
    value
        .pointer("/rules")
        .and_then(Value::as_array)
        .is_some_and(|rules| {
            rules.iter().any(|rule| {
                let is_text = rule
                    .get("type")
                    .and_then(Value::as_str)
                    .is_some_and(|t| t.eq_ignore_ascii_case("text"));
                let has_glob = rule
                    .get("globs")
                    .and_then(Value::as_array)
                    .is_some_and(|globs| {
                        globs.iter().any(|g| g.as_str() == Some("**/*.html"))
                    });
                is_text && has_glob
            })
        })
}

fn event_store_binding_exists(value: &Value) -> bool {
    value
        .pointer("/durable_objects/bindings")
        .and_then(Value::as_array)
        .is_some_and(|bindings| {
            bindings
                .iter()
                .any(|b| b.get("name").and_then(Value::as_str) == Some("EVENT_STORE"))
        })
}

fn event_store_migration_exists(value: &Value) -> bool {
    value
        .pointer("/migrations")
        .and_then(Value::as_array)
        .is_some_and(|migrations| {
            migrations.iter().any(|m| {
                m.get("new_classes")
                    .and_then(Value::as_array)
                    .is_some_and(|classes| {
                        classes.iter().any(|c| c.as_str() == Some("EventStore"))
                    })
            })
        })
}

// --- tolerant parsing ---

fn parse_tolerant(src: &str) -> Result<Value, PatchError> {
    let cleaned = mask_trailing_commas(&mask_comments(src));
    Ok(serde_json::from_str(&cleaned)?)
}

/// Replace `//` and `/* */` comments with spaces, preserving newlines and
/// every byte offset.
fn mask_comments(src: &str) -> String {
    enum State {
        Normal,
        Str,
        Line,
        Block,
    }
    let bytes = src.as_bytes();
    let mut out = bytes.to_vec();
    let mut state = State::Normal;
    let mut i = 0;
    while i < bytes.len() {
        match state {
            State::Normal => match bytes[i] {
                b'"' => {
                    state = State::Str;
                    i += 1;
                }
                b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'/' => {
                    state = State::Line;
                    out[i] = b' ';
                    out[i + 1] = b' ';
                    i += 2;
                }
                b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'*' => {
                    state = State::Block;
                    out[i] = b' ';
                    out[i + 1] = b' ';
                    i += 2;
                }
                _ => i += 1,
            },
            State::Str => match bytes[i] {
                b'\\' => i += 2,
                b'"' => {
                    state = State::Normal;
                    i += 1;
                }
                _ => i += 1,
            },
            State::Line => {
                if bytes[i] == b'\n' {
                    state = State::Normal;
                } else {
                    out[i] = b' ';
                }
                i += 1;
            }
            State::Block => {
                if bytes[i] == b'*' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
                    out[i] = b' ';
                    out[i + 1] = b' ';
                    state = State::Normal;
                    i += 2;
                } else {
                    if bytes[i] != b'\n' {
                        out[i] = b' ';
                    }
                    i += 1;
                }
            }
        }
    }
    // Only whole multi-byte sequences inside comments get spaced out, so
    // the result is always valid UTF-8.
    String::from_utf8_lossy(&out).into_owned()
}

/// Replace commas immediately preceding `]` or `}` with spaces. Input must
/// already be comment-masked.
fn mask_trailing_commas(masked: &str) -> String {
    let mut out = masked.as_bytes().to_vec();
    let mut in_str = false;
    let mut i = 0;
    while i < out.len() {
        let b = out[i];
        if in_str {
            match b {
                b'\\' => i += 2,
                b'"' => {
                    in_str = false;
                    i += 1;
                }
                _ => i += 1,
            }
            continue;
        }
        match b {
            b'"' => {
                in_str = true;
                i += 1;
            }
            b',' => {
                let mut j = i + 1;
                while j < out.len() && out[j].is_ascii_whitespace() {
                    j += 1;
                }
                if j < out.len() && (out[j] == b'}' || out[j] == b']') {
                    out[i] = b' ';
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

// --- offset scanner over comment-masked text ---

type Span = (usize, usize);

fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// `start` is at an opening quote; returns the index past the closing one.
fn skip_string(bytes: &[u8], start: usize) -> Result<usize, PatchError> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Ok(i + 1),
            _ => i += 1,
        }
    }
    Err(PatchError::Shape("unterminated string".to_string()))
}

/// `start` is at the first byte of a value; returns the index past it.
fn skip_value(bytes: &[u8], start: usize) -> Result<usize, PatchError> {
    match bytes.get(start) {
        Some(b'"') => skip_string(bytes, start),
        Some(b'{') | Some(b'[') => {
            let mut depth = 0usize;
            let mut i = start;
            while i < bytes.len() {
                match bytes[i] {
                    b'"' => i = skip_string(bytes, i)?,
                    b'{' | b'[' => {
                        depth += 1;
                        i += 1;
                    }
                    b'}' | b']' => {
                        depth = depth.saturating_sub(1);
                        i += 1;
                        if depth == 0 {
                            return Ok(i);
                        }
                    }
                    _ => i += 1,
                }
            }
            Err(PatchError::Shape("unbalanced brackets".to_string()))
        }
        Some(_) => {
            // number / true / false / null
            let mut i = start;
            while i < bytes.len()
                && !bytes[i].is_ascii_whitespace()
                && !matches!(bytes[i], b',' | b'}' | b']')
            {
                i += 1;
            }
            Ok(i)
        }
        None => Err(PatchError::Shape("unexpected end of document".to_string())),
    }
}

fn root_object(masked: &str) -> Result<Span, PatchError> {
    let bytes = masked.as_bytes();
    let start = skip_ws(bytes, 0);
    if bytes.get(start) != Some(&b'{') {
        return Err(PatchError::Shape("root value is not an object".to_string()));
    }
    let end = skip_value(bytes, start)?;
    Ok((start, end))
}

/// Find the value span of `key` inside the object `obj`. Tolerates
/// trailing commas.
fn find_member(masked: &str, obj: Span, key: &str) -> Result<Option<Span>, PatchError> {
    let bytes = masked.as_bytes();
    let mut i = obj.0 + 1;
    loop {
        i = skip_ws(bytes, i);
        if i >= obj.1 {
            return Ok(None);
        }
        match bytes[i] {
            b'}' => return Ok(None),
            b',' => i += 1,
            b'"' => {
                let key_end = skip_string(bytes, i)?;
                let name = &masked[i + 1..key_end - 1];
                let mut j = skip_ws(bytes, key_end);
                if bytes.get(j) != Some(&b':') {
                    return Err(PatchError::Shape(format!(
                        "expected ':' after key \"{}\"",
                        name
                    )));
                }
                j = skip_ws(bytes, j + 1);
                let value_end = skip_value(bytes, j)?;
                if name == key {
                    return Ok(Some((j, value_end)));
                }
                i = value_end;
            }
            other => {
                return Err(PatchError::Shape(format!(
                    "expected object key, found '{}'",
                    other as char
                )));
            }
        }
    }
}

// --- splicing ---

/// Leading whitespace of the line containing `offset`.
fn line_indent(doc: &str, offset: usize) -> String {
    let line_start = doc[..offset].rfind('\n').map_or(0, |p| p + 1);
    doc[line_start..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}

/// Append `element` to the array addressed by `path` (object keys followed
/// by the array key), creating missing intermediate sections as new members
/// of the deepest existing object. A single splice per call; callers
/// re-scan between calls.
fn append_to_array(doc: &mut String, path: &[&str], element: &str) -> Result<(), PatchError> {
    let masked = mask_comments(doc);
    let bytes = masked.as_bytes();
    let mut obj = root_object(&masked)?;
    for (depth, key) in path.iter().enumerate() {
        let is_last = depth == path.len() - 1;
        match find_member(&masked, obj, key)? {
            Some(span) if is_last => {
                if bytes[span.0] != b'[' {
                    return Err(PatchError::Shape(format!("\"{}\" is not an array", key)));
                }
                insert_array_element(doc, &masked, span, element);
                return Ok(());
            }
            Some(span) => {
                if bytes[span.0] != b'{' {
                    return Err(PatchError::Shape(format!("\"{}\" is not an object", key)));
                }
                obj = span;
            }
            None => {
                insert_new_member(doc, &masked, obj, &path[depth..], element);
                return Ok(());
            }
        }
    }
    Ok(())
}

/// Splice `element` before the closing bracket of the array at `span`.
fn insert_array_element(doc: &mut String, masked: &str, span: Span, element: &str) {
    let bytes = masked.as_bytes();
    let close = span.1 - 1;
    let base_indent = line_indent(doc, span.0);
    let elem_indent = format!("{}  ", base_indent);

    let last_content = (span.0 + 1..close)
        .rev()
        .find(|&idx| !bytes[idx].is_ascii_whitespace());

    match last_content {
        None => {
            // Empty array
            debug!("Appending first element to empty array");
            let text = format!("\n{}{}\n{}", elem_indent, element, base_indent);
            doc.insert_str(close, &text);
        }
        Some(idx) if bytes[idx] == b',' => {
            // Existing trailing comma stays in place
            let text = format!("\n{}{}", elem_indent, element);
            doc.insert_str(idx + 1, &text);
        }
        Some(idx) => {
            let text = format!(",\n{}{}", elem_indent, element);
            doc.insert_str(idx + 1, &text);
        }
    }
}

/// Splice a new member holding the remaining `path` (nested objects ending
/// in a one-element array) into the object at `obj`.
fn insert_new_member(doc: &mut String, masked: &str, obj: Span, path: &[&str], element: &str) {
    let bytes = masked.as_bytes();
    let close = obj.1 - 1;
    let base_indent = line_indent(doc, obj.0);
    let member_indent = format!("{}  ", base_indent);
    let member = render_member(path, element, &member_indent);

    let last_content = (obj.0 + 1..close)
        .rev()
        .find(|&idx| !bytes[idx].is_ascii_whitespace());

    match last_content {
        None => {
            // Empty object
            let text = format!("\n{}\n{}", member, base_indent);
            doc.insert_str(close, &text);
        }
        Some(idx) if bytes[idx] == b',' => {
            let text = format!("\n{}", member);
            doc.insert_str(idx + 1, &text);
        }
        Some(idx) => {
            let text = format!(",\n{}", member);
            doc.insert_str(idx + 1, &text);
        }
    }
}

/// Render `"key": { … "last": [ element ] … }` with `indent` as the prefix
/// of the first line.
fn render_member(path: &[&str], element: &str, indent: &str) -> String {
    match path {
        [last] => format!(
            "{i}\"{k}\": [\n{i}  {e}\n{i}]",
            i = indent,
            k = last,
            e = element
        ),
        [key, rest @ ..] => {
            let inner = render_member(rest, element, &format!("{}  ", indent));
            format!("{i}\"{k}\": {{\n{inner}\n{i}}}", i = indent, k = key)
        }
        [] => String::new(),
    }
}
