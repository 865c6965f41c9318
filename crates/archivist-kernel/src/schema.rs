//! Structural checks on the raw workflow document.
//!
//! Runs before deserialization so that every type problem in the document is
//! reported together, prefixed with the task/message it belongs to. Tasks and
//! thread messages that fail the check are blanked out and listed as rejected,
//! so the rest of the workflow can still be validated against its directory.

use crate::error::{RunError, RunResult};
use archivist_types::workflow::{ContentKey, Workflow};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use tracing::warn;

const ROOT_FIELDS: &[&str] = &["channel", "users", "tasks"];
const TASK_FIELDS: &[&str] = &[
    "name",
    "folder",
    "thread_name",
    "content",
    "content_file",
    "files",
    "resize_images",
    "tags",
    "thread_messages",
];
const MESSAGE_FIELDS: &[&str] = &["name", "content", "content_file", "files", "wait"];

#[derive(Clone, Copy)]
enum Kind {
    String,
    Bool,
    StringArray,
}

impl Kind {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::StringArray => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Bool => "true or false",
            Self::StringArray => "an array of strings",
        }
    }
}

/// Schema violations found in a raw document.
#[derive(Debug, Default)]
pub struct SchemaCheck {
    pub errors: Vec<String>,
    /// Tasks and thread messages with at least one violation.
    pub rejected: BTreeSet<ContentKey>,
    users_rejected: bool,
}

/// A deserialized workflow plus the schema violations it was parsed around.
#[derive(Debug)]
pub struct ParsedWorkflow {
    /// Rejected tasks and messages are present but blank, keeping indices stable.
    pub workflow: Workflow,
    pub errors: Vec<String>,
    pub rejected: BTreeSet<ContentKey>,
}

impl ParsedWorkflow {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse a workflow document, rejecting it as a whole when it is unusable.
///
/// Missing `tasks`/`channel` are fatal. Field-level problems are returned in
/// [`ParsedWorkflow::errors`], with the offending tasks and messages blanked.
pub fn parse_workflow(document: Value) -> RunResult<ParsedWorkflow> {
    let Some(tasks) = document.get("tasks").and_then(Value::as_array) else {
        return Err(RunError::Fatal(
            "Invalid workflow: missing tasks array".to_string(),
        ));
    };
    if tasks.is_empty() {
        return Err(RunError::Fatal(
            "Invalid workflow: tasks array is empty".to_string(),
        ));
    }
    let has_channel = document
        .get("channel")
        .and_then(Value::as_str)
        .is_some_and(|c| !c.trim().is_empty());
    if !has_channel {
        return Err(RunError::Fatal(
            "Workflow must specify a channel".to_string(),
        ));
    }

    let check = check_document(&document);
    let mut document = document;
    blank_rejected(&mut document, &check);
    strip_nulls(&mut document);
    let workflow = serde_json::from_value(document)
        .map_err(|e| RunError::Fatal(format!("Invalid workflow: {e}")))?;
    Ok(ParsedWorkflow {
        workflow,
        errors: check.errors,
        rejected: check.rejected,
    })
}

/// Replace rejected entries with empty ones that deserialize cleanly.
fn blank_rejected(document: &mut Value, check: &SchemaCheck) {
    let Some(root) = document.as_object_mut() else {
        return;
    };
    if check.users_rejected {
        root.remove("users");
    }
    let Some(tasks) = root.get_mut("tasks").and_then(Value::as_array_mut) else {
        return;
    };
    for (i, task) in tasks.iter_mut().enumerate() {
        if check.rejected.contains(&ContentKey::Task(i)) {
            *task = json!({ "folder": "", "thread_name": "" });
            continue;
        }
        let messages = task
            .get_mut("thread_messages")
            .and_then(Value::as_array_mut);
        for (j, message) in messages.into_iter().flatten().enumerate() {
            if check.rejected.contains(&ContentKey::Message(i, j)) {
                *message = json!({});
            }
        }
    }
}

/// Drop `null` object members so they read as absent optional fields.
fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

/// Every schema violation in the document. Unknown fields only warn.
pub fn check_document(document: &Value) -> SchemaCheck {
    let mut check = SchemaCheck::default();
    let errors = &mut check.errors;
    let Some(root) = document.as_object() else {
        errors.push("Workflow must be a JSON object".to_string());
        return check;
    };
    warn_unknown(root, ROOT_FIELDS, "workflow");

    match root.get("users") {
        None | Some(Value::Null) => {}
        Some(Value::Object(users)) => {
            for (alias, id) in users {
                if !id.is_string() {
                    errors.push(format!("users: User id for \"{alias}\" must be a string"));
                    check.users_rejected = true;
                }
            }
        }
        Some(_) => {
            errors.push("users: must be an object mapping aliases to user ids".to_string());
            check.users_rejected = true;
        }
    }

    let tasks = root.get("tasks").and_then(Value::as_array);
    for (i, task) in tasks.into_iter().flatten().enumerate() {
        let key = ContentKey::Task(i);
        let Some(task) = task.as_object() else {
            errors.push(format!("{key}: must be an object"));
            check.rejected.insert(key);
            continue;
        };
        warn_unknown(task, TASK_FIELDS, &key.to_string());
        let before = errors.len();

        for field in ["folder", "thread_name"] {
            match task.get(field) {
                Some(Value::String(s)) if !s.trim().is_empty() => {}
                Some(Value::String(_)) | None | Some(Value::Null) => {
                    errors.push(format!("{key}: Missing required field \"{field}\""))
                }
                Some(_) => errors.push(format!("{key}: Field \"{field}\" must be a string")),
            }
        }
        check_optional(task, &key, "name", Kind::String, errors);
        check_optional(task, &key, "content", Kind::String, errors);
        check_optional(task, &key, "content_file", Kind::String, errors);
        check_optional(task, &key, "files", Kind::StringArray, errors);
        check_optional(task, &key, "resize_images", Kind::Bool, errors);
        check_optional(task, &key, "tags", Kind::StringArray, errors);
        warn_both_sources(task, &key);

        let messages = match task.get("thread_messages") {
            None | Some(Value::Null) => None,
            Some(Value::Array(messages)) => Some(messages),
            Some(_) => {
                errors.push(format!(
                    "{key}: Field \"thread_messages\" must be an array"
                ));
                None
            }
        };
        if errors.len() > before {
            check.rejected.insert(key);
            continue;
        }

        for (j, message) in messages.into_iter().flatten().enumerate() {
            let key = ContentKey::Message(i, j);
            let Some(message) = message.as_object() else {
                errors.push(format!("{key}: must be an object"));
                check.rejected.insert(key);
                continue;
            };
            warn_unknown(message, MESSAGE_FIELDS, &key.to_string());
            let before = errors.len();
            check_optional(message, &key, "name", Kind::String, errors);
            check_optional(message, &key, "content", Kind::String, errors);
            check_optional(message, &key, "content_file", Kind::String, errors);
            check_optional(message, &key, "files", Kind::StringArray, errors);
            check_optional(message, &key, "wait", Kind::Bool, errors);
            warn_both_sources(message, &key);
            if errors.len() > before {
                check.rejected.insert(key);
            }
        }
    }
    check
}

fn check_optional(
    object: &Map<String, Value>,
    key: &ContentKey,
    field: &str,
    kind: Kind,
    errors: &mut Vec<String>,
) {
    match object.get(field) {
        None | Some(Value::Null) => {}
        Some(value) if kind.matches(value) => {}
        Some(_) => errors.push(format!(
            "{key}: Field \"{field}\" must be {}",
            kind.describe()
        )),
    }
}

fn warn_unknown(object: &Map<String, Value>, known: &[&str], location: &str) {
    for field in object.keys() {
        if !known.contains(&field.as_str()) {
            warn!(location, field = %field, "Ignoring unknown workflow field");
        }
    }
}

fn warn_both_sources(object: &Map<String, Value>, key: &ContentKey) {
    let set = |f: &str| object.get(f).and_then(Value::as_str).is_some_and(|s| !s.is_empty());
    if set("content") && set("content_file") {
        warn!(
            location = %key,
            "Both content and content_file are set; using content_file"
        );
    }
}
