//! Workflow directory access: the document, task folders and their files.

use crate::error::{RunError, RunResult};
use archivist_types::attachment::Attachment;
use archivist_types::error::{ArchiveError, ArchiveResult};
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// The operator-selected directory holding `workflow.json` and task folders.
#[derive(Debug, Clone)]
pub struct WorkflowDir {
    root: PathBuf,
}

/// A task's subfolder.
#[derive(Debug, Clone)]
pub struct TaskFolder {
    path: PathBuf,
}

/// Join `name` under `base` if it names a direct descendant (no `..`, no absolute path).
fn child(base: &Path, name: &str) -> Option<PathBuf> {
    let relative = Path::new(name);
    let plain = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    (plain && !name.is_empty()).then(|| base.join(relative))
}

impl WorkflowDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read and parse the workflow document.
    pub async fn read_document(&self, file_name: &str) -> RunResult<Value> {
        let path = self.root.join(file_name);
        let text = match tokio::fs::read(&path).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(_) => {
                return Err(RunError::Fatal(format!(
                    "{file_name} file not found in selected directory"
                )))
            }
        };
        serde_json::from_str(&text).map_err(|e| {
            debug!(path = %path.display(), error = %e, "Workflow document is not valid JSON");
            RunError::Fatal(format!("Invalid JSON in {file_name}"))
        })
    }

    /// Open a task folder, or `None` if it does not exist.
    pub async fn folder(&self, name: &str) -> Option<TaskFolder> {
        let path = child(&self.root, name)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => Some(TaskFolder { path }),
            _ => None,
        }
    }
}

impl TaskFolder {
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_path(&self, name: &str) -> ArchiveResult<PathBuf> {
        child(&self.path, name)
            .ok_or_else(|| ArchiveError::InvalidInput(format!("Invalid file name \"{name}\"")))
    }

    /// Read a text file; invalid UTF-8 is replaced rather than rejected.
    pub async fn read_text(&self, name: &str) -> ArchiveResult<String> {
        let bytes = tokio::fs::read(self.file_path(name)?).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read a file as an upload-ready attachment.
    pub async fn read_attachment(&self, name: &str) -> ArchiveResult<Attachment> {
        let path = self.file_path(name)?;
        let bytes = tokio::fs::read(&path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());
        Ok(Attachment::new(file_name, bytes))
    }
}
