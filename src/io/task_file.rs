use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::task::Task;
use crate::model::tree::{TaskError, TaskTree};

/// Error type for task file I/O
#[derive(Debug, thiserror::Error)]
pub enum TaskFileError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("invalid task file: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("invalid task hierarchy in {path}: {source}")]
    TreeError { path: PathBuf, source: TaskError },
}

/// Load a JSON array of tasks into a tree, keeping their ids.
pub fn load_tasks(path: &Path) -> Result<TaskTree, TaskFileError> {
    let text = fs::read_to_string(path).map_err(|e| TaskFileError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let tasks: Vec<Task> = serde_json::from_str(&text)?;
    let tree = TaskTree::from_tasks(tasks);
    tree.validate().map_err(|e| TaskFileError::TreeError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(tree)
}

/// Write every task in the tree back as a JSON array, ordered by id.
pub fn save_tasks(path: &Path, tree: &TaskTree) -> Result<(), TaskFileError> {
    let tasks: Vec<&Task> = tree.iter().collect();
    let mut json = serde_json::to_string_pretty(&tasks)?;
    json.push('\n');
    atomic_write(path, json.as_bytes()).map_err(|e| TaskFileError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
