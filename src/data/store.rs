use std::path::PathBuf;

/// Faults raised by a project store. These are the only errors that abort a
/// build.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("path '{0}' escapes the workspace")]
    InvalidPath(String),
}

/// Durable storage for generated project files.
///
/// Paths are workspace-relative manifest paths such as `generated/src/app.py`.
pub trait ProjectStore {
    /// Writes `content` to `relative_path`, creating parent directories.
    ///
    /// A path ending in a separator (or without a basename) only creates the
    /// directory.
    fn write_file(&self, relative_path: &str, content: &str) -> Result<(), StoreError>;

    /// Creates the directory at `relative_path` and its parents.
    fn ensure_dir(&self, relative_path: &str) -> Result<(), StoreError>;

    /// Returns the file content, or an empty string if it is absent or unreadable.
    fn read_file(&self, relative_path: &str) -> String;

    /// Size in bytes of the file at `relative_path`, `None` if it does not exist.
    fn file_size(&self, relative_path: &str) -> Option<u64>;

    /// Whether a directory exists at `relative_path`.
    fn dir_exists(&self, relative_path: &str) -> bool;
}
