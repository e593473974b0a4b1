use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::data::{ProjectStore, StoreError};

/// Project store backed by a workspace directory on disk.
#[derive(Debug, Clone)]
pub struct FileProjectStore {
    base: PathBuf,
}

impl FileProjectStore {
    pub fn new(base: impl AsRef<Path>) -> Self {
        Self {
            base: base.as_ref().to_path_buf(),
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Resolves a manifest path inside the workspace.
    ///
    /// Leading `./` and `/` are ignored; `..` components are refused.
    pub fn resolve(&self, relative_path: &str) -> Result<PathBuf, StoreError> {
        let mut resolved = self.base.clone();
        for component in Path::new(relative_path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(StoreError::InvalidPath(relative_path.to_string()));
                }
            }
        }
        Ok(resolved)
    }
}

fn is_directory_path(relative_path: &str) -> bool {
    relative_path.is_empty()
        || relative_path.ends_with('/')
        || Path::new(relative_path).file_name().is_none()
}

impl ProjectStore for FileProjectStore {
    fn write_file(&self, relative_path: &str, content: &str) -> Result<(), StoreError> {
        if is_directory_path(relative_path) {
            return self.ensure_dir(relative_path);
        }

        let path = self.resolve(relative_path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(&path, content).map_err(|source| StoreError::Write { path, source })
    }

    fn ensure_dir(&self, relative_path: &str) -> Result<(), StoreError> {
        let path = self.resolve(relative_path)?;
        fs::create_dir_all(&path).map_err(|source| StoreError::CreateDir { path, source })
    }

    fn read_file(&self, relative_path: &str) -> String {
        self.resolve(relative_path)
            .ok()
            .and_then(|path| fs::read_to_string(path).ok())
            .unwrap_or_default()
    }

    fn file_size(&self, relative_path: &str) -> Option<u64> {
        let path = self.resolve(relative_path).ok()?;
        let metadata = fs::metadata(path).ok()?;
        metadata.is_file().then(|| metadata.len())
    }

    fn dir_exists(&self, relative_path: &str) -> bool {
        self.resolve(relative_path)
            .map(|path| path.is_dir())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_with_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = FileProjectStore::new(dir.path());

        store.write_file("generated/src/app.py", "print(1)").unwrap();

        assert_eq!(store.read_file("generated/src/app.py"), "print(1)");
        assert_eq!(store.file_size("generated/src/app.py"), Some(8));
    }

    #[test]
    fn directory_paths_only_create_directories() {
        let dir = TempDir::new().unwrap();
        let store = FileProjectStore::new(dir.path());

        store.write_file("generated/static/", "ignored").unwrap();

        assert!(store.dir_exists("generated/static/"));
        assert_eq!(store.file_size("generated/static/"), None);
    }

    #[test]
    fn missing_files_read_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileProjectStore::new(dir.path());
        assert_eq!(store.read_file("generated/nope.py"), "");
        assert_eq!(store.file_size("generated/nope.py"), None);
    }

    #[test]
    fn refuses_paths_that_escape_the_workspace() {
        let dir = TempDir::new().unwrap();
        let store = FileProjectStore::new(dir.path());

        assert!(matches!(
            store.write_file("generated/../../etc/passwd", "x"),
            Err(StoreError::InvalidPath(_))
        ));
        assert_eq!(
            store.resolve("./generated/a.py").unwrap(),
            dir.path().join("generated").join("a.py")
        );
    }
}
