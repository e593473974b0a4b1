use crate::data::Cache;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Cache of model completions stored as plain files.
///
/// Layout: `{folder}/{model_hash}/{key}.cache`, where `model_hash` partitions
/// entries by model and system context and `key` is a hash of the prompt.
#[derive(Debug, Clone)]
pub struct FileCache {
    folder: PathBuf,
    model_hash: String,
}

impl FileCache {
    /// Creates a cache rooted at `folder` for one model partition.
    pub fn new(folder: impl AsRef<Path>, model_hash: String) -> Self {
        Self {
            folder: folder.as_ref().to_path_buf(),
            model_hash,
        }
    }

    fn entry_dir(&self) -> PathBuf {
        self.folder.join(&self.model_hash)
    }

    /// Keys are hex digests, so they are safe as file names.
    fn entry_path(&self, key: &str) -> PathBuf {
        self.entry_dir().join(format!("{}.cache", key))
    }
}

impl Cache for FileCache {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.entry_path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        let dir = self.entry_dir();
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!("Failed to create cache directory {}: {}", dir.display(), e);
            return;
        }

        let path = self.entry_path(key);
        if let Err(e) = fs::write(&path, value) {
            warn!("Failed to write cache file {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn builds_partitioned_entry_paths() {
        let cache = FileCache::new("/tmp/cache", "abc123".to_string());
        assert_eq!(
            cache.entry_path("key"),
            PathBuf::from("/tmp/cache/abc123/key.cache")
        );
    }

    #[test]
    fn miss_then_hit_then_overwrite() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path(), "model".to_string());

        assert_eq!(cache.get("prompt"), None);

        cache.set("prompt", "first");
        assert_eq!(cache.get("prompt"), Some("first".to_string()));

        cache.set("prompt", "second");
        assert_eq!(cache.get("prompt"), Some("second".to_string()));
    }
}
