use serde::{Deserialize, Serialize};

use crate::data::{Manifest, ProjectStore};

/// Whether one manifest entry made it to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub path: String,
    pub validation: bool,
}

/// Checks every manifest entry against the store.
///
/// Files pass when they exist with a non-zero size, directory entries when the
/// directory exists. Nothing is modified or retried.
pub fn validate_manifest<S: ProjectStore + ?Sized>(
    manifest: &Manifest,
    store: &S,
) -> Vec<ValidationRecord> {
    manifest
        .iter()
        .map(|entry| {
            let validation = if entry.is_directory() {
                store.dir_exists(&entry.path)
            } else {
                store.file_size(&entry.path).is_some_and(|size| size > 0)
            };
            ValidationRecord {
                path: entry.path.clone(),
                validation,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contexts::FileProjectStore;
    use crate::data::ManifestEntry;
    use tempfile::TempDir;

    #[test]
    fn reports_written_missing_and_empty_files() {
        let dir = TempDir::new().unwrap();
        let store = FileProjectStore::new(dir.path());
        store.write_file("generated/app.py", "print(1)").unwrap();
        store.write_file("generated/empty.py", "").unwrap();
        store.ensure_dir("generated/static/").unwrap();

        let manifest = Manifest::new(vec![
            ManifestEntry::new("generated/app.py", "app"),
            ManifestEntry::new("generated/never.py", "never written"),
            ManifestEntry::new("generated/empty.py", "empty"),
            ManifestEntry::new("generated/static/", "assets"),
        ]);

        let records = validate_manifest(&manifest, &store);
        let flags: Vec<bool> = records.iter().map(|r| r.validation).collect();
        assert_eq!(flags, vec![true, false, false, true]);
        assert_eq!(records[1].path, "generated/never.py");
    }
}
