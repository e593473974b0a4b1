use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// One file found under a snapshot root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSnapshot {
    /// Path relative to the snapshot root, `/`-separated
    pub path: String,
    pub content: String,
}

/// Lists every file beneath `root` with its content, sorted by path.
///
/// A missing root yields an empty snapshot. Non-UTF-8 content is decoded
/// lossily. Symlinks to directories are not followed.
pub fn snapshot_directory(root: &Path) -> Result<Vec<FileSnapshot>> {
    let mut files = Vec::new();
    if root.is_dir() {
        scan_directory(root, root, &mut files)?;
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

fn scan_directory(base_dir: &Path, current_dir: &Path, files: &mut Vec<FileSnapshot>) -> Result<()> {
    let entries = fs::read_dir(current_dir)
        .with_context(|| format!("Failed to read directory: {}", current_dir.display()))?;

    for entry in entries {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let path = entry.path();

        if file_type.is_dir() {
            scan_directory(base_dir, &path, files)?;
            continue;
        }
        if file_type.is_symlink() && path.is_dir() {
            continue;
        }

        let bytes = fs::read(&path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let relative = path.strip_prefix(base_dir).unwrap_or(&path);

        files.push(FileSnapshot {
            path: relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            content: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lists_nested_files_sorted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/utils")).unwrap();
        fs::create_dir_all(dir.path().join("static")).unwrap();
        fs::write(dir.path().join("src/utils/log.py"), "log").unwrap();
        fs::write(dir.path().join("app.py"), "app").unwrap();

        let snapshot = snapshot_directory(dir.path()).unwrap();
        let paths: Vec<&str> = snapshot.iter().map(|f| f.path.as_str()).collect();

        assert_eq!(paths, vec!["app.py", "src/utils/log.py"]);
        assert_eq!(snapshot[1].content, "log");
    }

    #[cfg(unix)]
    #[test]
    fn does_not_follow_directory_symlinks() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/app.py"), "app").unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("src/loop")).unwrap();

        let snapshot = snapshot_directory(dir.path()).unwrap();
        let paths: Vec<&str> = snapshot.iter().map(|f| f.path.as_str()).collect();

        assert_eq!(paths, vec!["src/app.py"]);
    }

    #[test]
    fn missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(snapshot_directory(&dir.path().join("absent")).unwrap().is_empty());
    }
}
