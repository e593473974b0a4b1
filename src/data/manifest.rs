use serde::{Deserialize, Serialize};
use std::path::Path;

/// Directory every manifest path is re-rooted under.
pub const DEFAULT_PROJECT_ROOT: &str = "generated";

/// Extensions whose files are written as project documentation rather than code.
pub const DOCUMENTATION_EXTENSIONS: &[&str] = &["md", "markdown", "rst"];

/// One intended project file or directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Project-root-relative path, e.g. `generated/src/main.py`
    pub path: String,
    /// Free-text purpose, used only as prompt material
    pub description: String,
}

impl ManifestEntry {
    pub fn new(path: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            description: description.into(),
        }
    }

    /// A trailing separator or an empty basename marks a directory entry.
    pub fn is_directory(&self) -> bool {
        self.path.is_empty()
            || self.path.ends_with('/')
            || Path::new(&self.path).file_name().is_none()
    }

    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.path).extension().and_then(|e| e.to_str())
    }

    pub fn is_documentation(&self) -> bool {
        self.extension()
            .map(|ext| {
                DOCUMENTATION_EXTENSIONS
                    .iter()
                    .any(|doc| doc.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

/// Ordered list of manifest entries.
///
/// Order is the initial processing order only; nothing relies on it being a
/// dependency order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self { entries }
    }

    /// The one-entry manifest a failed plan degrades to.
    pub fn error(project_root: &str, message: &str) -> Self {
        Self::new(vec![ManifestEntry::new(
            format!("{}/error.txt", project_root),
            format!("Error: {}", message),
        )])
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ManifestEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries that will produce content.
    pub fn file_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_directory()).count()
    }
}

impl From<Vec<ManifestEntry>> for Manifest {
    fn from(entries: Vec<ManifestEntry>) -> Self {
        Self::new(entries)
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ManifestEntry;
    type IntoIter = std::slice::Iter<'a, ManifestEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for Manifest {
    type Item = ManifestEntry;
    type IntoIter = std::vec::IntoIter<ManifestEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Re-roots a model-supplied path under `project_root`.
///
/// Leading `./`, `/` and `../` prefixes are stripped, `.`/`..`/empty segments
/// are dropped, everything else is kept in order. A trailing `/` survives so
/// directory entries stay directories. Dotfiles such as `.env` are untouched.
pub fn normalize_path(raw: &str, project_root: &str) -> String {
    let raw = raw.trim();
    let is_dir = raw.ends_with('/');

    let segments: Vec<&str> = raw
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .collect();

    if segments.is_empty() {
        return format!("{}/", project_root);
    }

    let mut path = format!("{}/{}", project_root, segments.join("/"));
    if is_dir {
        path.push('/');
    }
    path
}
