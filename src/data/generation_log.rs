use std::collections::HashMap;

/// Latest generated content for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
    /// How many times this path has been generated in the current run
    pub revision: u32,
}

/// Ordered log of everything generated so far in one build run.
///
/// Entries keep the position of their first generation; regenerating a path
/// replaces its content in place. This order is the order in which dependency
/// context is presented to later generations.
#[derive(Debug, Default)]
pub struct GenerationLog {
    files: Vec<GeneratedFile>,
    index: HashMap<String, usize>,
}

impl GenerationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<&GeneratedFile> {
        self.index.get(path).map(|&i| &self.files[i])
    }

    /// Content previously generated for `path`, empty if none.
    pub fn previous_content(&self, path: &str) -> &str {
        self.get(path).map(|f| f.content.as_str()).unwrap_or("")
    }

    /// Records new content for `path`, returning the content it replaced.
    pub fn record(&mut self, path: &str, content: String) -> Option<String> {
        match self.index.get(path) {
            Some(&i) => {
                let file = &mut self.files[i];
                file.revision += 1;
                Some(std::mem::replace(&mut file.content, content))
            }
            None => {
                self.index.insert(path.to_string(), self.files.len());
                self.files.push(GeneratedFile {
                    path: path.to_string(),
                    content,
                    revision: 1,
                });
                None
            }
        }
    }

    /// Every logged file except `path`, in order of first generation.
    pub fn dependencies_of<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a GeneratedFile> {
        self.files.iter().filter(move |f| f.path != path)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GeneratedFile> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_returns_previous_content() {
        let mut log = GenerationLog::new();
        assert_eq!(log.record("a.py", "v1".to_string()), None);
        assert_eq!(log.record("a.py", "v2".to_string()), Some("v1".to_string()));
        assert_eq!(log.previous_content("a.py"), "v2");
        assert_eq!(log.get("a.py").unwrap().revision, 2);
        assert_eq!(log.previous_content("missing.py"), "");
    }

    #[test]
    fn regenerated_path_keeps_first_position() {
        let mut log = GenerationLog::new();
        log.record("a.py", "a".to_string());
        log.record("b.py", "b".to_string());
        log.record("a.py", "a2".to_string());

        let order: Vec<&str> = log.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(order, vec!["a.py", "b.py"]);
    }

    #[test]
    fn dependencies_exclude_the_target() {
        let mut log = GenerationLog::new();
        log.record("a.py", "a".to_string());
        log.record("b.py", "b".to_string());

        let deps: Vec<&str> = log.dependencies_of("a.py").map(|f| f.path.as_str()).collect();
        assert_eq!(deps, vec!["b.py"]);
    }
}
