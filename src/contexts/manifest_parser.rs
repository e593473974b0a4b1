use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::warn;

use crate::data::{Manifest, ManifestEntry, normalize_path};

/// Reasons a plan could not be turned into a manifest.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanningError {
    #[error("Empty output from model.")]
    EmptyOutput,

    #[error("No valid JSON block found.")]
    NoStructuredBlock,

    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    #[error("Invalid manifest format: {0}")]
    InvalidFormat(String),
}

/// Result of parsing a plan, with the degraded case made explicit.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestOutcome {
    Parsed(Manifest),
    /// Parsing failed; `manifest` is the single `error.txt` entry
    Degraded {
        manifest: Manifest,
        error: PlanningError,
    },
}

impl ManifestOutcome {
    pub fn manifest(&self) -> &Manifest {
        match self {
            ManifestOutcome::Parsed(manifest) => manifest,
            ManifestOutcome::Degraded { manifest, .. } => manifest,
        }
    }

    pub fn into_manifest(self) -> Manifest {
        match self {
            ManifestOutcome::Parsed(manifest) => manifest,
            ManifestOutcome::Degraded { manifest, .. } => manifest,
        }
    }

    pub fn error(&self) -> Option<&PlanningError> {
        match self {
            ManifestOutcome::Parsed(_) => None,
            ManifestOutcome::Degraded { error, .. } => Some(error),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ManifestOutcome::Degraded { .. })
    }
}

/// A ```json fence wrapping an array of objects.
fn json_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?i:json)\s*(\[\s*\{.*?\}\s*\]\s*)```").expect("valid regex")
    })
}

/// Parses raw model output into a manifest rooted at `project_root`.
pub fn parse_manifest(output: &str, project_root: &str) -> Result<Manifest, PlanningError> {
    if output.trim().is_empty() {
        return Err(PlanningError::EmptyOutput);
    }

    let block = json_block_re()
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .ok_or(PlanningError::NoStructuredBlock)?;

    let value: Value =
        serde_json::from_str(block).map_err(|e| PlanningError::MalformedJson(e.to_string()))?;

    let items = value
        .as_array()
        .ok_or_else(|| PlanningError::InvalidFormat("expected a JSON array".to_string()))?;

    let mut entries = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let object = item.as_object().ok_or_else(|| {
            PlanningError::InvalidFormat(format!("entry {} is not an object", i))
        })?;
        let path = object.get("path").and_then(Value::as_str).ok_or_else(|| {
            PlanningError::InvalidFormat(format!("entry {} has no string 'path'", i))
        })?;
        let description = object
            .get("description")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                PlanningError::InvalidFormat(format!("entry {} has no string 'description'", i))
            })?;

        entries.push(ManifestEntry::new(
            normalize_path(path, project_root),
            description,
        ));
    }

    Ok(Manifest::new(entries))
}

/// Parses a plan, degrading any failure to the visible `error.txt` manifest.
pub fn parse_manifest_or_degrade(output: &str, project_root: &str) -> ManifestOutcome {
    match parse_manifest(output, project_root) {
        Ok(manifest) => ManifestOutcome::Parsed(manifest),
        Err(error) => {
            warn!("Plan degraded to error manifest: {}", error);
            ManifestOutcome::Degraded {
                manifest: Manifest::error(project_root, &error.to_string()),
                error,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "generated";

    #[test]
    fn parses_fenced_json_manifest() {
        let output = r#"Here is the structure:
```json
[
  {"path": "./src/main.py", "description": "Main application entry point."},
  {"path": "./src/utils/", "description": "Utilities package."}
]
```
Let me know if you need more."#;

        let manifest = parse_manifest(output, ROOT).unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.entries()[0].path, "generated/src/main.py");
        assert_eq!(manifest.entries()[0].description, "Main application entry point.");
        assert_eq!(manifest.entries()[1].path, "generated/src/utils/");
        assert!(manifest.entries()[1].is_directory());
    }

    #[test]
    fn accepts_uppercase_json_tag() {
        let output = "```JSON\n[{\"path\": \"app.py\", \"description\": \"app\"}]\n```";
        let manifest = parse_manifest(output, ROOT).unwrap();
        assert_eq!(manifest.entries()[0].path, "generated/app.py");
    }

    #[test]
    fn rejects_empty_output() {
        assert_eq!(parse_manifest("  \n\t", ROOT), Err(PlanningError::EmptyOutput));
    }

    #[test]
    fn rejects_output_without_json_block() {
        assert_eq!(
            parse_manifest("no json here", ROOT),
            Err(PlanningError::NoStructuredBlock)
        );
        // An untagged fence is not a structured block
        assert_eq!(
            parse_manifest("```\n[{\"path\": \"a\", \"description\": \"b\"}]\n```", ROOT),
            Err(PlanningError::NoStructuredBlock)
        );
    }

    #[test]
    fn reports_malformed_json() {
        let output = "```json\n[{\"path\": \"a.py\", \"description\": }]\n```";
        assert!(matches!(
            parse_manifest(output, ROOT),
            Err(PlanningError::MalformedJson(_))
        ));
    }

    #[test]
    fn reports_missing_keys() {
        let output = "```json\n[{\"path\": \"a.py\"}]\n```";
        assert!(matches!(
            parse_manifest(output, ROOT),
            Err(PlanningError::InvalidFormat(_))
        ));
    }

    #[test]
    fn degrades_to_error_manifest() {
        let outcome = parse_manifest_or_degrade("no json here", ROOT);
        assert!(outcome.is_degraded());
        assert_eq!(outcome.error(), Some(&PlanningError::NoStructuredBlock));

        let manifest = outcome.into_manifest();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.entries()[0].path, "generated/error.txt");
        assert!(manifest.entries()[0].description.starts_with("Error:"));
    }

    #[test]
    fn parsed_outcome_has_no_error() {
        let outcome = parse_manifest_or_degrade(
            "```json\n[{\"path\": \"a.py\", \"description\": \"a\"}]\n```",
            ROOT,
        );
        assert!(!outcome.is_degraded());
        assert!(outcome.error().is_none());
        assert_eq!(outcome.manifest().len(), 1);
    }
}
