use serde::Serialize;
use serde_json::Value;

use crate::data::{GenerationLog, ManifestEntry};
use crate::registries::{BUILD_FILE_PROMPT, PLAN_PROMPT, PromptRegistry, README_PROMPT};

/// Errors raised while turning a template into a prompt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    #[error("Required placeholder '{0}' could not be resolved")]
    MissingPlaceholder(String),

    #[error("Invalid path '{0}' in placeholder")]
    InvalidPlaceholderPath(String),

    #[error("Prompt template '{0}' not found")]
    TemplateNotFound(String),

    #[error("Prompt template is invalid: {0}")]
    InvalidTemplate(String),
}

#[derive(Serialize)]
struct PlanInput<'a> {
    instruction: &'a str,
    framework: &'a str,
}

#[derive(Serialize)]
struct FileInput<'a> {
    dependencies: String,
    path: &'a str,
    description: &'a str,
    extension: &'a str,
}

/// Assembles plan and per-file prompts from registry templates.
pub struct PromptBuilder<R: PromptRegistry> {
    registry: R,
}

impl<R: PromptRegistry> PromptBuilder<R> {
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    pub fn plan_prompt(&self, instruction: &str, framework: &str) -> Result<String, PromptError> {
        let template = self.registry.get_template(PLAN_PROMPT)?;
        render_template(&template, &PlanInput { instruction, framework })
    }

    /// Prompt for one manifest entry, with everything generated so far (other
    /// than the entry itself) as dependency context.
    pub fn file_prompt(&self, entry: &ManifestEntry, log: &GenerationLog) -> Result<String, PromptError> {
        let template = self.registry.get_template(BUILD_FILE_PROMPT)?;
        let input = FileInput {
            dependencies: dependency_context(&entry.path, log),
            path: &entry.path,
            description: &entry.description,
            extension: entry.extension().unwrap_or(""),
        };
        let mut prompt = render_template(&template, &input)?;

        if entry.is_documentation() {
            let readme = self.registry.get_template(README_PROMPT)?;
            prompt.push(' ');
            prompt.push_str(render_template(&readme, &input)?.trim());
        }

        Ok(prompt)
    }
}

/// Renders every logged file except `path` as a labeled dependency block.
pub fn dependency_context(path: &str, log: &GenerationLog) -> String {
    log.dependencies_of(path)
        .map(|file| format!("### Dependency: {}\n{}", file.path, file.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replaces placeholders in `template` with values from `input`.
///
/// Supports:
/// - Mandatory: `{{input.prop}}`
/// - Optional: `{{input.prop?}}`, removed when absent
/// - Nested: `{{input.prop1.prop2}}`
pub fn render_template<T: Serialize>(template: &str, input: &T) -> Result<String, PromptError> {
    let input_json =
        serde_json::to_value(input).map_err(|e| PromptError::InvalidTemplate(e.to_string()))?;

    let mut result = template.to_string();
    let mut offset = 0;

    while let Some(start) = result[offset..].find("{{") {
        let start = offset + start;
        let Some(end_pos) = result[start..].find("}}") else {
            break;
        };
        let end = start + end_pos;

        let placeholder = result[start + 2..end].trim();
        let (path, is_optional) = match placeholder.strip_suffix('?') {
            Some(path) => (path, true),
            None => (placeholder, false),
        };

        match resolve_path(&input_json, path)? {
            Some(value) => {
                let replacement = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Null => String::new(),
                    other => serde_json::to_string(other)
                        .map_err(|e| PromptError::InvalidTemplate(e.to_string()))?,
                };
                result.replace_range(start..end + 2, &replacement);
                offset = start + replacement.len();
            }
            None if is_optional => {
                result.replace_range(start..end + 2, "");
                offset = start;
            }
            None => return Err(PromptError::MissingPlaceholder(path.to_string())),
        }
    }

    Ok(result)
}

/// Resolves a dotted `input.a.b` path. The first segment must be `input`.
fn resolve_path<'a>(value: &'a Value, path: &str) -> Result<Option<&'a Value>, PromptError> {
    let mut parts = path.split('.');
    if parts.next() != Some("input") {
        return Err(PromptError::InvalidPlaceholderPath(path.to_string()));
    }

    let mut current = value;
    for part in parts {
        match current.get(part) {
            Some(v) => current = v,
            None => return Ok(None),
        }
    }

    Ok(Some(current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registries::FilePromptRegistry;

    #[derive(Serialize)]
    struct Location {
        city: String,
    }

    #[derive(Serialize)]
    struct Input {
        name: String,
        count: u32,
        location: Location,
    }

    fn input() -> Input {
        Input {
            name: "Alice".to_string(),
            count: 3,
            location: Location { city: "Paris".to_string() },
        }
    }

    fn builder() -> PromptBuilder<FilePromptRegistry> {
        PromptBuilder::new(FilePromptRegistry::builtin())
    }

    #[test]
    fn renders_mandatory_optional_and_nested_placeholders() {
        let rendered = render_template(
            "{{input.name}} has {{input.count}} in {{input.location.city}}{{input.age?}}",
            &input(),
        )
        .unwrap();
        assert_eq!(rendered, "Alice has 3 in Paris");
    }

    #[test]
    fn missing_mandatory_placeholder_fails() {
        assert_eq!(
            render_template("{{input.age}}", &input()),
            Err(PromptError::MissingPlaceholder("input.age".to_string()))
        );
    }

    #[test]
    fn placeholder_must_start_with_input() {
        assert_eq!(
            render_template("{{output.name}}", &input()),
            Err(PromptError::InvalidPlaceholderPath("output.name".to_string()))
        );
    }

    #[test]
    fn replacement_values_are_not_rescanned() {
        #[derive(Serialize)]
        struct Raw {
            text: String,
        }
        let rendered = render_template(
            "[{{input.text}}]",
            &Raw { text: "{{input.text}}".to_string() },
        )
        .unwrap();
        assert_eq!(rendered, "[{{input.text}}]");
    }

    #[test]
    fn dependency_context_lists_other_files_in_generation_order() {
        let mut log = GenerationLog::new();
        log.record("generated/utils.py", "def helper(): pass".to_string());
        log.record("generated/main.py", "import utils".to_string());

        let context = dependency_context("generated/main.py", &log);
        assert_eq!(context, "### Dependency: generated/utils.py\ndef helper(): pass");
    }

    #[test]
    fn file_prompt_carries_path_description_and_dependencies() {
        let mut log = GenerationLog::new();
        log.record("generated/utils.py", "def helper(): pass".to_string());

        let entry = ManifestEntry::new("generated/main.py", "Entry point.");
        let prompt = builder().file_prompt(&entry, &log).unwrap();

        assert!(prompt.contains("### Dependency: generated/utils.py"));
        assert!(prompt.contains("generated/main.py"));
        assert!(prompt.contains("Entry point."));
        assert!(prompt.contains("main application"));
        assert!(!prompt.contains("README"));
    }

    #[test]
    fn documentation_entries_ask_for_a_readme() {
        let entry = ManifestEntry::new("generated/README.md", "Project overview.");
        let prompt = builder().file_prompt(&entry, &GenerationLog::new()).unwrap();
        assert!(prompt.contains("professional README"));
    }

    #[test]
    fn plan_prompt_names_instruction_and_framework() {
        let prompt = builder().plan_prompt("Say hello world", "Flask").unwrap();
        assert!(prompt.contains("Instruction: Say hello world"));
        assert!(prompt.contains("Framework: Flask"));
        assert!(prompt.contains("```json"));
    }
}
