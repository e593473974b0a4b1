use crate::contexts::PromptError;
use std::fs;
use std::path::PathBuf;

pub const PLAN_PROMPT: &str = "plan";
pub const BUILD_FILE_PROMPT: &str = "build_file";
pub const README_PROMPT: &str = "readme";

const DEFAULT_PLAN_TEMPLATE: &str = r#"Based on the following instruction and selected framework, generate a project structure as a JSON list of dictionaries.
Instruction: {{input.instruction}}
Framework: {{input.framework}}

Format each entry with 'path' (file path) and 'description' (purpose of the file). Directories end with '/'.
Return the list inside a single ```json fenced code block.
Example:
```json
[{"path": "./src/main.py", "description": "Main application entry point."}, {"path": "./src/utils/logging.py", "description": "Logging utilities."}]
```"#;

const DEFAULT_BUILD_FILE_TEMPLATE: &str = r#"You are building a project. The following dependencies have been written:

{{input.dependencies}}

Now create or update the file at '{{input.path}}' based on its purpose:
{{input.description}}

If the file is a main application, ensure it calls all dependencies correctly. Output only the code required for this file. Do not include explanations, comments, or additional context. Simply return the raw code content inside a single fenced code block."#;

const DEFAULT_README_TEMPLATE: &str = "Please create a professional README of this project.";

/// Source of prompt templates by name.
pub trait PromptRegistry {
    fn get_template(&self, name: &str) -> Result<String, PromptError>;
}

/// Built-in template for `name`, if there is one.
pub fn builtin_template(name: &str) -> Option<&'static str> {
    match name {
        PLAN_PROMPT => Some(DEFAULT_PLAN_TEMPLATE),
        BUILD_FILE_PROMPT => Some(DEFAULT_BUILD_FILE_TEMPLATE),
        README_PROMPT => Some(DEFAULT_README_TEMPLATE),
        _ => None,
    }
}

/// Loads templates from `{prompts_dir}/{name}.yml`, falling back to the
/// built-in template when no override file exists.
#[derive(Clone, Debug)]
pub struct FilePromptRegistry {
    prompts_dir: Option<PathBuf>,
}

impl FilePromptRegistry {
    pub fn new(prompts_dir: impl Into<PathBuf>) -> Self {
        Self {
            prompts_dir: Some(prompts_dir.into()),
        }
    }

    /// Registry that only serves the built-in templates.
    pub fn builtin() -> Self {
        Self { prompts_dir: None }
    }
}

impl PromptRegistry for FilePromptRegistry {
    fn get_template(&self, name: &str) -> Result<String, PromptError> {
        if let Some(dir) = &self.prompts_dir {
            let path = dir.join(format!("{}.yml", name));
            if path.exists() {
                let content = fs::read_to_string(&path).map_err(|e| {
                    PromptError::InvalidTemplate(format!(
                        "Failed to read prompt template {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                return extract_template(&content);
            }
        }

        builtin_template(name)
            .map(str::to_string)
            .ok_or_else(|| PromptError::TemplateNotFound(name.to_string()))
    }
}

/// Extracts the `template` field from a YAML prompt file.
fn extract_template(yaml_content: &str) -> Result<String, PromptError> {
    use yaml_rust::YamlLoader;

    let docs = YamlLoader::load_from_str(yaml_content)
        .map_err(|e| PromptError::InvalidTemplate(format!("Invalid YAML: {}", e)))?;

    let Some(doc) = docs.first() else {
        return Err(PromptError::InvalidTemplate("Empty YAML document".to_string()));
    };

    doc["template"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| PromptError::InvalidTemplate("No template field found".to_string()))
}
