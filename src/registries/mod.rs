mod prompt_registry;

pub use prompt_registry::{
    BUILD_FILE_PROMPT, FilePromptRegistry, PLAN_PROMPT, PromptRegistry, README_PROMPT,
    builtin_template,
};
