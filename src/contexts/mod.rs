mod cached_generator;
mod code_extractor;
mod file_cache;
mod file_store;
mod manifest_parser;
mod planner;
mod project_builder;
mod prompt_builder;
mod snapshot;
mod text_generator;
mod validator;

pub use cached_generator::CachedGenerator;
pub use code_extractor::{Extraction, NO_CODE_SENTINEL, extract_code, extract_code_blocks};
pub use file_cache::FileCache;
pub use file_store::FileProjectStore;
pub use manifest_parser::{ManifestOutcome, PlanningError, parse_manifest, parse_manifest_or_degrade};
pub use planner::Planner;
pub use project_builder::{
    BUILD_SUCCESS, BuildError, BuildReport, DEFAULT_MAX_REGENERATIONS, FileOutcome, FileStatus,
    ProjectBuilder,
};
pub use prompt_builder::{PromptBuilder, PromptError, dependency_context, render_template};
pub use snapshot::{FileSnapshot, snapshot_directory};
pub use text_generator::{GenerationError, TextGenerator, is_error_text};
pub use validator::{ValidationRecord, validate_manifest};
