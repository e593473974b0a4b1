use tracing::{debug, info, warn};

use super::manifest_parser::{ManifestOutcome, parse_manifest_or_degrade};
use super::prompt_builder::{PromptBuilder, PromptError};
use super::text_generator::{TextGenerator, is_error_text};
use crate::registries::PromptRegistry;

/// Plan phase: asks the model for a manifest and parses its answer.
pub struct Planner<'a, G, R>
where
    G: TextGenerator + ?Sized,
    R: PromptRegistry,
{
    generator: &'a G,
    prompts: &'a PromptBuilder<R>,
    project_root: String,
}

impl<'a, G, R> Planner<'a, G, R>
where
    G: TextGenerator + ?Sized,
    R: PromptRegistry,
{
    pub fn new(generator: &'a G, prompts: &'a PromptBuilder<R>, project_root: impl Into<String>) -> Self {
        Self {
            generator,
            prompts,
            project_root: project_root.into(),
        }
    }

    /// Produces a manifest for `instruction` targeting `framework`.
    ///
    /// Model failures and unparseable answers come back as a degraded outcome,
    /// never as an error. Only a broken prompt template fails.
    pub async fn plan(&self, instruction: &str, framework: &str) -> Result<ManifestOutcome, PromptError> {
        let prompt = self.prompts.plan_prompt(instruction, framework)?;
        debug!("Plan prompt:\n{}", prompt);

        info!("Requesting project manifest from {}", self.generator.model_name());
        let output = self.generator.generate(&prompt).await;
        if is_error_text(&output) {
            warn!("Plan request failed: {}", output);
        } else {
            debug!("Plan output:\n{}", output);
        }

        let outcome = parse_manifest_or_degrade(&output, &self.project_root);
        if let ManifestOutcome::Parsed(manifest) = &outcome {
            info!("Manifest has {} entries", manifest.len());
        }
        Ok(outcome)
    }
}
