mod http;
mod huggingface;
mod openai;

pub use http::{RequestOptions, clean_error_body, send_with_retry};
pub use huggingface::{HUGGINGFACE_DEFAULT_MODEL, HuggingFaceGenerator};
pub use openai::{CODE_GENERATOR_SYSTEM_PROMPT, OPENAI_DEFAULT_MODEL, OpenAiGenerator};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use crate::config::Settings;
use crate::contexts::{CachedGenerator, GenerationError, TextGenerator};

/// Which hosted model API answers prompts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "huggingface")]
    HuggingFace,
}

impl Provider {
    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAi => OPENAI_DEFAULT_MODEL,
            Provider::HuggingFace => HUGGINGFACE_DEFAULT_MODEL,
        }
    }

    pub fn api_key_env(self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::HuggingFace => "HF_API_KEY",
        }
    }

    /// Fixed instructions sent alongside every prompt, if any.
    pub fn system_context(self) -> &'static str {
        match self {
            Provider::OpenAi => CODE_GENERATOR_SYSTEM_PROMPT,
            Provider::HuggingFace => "",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAi => write!(f, "openai"),
            Provider::HuggingFace => write!(f, "huggingface"),
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "huggingface" | "hf" => Ok(Provider::HuggingFace),
            other => Err(format!(
                "unknown provider '{}' (expected 'openai' or 'huggingface')",
                other
            )),
        }
    }
}

/// Which phase a generator serves; the plan phase may use its own model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelPhase {
    Plan,
    Build,
}

fn api_key(provider: Provider) -> Result<String, GenerationError> {
    let var = provider.api_key_env();
    std::env::var(var)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| GenerationError::MissingApiKey(format!("{} not set", var)))
}

/// Builds the configured generator for `phase`, wrapped in the response cache
/// when caching is enabled.
pub fn build_generator(
    settings: &Settings,
    workspace: &Path,
    phase: ModelPhase,
) -> Result<Box<dyn TextGenerator>, GenerationError> {
    let model = match phase {
        ModelPhase::Plan => settings.plan_model(),
        ModelPhase::Build => settings.build_model(),
    };
    let options = RequestOptions::from_settings(settings);
    let key = api_key(settings.provider)?;

    debug!("Using {} model {} for {:?}", settings.provider, model, phase);
    let generator: Box<dyn TextGenerator> = match settings.provider {
        Provider::OpenAi => Box::new(OpenAiGenerator::new(key, model, options)?),
        Provider::HuggingFace => Box::new(HuggingFaceGenerator::new(key, model, options)?),
    };

    if settings.cache {
        let cache_dir = settings.cache_path(workspace);
        info!("Response cache enabled at {}", cache_dir.display());
        return Ok(Box::new(CachedGenerator::new(
            generator,
            cache_dir,
            settings.provider.system_context(),
        )));
    }

    Ok(generator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_names() {
        assert_eq!("openai".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!("HuggingFace".parse::<Provider>().unwrap(), Provider::HuggingFace);
        assert_eq!("hf".parse::<Provider>().unwrap(), Provider::HuggingFace);
        assert!("anthropic".parse::<Provider>().is_err());
    }

    #[test]
    fn display_matches_config_spelling() {
        for provider in [Provider::OpenAi, Provider::HuggingFace] {
            let yaml = serde_yaml::to_string(&provider).unwrap();
            assert_eq!(yaml.trim(), provider.to_string());
        }
    }

    #[test]
    fn error_display() {
        let err = GenerationError::Api {
            status: 401,
            message: "invalid api key".into(),
        };
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("invalid api key"));

        let err = GenerationError::MissingApiKey("OPENAI_API_KEY not set".into());
        assert!(err.to_string().contains("missing API key"));
    }
}
