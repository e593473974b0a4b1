//! Workspace settings: `scaffolder.yml` plus environment overrides.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

use crate::contexts::DEFAULT_MAX_REGENERATIONS;
use crate::data::DEFAULT_PROJECT_ROOT;
use crate::providers::Provider;

pub const SETTINGS_FILE: &str = "scaffolder.yml";
pub const DEFAULT_STATE_DIR: &str = ".scaffolder";

pub const PROVIDER_ENV: &str = "SCAFFOLDER_PROVIDER";
pub const MODEL_ENV: &str = "SCAFFOLDER_MODEL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {source}")]
    Read {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    Parse { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },
}

/// Everything the commands need to know about providers and paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub provider: Provider,
    /// Falls back to the provider's default model
    pub model: Option<String>,
    /// Model used for the plan phase only
    pub plan_model: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub request_timeout_secs: u64,
    pub request_retries: u32,
    pub project_root: String,
    pub state_dir: String,
    pub prompts_dir: Option<String>,
    pub max_regenerations: u32,
    pub cache: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: None,
            plan_model: None,
            base_url: None,
            max_tokens: None,
            temperature: None,
            request_timeout_secs: 120,
            request_retries: 2,
            project_root: DEFAULT_PROJECT_ROOT.to_string(),
            state_dir: DEFAULT_STATE_DIR.to_string(),
            prompts_dir: None,
            max_regenerations: DEFAULT_MAX_REGENERATIONS,
            cache: false,
        }
    }
}

impl Settings {
    /// Loads `scaffolder.yml` from `workspace`, or defaults when it is absent,
    /// then applies `SCAFFOLDER_*` overrides from the process environment.
    pub fn load(workspace: &Path) -> Result<Self, ConfigError> {
        let lookup = |name: &str| std::env::var(name).ok();
        let path = workspace.join(SETTINGS_FILE);

        let mut settings = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Self::parse(&contents, lookup)?
        } else {
            Self::default()
        };

        settings.apply_overrides(lookup)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parses YAML after expanding `${VAR}` references through `lookup`.
    pub fn parse(contents: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents, lookup)?;
        if expanded.trim().is_empty() {
            return Ok(Self::default());
        }

        let settings: Settings = serde_yaml::from_str(&expanded).map_err(|e| ConfigError::Parse {
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(provider) = lookup(PROVIDER_ENV).filter(|v| !v.is_empty()) {
            self.provider = provider.parse().map_err(|message| ConfigError::Validation { message })?;
        }
        if let Some(model) = lookup(MODEL_ENV).filter(|v| !v.is_empty()) {
            self.model = Some(model);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tokens == Some(0) {
            return Err(ConfigError::Validation {
                message: "max_tokens must be greater than 0".to_string(),
            });
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Validation {
                message: "request_timeout_secs must be greater than 0".to_string(),
            });
        }

        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::Validation {
                    message: "temperature must be between 0.0 and 2.0".to_string(),
                });
            }
        }

        for (name, value) in [("project_root", &self.project_root), ("state_dir", &self.state_dir)] {
            if !is_single_segment(value) {
                return Err(ConfigError::Validation {
                    message: format!("{} must be a single relative directory name, got '{}'", name, value),
                });
            }
        }

        if self.project_root == self.state_dir {
            return Err(ConfigError::Validation {
                message: "project_root and state_dir must differ".to_string(),
            });
        }

        Ok(())
    }

    /// Model for regular file generation.
    pub fn build_model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_string())
    }

    /// Model for the plan phase, `plan_model` when set.
    pub fn plan_model(&self) -> String {
        self.plan_model.clone().unwrap_or_else(|| self.build_model())
    }

    pub fn state_path(&self, workspace: &Path) -> PathBuf {
        workspace.join(&self.state_dir)
    }

    pub fn cache_path(&self, workspace: &Path) -> PathBuf {
        self.state_path(workspace).join("cache")
    }

    pub fn project_path(&self, workspace: &Path) -> PathBuf {
        workspace.join(&self.project_root)
    }

    pub fn prompts_path(&self, workspace: &Path) -> Option<PathBuf> {
        self.prompts_dir.as_ref().map(|dir| workspace.join(dir))
    }
}

/// Loads `<workspace>/.env`, or the nearest `.env` above the current
/// directory when the workspace has none.
///
/// Returns the loaded file, `None` when there is no `.env` anywhere, or the
/// error for an unreadable or malformed file.
pub fn load_dotenv(workspace: &Path) -> Result<Option<PathBuf>, dotenvy::Error> {
    let env_file = workspace.join(".env");
    if env_file.exists() {
        dotenvy::from_path(&env_file)?;
        return Ok(Some(env_file));
    }

    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

fn is_single_segment(value: &str) -> bool {
    let mut components = Path::new(value).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn env_var_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").expect("valid regex"))
}

/// Expands `${VAR}` and `${VAR:-default}`.
///
/// A variable that is unset and has no default is an error.
pub fn expand_env_vars(
    content: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(content.len());
    let mut last = 0;

    for cap in env_var_re().captures_iter(content) {
        let Some(full) = cap.get(0) else { continue };
        let var_name = &cap[1];

        let value = match lookup(var_name) {
            Some(v) => v,
            None => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                None => {
                    return Err(ConfigError::EnvVarNotFound {
                        var: var_name.to_string(),
                    });
                }
            },
        };

        result.push_str(&content[last..full.start()]);
        result.push_str(&value);
        last = full.end();
    }

    result.push_str(&content[last..]);
    Ok(result)
}
