//! Build scheduler: turns a manifest into files, one generation at a time.
//!
//! Every file sees the content generated so far in this run as dependency
//! context. A path that comes up again (a duplicate entry or a requeue) and
//! yields different content is queued once more, up to a per-path bound;
//! past the bound it is reported as unstable instead of looping.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::code_extractor::{Extraction, extract_code_blocks};
use super::prompt_builder::{PromptBuilder, PromptError};
use super::text_generator::{TextGenerator, is_error_text};
use crate::data::{GenerationLog, Manifest, ManifestEntry, ProjectStore, StoreError, WorkQueue};
use crate::registries::PromptRegistry;

/// Status text of a build in which every file stabilized.
pub const BUILD_SUCCESS: &str = "Project built successfully!";

/// Default bound on requeues per path.
pub const DEFAULT_MAX_REGENERATIONS: u32 = 3;

/// Faults that abort a build. Model and extraction failures never do.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The store refused a write. This includes a manifest that lists a
    /// directory without a trailing `/` (`src`) next to files inside it
    /// (`src/main.py`): `src` is written as a file, so `src/` cannot be
    /// created afterwards and the build stops without a report.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Directory entry, created without a generation call
    Directory,
    /// Latest generation produced content
    Generated,
    /// Latest generation was a provider error, persisted as the file content
    Failed,
    /// Content kept changing after the regeneration bound was reached
    Unstable,
}

/// Per-path result of a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub path: String,
    pub status: FileStatus,
    pub generations: u32,
    pub requeues: u32,
}

/// Summary of one build run, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub files: Vec<FileOutcome>,
    pub generation_calls: usize,
    pub requeues: usize,
}

impl BuildReport {
    pub fn outcome(&self, path: &str) -> Option<&FileOutcome> {
        self.files.iter().find(|f| f.path == path)
    }

    fn outcome_mut(&mut self, path: &str, status: FileStatus) -> &mut FileOutcome {
        let index = match self.files.iter().position(|f| f.path == path) {
            Some(i) => i,
            None => {
                self.files.push(FileOutcome {
                    path: path.to_string(),
                    status,
                    generations: 0,
                    requeues: 0,
                });
                self.files.len() - 1
            }
        };
        &mut self.files[index]
    }

    pub fn paths_with_status(&self, status: FileStatus) -> Vec<&str> {
        self.files
            .iter()
            .filter(|f| f.status == status)
            .map(|f| f.path.as_str())
            .collect()
    }

    /// True when no file ended unstable.
    pub fn is_stable(&self) -> bool {
        self.files.iter().all(|f| f.status != FileStatus::Unstable)
    }

    pub fn status(&self) -> String {
        if self.is_stable() {
            return BUILD_SUCCESS.to_string();
        }
        let unstable = self.paths_with_status(FileStatus::Unstable);
        format!(
            "Project built, but {} file(s) could not stabilize: {}",
            unstable.len(),
            unstable.join(", ")
        )
    }
}

/// Drives the generate-extract-persist loop over a manifest.
pub struct ProjectBuilder<'a, G, S, R>
where
    G: TextGenerator + ?Sized,
    S: ProjectStore + ?Sized,
    R: PromptRegistry,
{
    generator: &'a G,
    store: &'a S,
    prompts: &'a PromptBuilder<R>,
    max_regenerations: u32,
}

impl<'a, G, S, R> ProjectBuilder<'a, G, S, R>
where
    G: TextGenerator + ?Sized,
    S: ProjectStore + ?Sized,
    R: PromptRegistry,
{
    pub fn new(generator: &'a G, store: &'a S, prompts: &'a PromptBuilder<R>) -> Self {
        Self {
            generator,
            store,
            prompts,
            max_regenerations: DEFAULT_MAX_REGENERATIONS,
        }
    }

    pub fn with_max_regenerations(mut self, max_regenerations: u32) -> Self {
        self.max_regenerations = max_regenerations;
        self
    }

    /// Builds every manifest entry until the queue drains.
    pub async fn build(&self, manifest: &Manifest) -> Result<BuildReport, BuildError> {
        let mut queue = WorkQueue::from_manifest(manifest);
        let mut log = GenerationLog::new();
        let mut report = BuildReport::default();

        info!(
            "Building {} file(s) from {} manifest entries",
            manifest.file_count(),
            manifest.len()
        );

        while let Some(entry) = queue.pop() {
            self.step(entry, &mut queue, &mut log, &mut report).await?;
        }

        info!(
            "Build finished after {} generation call(s), {} requeue(s)",
            report.generation_calls, report.requeues
        );
        Ok(report)
    }

    /// Processes one popped entry against the shared queue and log.
    pub async fn step(
        &self,
        entry: ManifestEntry,
        queue: &mut WorkQueue,
        log: &mut GenerationLog,
        report: &mut BuildReport,
    ) -> Result<(), BuildError> {
        if entry.is_directory() {
            debug!("Ensuring directory {}", entry.path);
            self.store.ensure_dir(&entry.path)?;
            report.outcome_mut(&entry.path, FileStatus::Directory);
            return Ok(());
        }

        let prompt = self.prompts.file_prompt(&entry, log)?;
        debug!("Prompt for {}:\n{}", entry.path, prompt);

        info!("Generating {} ({} pending)", entry.path, queue.len());
        let raw = self.generator.generate(&prompt).await;
        report.generation_calls += 1;

        let (generated, status) = match extract_code_blocks(&raw) {
            Extraction::NoCode if is_error_text(&raw) => {
                warn!("Generation failed for {}: {}", entry.path, raw);
                (raw.trim().to_string(), FileStatus::Failed)
            }
            extraction => (extraction.into_text(), FileStatus::Generated),
        };

        let changed = log.contains(&entry.path) && log.previous_content(&entry.path) != generated;

        let max_regenerations = self.max_regenerations;
        let outcome = report.outcome_mut(&entry.path, status);
        outcome.generations += 1;
        outcome.status = status;

        let requeue = changed && outcome.requeues < max_regenerations;
        if requeue {
            outcome.requeues += 1;
        } else if changed {
            outcome.status = FileStatus::Unstable;
            warn!(
                "{} could not stabilize after {} regeneration(s)",
                entry.path, outcome.requeues
            );
        }

        self.store.write_file(&entry.path, &generated)?;
        log.record(&entry.path, generated);

        if requeue {
            debug!("Content of {} changed, queueing it again", entry.path);
            report.requeues += 1;
            queue.requeue(entry);
        }

        Ok(())
    }
}
