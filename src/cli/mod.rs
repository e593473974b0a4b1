use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

mod progress;

use progress::ProgressIndicator;
use scaffolder::checkpoint::{
    BuildRecord, CheckpointStore, PlanRecord, ValidationRecordSet, manifest_digest,
};
use scaffolder::config::Settings;
use scaffolder::contexts::{
    BuildReport, FileProjectStore, Planner, ProjectBuilder, PromptBuilder, ValidationRecord,
    snapshot_directory, validate_manifest,
};
use scaffolder::data::{Manifest, ManifestEntry};
use scaffolder::providers::{ModelPhase, build_generator};
use scaffolder::registries::FilePromptRegistry;
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct Config {
    pub workspace: PathBuf,
    pub verbose: bool,
    pub dry_run: bool,
    pub cache: bool,
}

fn load_settings(config: &Config) -> Result<Settings> {
    let mut settings = Settings::load(&config.workspace).with_context(|| {
        format!("Failed to load settings from {}", config.workspace.display())
    })?;
    if config.cache {
        settings.cache = true;
    }
    if config.verbose {
        println!(
            "Provider: {} (plan model {}, build model {})",
            settings.provider,
            settings.plan_model(),
            settings.build_model()
        );
    }
    Ok(settings)
}

fn checkpoints(settings: &Settings, config: &Config) -> CheckpointStore {
    CheckpointStore::new(settings.state_path(&config.workspace))
}

fn prompt_builder(settings: &Settings, config: &Config) -> PromptBuilder<FilePromptRegistry> {
    let registry = match settings.prompts_path(&config.workspace) {
        Some(dir) => FilePromptRegistry::new(dir),
        None => FilePromptRegistry::builtin(),
    };
    PromptBuilder::new(registry)
}

pub async fn plan(instruction: String, framework: String, config: &Config) -> Result<()> {
    let settings = load_settings(config)?;
    plan_phase(&instruction, &framework, &settings, config).await?;
    Ok(())
}

pub async fn build(config: &Config) -> Result<()> {
    let settings = load_settings(config)?;
    let plan = checkpoints(&settings, config).load_plan()?;
    build_phase(&plan.payload.manifest, &settings, config).await?;
    Ok(())
}

pub async fn validate(config: &Config) -> Result<()> {
    let settings = load_settings(config)?;
    let build = checkpoints(&settings, config).load_build()?;
    validate_phase(&build.payload.manifest, &settings, config)?;
    Ok(())
}

/// Plan, build and validate in one go.
pub async fn run(instruction: String, framework: String, config: &Config) -> Result<()> {
    let settings = load_settings(config)?;

    let Some(manifest) = plan_phase(&instruction, &framework, &settings, config).await? else {
        return Ok(());
    };
    if build_phase(&manifest, &settings, config).await?.is_none() {
        return Ok(());
    }
    validate_phase(&manifest, &settings, config)?;
    Ok(())
}

/// Returns the manifest, or `None` on a dry run.
async fn plan_phase(
    instruction: &str,
    framework: &str,
    settings: &Settings,
    config: &Config,
) -> Result<Option<Manifest>> {
    let prompts = prompt_builder(settings, config);

    if config.dry_run {
        let prompt = prompts.plan_prompt(instruction, framework)?;
        println!("[DRY RUN] Would send plan prompt to {}:\n", settings.plan_model());
        println!("{}", prompt);
        return Ok(None);
    }

    let generator = build_generator(settings, &config.workspace, ModelPhase::Plan)?;
    println!("Planning {} project with {}", framework, generator.model_name());

    let outcome = Planner::new(generator.as_ref(), &prompts, &settings.project_root)
        .plan(instruction, framework)
        .await?;

    let planning_error = outcome.error().map(|e| e.to_string());
    if let Some(error) = &planning_error {
        eprintln!("⚠ Planning degraded: {}", error);
    }

    let manifest = outcome.into_manifest();
    println!("{}", format_manifest(&manifest));

    let path = checkpoints(settings, config).save_plan(&PlanRecord {
        instruction: instruction.to_string(),
        framework: framework.to_string(),
        manifest: manifest.clone(),
        planning_error,
    })?;
    println!("✓ Saved manifest to {}", path.display());

    Ok(Some(manifest))
}

/// Returns the build report, or `None` on a dry run.
async fn build_phase(
    manifest: &Manifest,
    settings: &Settings,
    config: &Config,
) -> Result<Option<BuildReport>> {
    if config.dry_run {
        for entry in manifest {
            if entry.is_directory() {
                println!("[DRY RUN] Would create directory {}", entry.path);
            } else {
                println!("[DRY RUN] Would generate {}", entry.path);
            }
        }
        return Ok(None);
    }

    let generator = build_generator(settings, &config.workspace, ModelPhase::Build)?;
    let store = FileProjectStore::new(&config.workspace);
    let prompts = prompt_builder(settings, config);

    let progress = ProgressIndicator::new(manifest.len());
    progress.start(generator.model_name());

    let report = ProjectBuilder::new(generator.as_ref(), &store, &prompts)
        .with_max_regenerations(settings.max_regenerations)
        .build(manifest)
        .await?;

    progress.finish(&report);
    println!("{}", report.status());

    let path = checkpoints(settings, config).save_build(&BuildRecord {
        manifest: manifest.clone(),
        report: report.clone(),
    })?;
    if config.verbose {
        println!("Saved build record to {}", path.display());
    }

    Ok(Some(report))
}

fn validate_phase(
    manifest: &Manifest,
    settings: &Settings,
    config: &Config,
) -> Result<Vec<ValidationRecord>> {
    let store = FileProjectStore::new(&config.workspace);
    let records = validate_manifest(manifest, &store);
    println!("{}", format_validation(&records));

    let failed = records.iter().filter(|r| !r.validation).count();
    if failed > 0 {
        warn!("{} of {} entries failed validation", failed, records.len());
    } else {
        info!("All {} entries validated", records.len());
    }

    if config.dry_run {
        println!("[DRY RUN] Validation record not saved");
        return Ok(records);
    }

    let path = checkpoints(settings, config).save_validation(&ValidationRecordSet {
        manifest: manifest.clone(),
        records: records.clone(),
    })?;
    println!("✓ Saved validation to {}", path.display());

    Ok(records)
}

/// Lists the generated project, or prints one file when `path` is given.
///
/// `path` is relative to the project root; a leading project root segment is
/// accepted too.
pub async fn explore(path: Option<String>, config: &Config) -> Result<()> {
    let settings = load_settings(config)?;
    let project_dir = settings.project_path(&config.workspace);

    match path {
        Some(path) => {
            let prefix = format!("{}/", settings.project_root);
            let relative = path.strip_prefix(&prefix).unwrap_or(&path);
            let file = FileProjectStore::new(&project_dir).resolve(relative)?;
            let content = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            println!("{}", content);
        }
        None => {
            let files = snapshot_directory(&project_dir)?;
            if files.is_empty() {
                println!("No files under {}", project_dir.display());
                return Ok(());
            }
            for file in files {
                println!("{}/{} ({} bytes)", settings.project_root, file.path, file.content.len());
            }
        }
    }

    Ok(())
}

/// Removes the generated project and every checkpoint.
pub async fn clean(config: &Config) -> Result<()> {
    let settings = load_settings(config)?;
    let project_dir = settings.project_path(&config.workspace);
    let store = checkpoints(&settings, config);

    if config.dry_run {
        println!("[DRY RUN] Would remove {}", project_dir.display());
        println!("[DRY RUN] Would remove checkpoints in {}", store.dir().display());
        return Ok(());
    }

    if project_dir.exists() {
        fs::remove_dir_all(&project_dir)
            .with_context(|| format!("Failed to remove {}", project_dir.display()))?;
        println!("✓ Removed {}", project_dir.display());
    }

    let removed = store.clear()?;
    println!("✓ Removed {} checkpoint(s)", removed);
    Ok(())
}

/// Renders a manifest as an indented tree, one entry per line.
pub fn format_manifest(manifest: &Manifest) -> String {
    let digest = manifest_digest(manifest)
        .map(|d| d[..12].to_string())
        .unwrap_or_default();
    let mut lines = vec![format!(
        "Manifest: {} entr(ies), {} file(s) [{}]",
        manifest.len(),
        manifest.file_count(),
        digest
    )];

    for entry in manifest {
        lines.push(format_entry(entry));
    }
    lines.join("\n")
}

fn format_entry(entry: &ManifestEntry) -> String {
    let trimmed = entry.path.trim_end_matches('/');
    let depth = trimmed.matches('/').count();
    let name = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let suffix = if entry.is_directory() { "/" } else { "" };

    format!(
        "{}{}{}  # {}",
        "  ".repeat(depth),
        name,
        suffix,
        entry.description
    )
}

fn format_validation(records: &[ValidationRecord]) -> String {
    let width = records
        .iter()
        .map(|r| r.path.len())
        .max()
        .unwrap_or(0)
        .max("path".len());

    let mut lines = vec![
        format!("{:<width$} | validation", "path", width = width),
        format!("{}-+-{}", "-".repeat(width), "-".repeat("validation".len())),
    ];
    for record in records {
        lines.push(format!(
            "{:<width$} | {}",
            record.path,
            record.validation,
            width = width
        ));
    }
    lines.join("\n")
}
