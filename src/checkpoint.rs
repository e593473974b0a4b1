//! Durable phase checkpoints: plan -> build -> validate.
//!
//! Each phase writes one JSON record under the state directory and the next
//! phase reads only that record, so any phase can be re-run on its own.

use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::contexts::{BuildReport, ValidationRecord};
use crate::data::Manifest;

/// Bumped whenever a record layout changes incompatibly.
pub const CHECKPOINT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Instruction -> manifest
    Plan,
    /// Manifest -> generated files
    Build,
    /// Generated files -> validation records
    Validate,
}

impl Phase {
    fn file_name(self) -> &'static str {
        match self {
            Phase::Plan => "manifest.json",
            Phase::Build => "build.json",
            Phase::Validate => "validated_manifest.json",
        }
    }

    /// The command that produces this phase's checkpoint.
    fn producer(self) -> &'static str {
        match self {
            Phase::Plan => "plan",
            Phase::Build => "build",
            Phase::Validate => "validate",
        }
    }
}

/// Plan phase output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub instruction: String,
    pub framework: String,
    pub manifest: Manifest,
    /// Set when the plan degraded to the error manifest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planning_error: Option<String>,
}

/// Build phase output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRecord {
    pub manifest: Manifest,
    pub report: BuildReport,
}

/// Validate phase output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRecordSet {
    pub manifest: Manifest,
    pub records: Vec<ValidationRecord>,
}

/// A versioned phase record as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint<T> {
    pub version: u32,
    pub phase: Phase,
    pub created_at: String,
    pub manifest_sha256: String,
    pub payload: T,
}

/// Reads and writes phase checkpoints under one state directory.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, phase: Phase) -> PathBuf {
        self.dir.join(phase.file_name())
    }

    pub fn exists(&self, phase: Phase) -> bool {
        self.path_for(phase).exists()
    }

    pub fn save_plan(&self, record: &PlanRecord) -> Result<PathBuf> {
        self.save(Phase::Plan, &record.manifest, record)
    }

    pub fn load_plan(&self) -> Result<Checkpoint<PlanRecord>> {
        self.load(Phase::Plan)
    }

    pub fn save_build(&self, record: &BuildRecord) -> Result<PathBuf> {
        self.save(Phase::Build, &record.manifest, record)
    }

    pub fn load_build(&self) -> Result<Checkpoint<BuildRecord>> {
        self.load(Phase::Build)
    }

    pub fn save_validation(&self, record: &ValidationRecordSet) -> Result<PathBuf> {
        self.save(Phase::Validate, &record.manifest, record)
    }

    pub fn load_validation(&self) -> Result<Checkpoint<ValidationRecordSet>> {
        self.load(Phase::Validate)
    }

    fn save<T: Serialize>(&self, phase: Phase, manifest: &Manifest, payload: &T) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create state directory {}", self.dir.display())
        })?;

        let checkpoint = Checkpoint {
            version: CHECKPOINT_VERSION,
            phase,
            created_at: chrono::Utc::now().to_rfc3339(),
            manifest_sha256: manifest_digest(manifest)?,
            payload,
        };
        let content = serde_json::to_string_pretty(&checkpoint)
            .with_context(|| format!("Failed to serialize {:?} checkpoint", phase))?;

        let path = self.path_for(phase);
        fs::write(&path, content)
            .with_context(|| format!("Failed to write checkpoint {}", path.display()))?;
        Ok(path)
    }

    fn load<T: DeserializeOwned>(&self, phase: Phase) -> Result<Checkpoint<T>> {
        let path = self.path_for(phase);
        if !path.exists() {
            bail!(
                "No {:?} checkpoint at {}. Run `scaffolder {}` first.",
                phase,
                path.display(),
                phase.producer()
            );
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read checkpoint {}", path.display()))?;
        let checkpoint: Checkpoint<T> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse checkpoint {}", path.display()))?;

        if checkpoint.version != CHECKPOINT_VERSION {
            bail!(
                "Checkpoint {} has version {}, expected {}",
                path.display(),
                checkpoint.version,
                CHECKPOINT_VERSION
            );
        }
        if checkpoint.phase != phase {
            bail!(
                "Checkpoint {} belongs to phase {:?}, expected {:?}",
                path.display(),
                checkpoint.phase,
                phase
            );
        }

        Ok(checkpoint)
    }

    /// Removes every checkpoint. Returns how many were deleted.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for phase in [Phase::Plan, Phase::Build, Phase::Validate] {
            let path = self.path_for(phase);
            if path.exists() {
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove checkpoint {}", path.display()))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// SHA-256 of the manifest's canonical JSON form.
pub fn manifest_digest(manifest: &Manifest) -> Result<String> {
    let json = serde_json::to_vec(manifest).context("Failed to serialize manifest")?;
    let mut hasher = Sha256::new();
    hasher.update(&json);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ManifestEntry;
    use tempfile::TempDir;

    fn sample_manifest() -> Manifest {
        Manifest::new(vec![
            ManifestEntry::new("generated/src/", "Source directory."),
            ManifestEntry::new("generated/src/main.py", "Main application entry point."),
        ])
    }

    #[test]
    fn manifest_round_trips_through_plan_checkpoint() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let record = PlanRecord {
            instruction: "hello world".to_string(),
            framework: "Flask".to_string(),
            manifest: sample_manifest(),
            planning_error: None,
        };

        store.save_plan(&record).unwrap();
        let loaded = store.load_plan().unwrap();

        assert_eq!(loaded.version, CHECKPOINT_VERSION);
        assert_eq!(loaded.phase, Phase::Plan);
        assert_eq!(loaded.payload, record);
        assert_eq!(
            loaded.manifest_sha256,
            manifest_digest(&sample_manifest()).unwrap()
        );
    }

    #[test]
    fn missing_checkpoint_names_the_producing_command() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());

        let err = store.load_build().unwrap_err().to_string();
        assert!(err.contains("scaffolder build"));
    }

    #[test]
    fn rejects_other_versions() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        fs::write(
            dir.path().join("manifest.json"),
            r#"{"version": 99, "phase": "plan", "created_at": "", "manifest_sha256": "",
                "payload": {"instruction": "", "framework": "", "manifest": []}}"#,
        )
        .unwrap();

        let err = store.load_plan().unwrap_err().to_string();
        assert!(err.contains("version 99"));
    }

    #[test]
    fn clear_removes_all_checkpoints() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let manifest = sample_manifest();

        store
            .save_build(&BuildRecord {
                manifest: manifest.clone(),
                report: BuildReport::default(),
            })
            .unwrap();
        store
            .save_validation(&ValidationRecordSet {
                manifest,
                records: Vec::new(),
            })
            .unwrap();

        assert_eq!(store.clear().unwrap(), 2);
        assert!(!store.exists(Phase::Build));
        assert_eq!(store.clear().unwrap(), 0);
    }
}
