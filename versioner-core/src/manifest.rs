//! The handoff manifest between phase 1 (reconcile) and phase 2 (publish).
//!
//! # Lifecycle
//!
//! ```text
//! phase 1: reconcile → move outputs → Manifest::write_to_dir(<outputs>)
//!                                      └─ <outputs>/_dataset-manifest.json
//! (orchestrator delivers it as an input)
//! phase 2: Manifest::read_from_inputs(<inputs>)
//!            └─ <inputs>/manifest/*.json   (exactly one candidate)
//! ```
//!
//! A manifest is a value: written once, read at most once, never mutated.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ManifestError;
use crate::types::{Dataset, DatasetId, DatasetVersion, DatumId, ExecutionId, VersionId};

/// Reserved file name of the manifest artifact; never dataset content.
pub const MANIFEST_FILENAME: &str = "_dataset-manifest.json";

/// Name of the input slot the manifest is delivered to in phase 2.
pub const MANIFEST_INPUT_NAME: &str = "manifest";

/// Version names are UTC timestamps at second precision.
pub const VERSION_NAME_FORMAT: &str = "%Y%m%d-%H%M%S";

/// `dataset://<dataset>/<version>`
pub fn dataset_uri(dataset_name: &str, version_name: &str) -> String {
    format!("dataset://{dataset_name}/{version_name}")
}

/// Version name for a run started at `now`, e.g. `20240131-235959`.
///
/// Two runs starting within the same second produce the same name.
pub fn version_name_at(now: DateTime<Utc>) -> String {
    now.format(VERSION_NAME_FORMAT).to_string()
}

// ---------------------------------------------------------------------------
// VersionTarget
// ---------------------------------------------------------------------------

/// Identifies the version being replaced and the version about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTarget {
    pub dataset_id: DatasetId,
    pub old_version_id: Option<VersionId>,
    pub old_version_uri: Option<String>,
    pub new_version_name: String,
    pub new_version_uri: String,
}

impl VersionTarget {
    /// Plan the successor of `latest` (or the first version when `None`).
    pub fn plan(dataset: &Dataset, latest: Option<&DatasetVersion>, now: DateTime<Utc>) -> Self {
        let new_version_name = version_name_at(now);
        Self {
            dataset_id: dataset.id.clone(),
            old_version_id: latest.map(|v| v.id.clone()),
            old_version_uri: latest.map(|v| dataset_uri(&dataset.name, &v.name)),
            new_version_uri: dataset_uri(&dataset.name, &new_version_name),
            new_version_name,
        }
    }
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// Complete description of a reconciliation decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub dataset_id: DatasetId,
    /// Old-version names that must not survive into the new version (sorted).
    pub exclude: Vec<String>,
    /// Execution whose outputs hold the uploaded files.
    pub execution_id: Option<ExecutionId>,
    /// Unchanged old-version files, name → datum id.
    pub keep: BTreeMap<String, DatumId>,
    /// Names expected to be uploaded by the producing execution (sorted).
    pub new: Vec<String>,
    pub new_version_name: String,
    pub new_version_uri: String,
    pub old_version_id: Option<VersionId>,
    pub old_version_uri: Option<String>,
}

impl Manifest {
    /// Assemble a manifest. `new` and `exclude` are sorted and deduplicated.
    pub fn new(
        target: VersionTarget,
        execution_id: Option<ExecutionId>,
        keep: BTreeMap<String, DatumId>,
        new: impl IntoIterator<Item = String>,
        exclude: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            dataset_id: target.dataset_id,
            exclude: sorted_unique(exclude),
            execution_id,
            keep,
            new: sorted_unique(new),
            new_version_name: target.new_version_name,
            new_version_uri: target.new_version_uri,
            old_version_id: target.old_version_id,
            old_version_uri: target.old_version_uri,
        }
    }

    /// Atomically write the manifest to `<dir>/_dataset-manifest.json`.
    ///
    /// Write flow: serialize → `.tmp` sibling → `rename`, so a reader never
    /// observes a partially written manifest.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf, ManifestError> {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        let path = dir.join(MANIFEST_FILENAME);
        let tmp = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(self).map_err(|e| ManifestError::Json {
            path: path.clone(),
            source: e,
        })?;
        std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&path, e));
        }
        tracing::info!(path = %path.display(), "wrote dataset manifest");
        Ok(path)
    }

    /// Read the manifest delivered to `<inputs>/manifest/`.
    pub fn read_from_inputs(inputs_dir: &Path) -> Result<Self, ManifestError> {
        Self::read_from_dir(&inputs_dir.join(MANIFEST_INPUT_NAME))
    }

    /// Read the single `*.json` manifest in `dir`.
    ///
    /// Returns [`ManifestError::NotFound`] when there is none and
    /// [`ManifestError::Ambiguous`] when there is more than one.
    pub fn read_from_dir(dir: &Path) -> Result<Self, ManifestError> {
        let mut candidates = manifest_candidates(dir)?;
        match candidates.len() {
            0 => Err(ManifestError::NotFound {
                dir: dir.to_path_buf(),
            }),
            1 => {
                let path = candidates.remove(0);
                Self::read_file(&path)
            }
            _ => Err(ManifestError::Ambiguous {
                dir: dir.to_path_buf(),
                candidates,
            }),
        }
    }

    /// Parse a manifest from an explicit path.
    pub fn read_file(path: &Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        serde_json::from_str(&contents).map_err(|e| ManifestError::Json {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

fn manifest_candidates(dir: &Path) -> Result<Vec<PathBuf>, ManifestError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(io_err(dir, e)),
    };

    let mut candidates = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| io_err(dir, e))?.path();
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        if is_json && path.is_file() {
            candidates.push(path);
        }
    }
    candidates.sort();
    Ok(candidates)
}

fn sorted_unique(names: impl IntoIterator<Item = String>) -> Vec<String> {
    names.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ManifestError {
    ManifestError::Io {
        path: path.into(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
