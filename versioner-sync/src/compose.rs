//! Strategies for turning a reconciliation manifest into a new version.
//!
//! | composer            | phase | effect                                         |
//! |---------------------|-------|------------------------------------------------|
//! | [`ManifestHandoff`] | 1     | writes `_dataset-manifest.json` into outputs   |
//! | [`SidecarComposer`] | 1     | writes `<file>.metadata.json` per moved output |
//! | `VersionPublisher`  | 2     | creates the version through the service API    |
//!
//! The first two defer the actual version creation to something downstream and
//! return [`Composition::Deferred`]; the publisher returns
//! [`Composition::Published`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use versioner_core::{Manifest, VersionId};

use crate::error::{io_err, SyncError};

/// Zero-content output synthesized when a run uploads nothing.
pub const MARKER_FILENAME: &str = "dataset-marker.txt";

/// Suffix appended to an output's file name to name its sidecar.
pub const SIDECAR_SUFFIX: &str = ".metadata.json";

pub const DEFAULT_NAMESPACE: &str = "valohai";

/// Outcome of [`VersionComposer::compose`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Composition {
    /// The version exists now.
    Published { version_id: VersionId },
    /// Artifacts were written; something downstream creates the version.
    Deferred { artifacts: Vec<PathBuf> },
}

/// Turns a manifest plus the already-moved upload files into a new version
/// (or into the artifacts that will produce one).
pub trait VersionComposer {
    fn compose(&self, manifest: &Manifest, moved: &[PathBuf]) -> Result<Composition, SyncError>;
}

// ---------------------------------------------------------------------------
// ManifestHandoff
// ---------------------------------------------------------------------------

/// Writes the manifest next to the moved outputs for the publish phase.
#[derive(Debug, Clone)]
pub struct ManifestHandoff {
    outputs_dir: PathBuf,
}

impl ManifestHandoff {
    pub fn new(outputs_dir: impl Into<PathBuf>) -> Self {
        Self {
            outputs_dir: outputs_dir.into(),
        }
    }
}

impl VersionComposer for ManifestHandoff {
    fn compose(&self, manifest: &Manifest, _moved: &[PathBuf]) -> Result<Composition, SyncError> {
        let path = manifest.write_to_dir(&self.outputs_dir)?;
        Ok(Composition::Deferred {
            artifacts: vec![path],
        })
    }
}

// ---------------------------------------------------------------------------
// SidecarComposer
// ---------------------------------------------------------------------------

/// One `"<ns>.dataset-versions"` entry: "`uri` derives from `from`, minus
/// `exclude`".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInstruction {
    pub uri: String,
    pub from: Option<String>,
    pub exclude: Vec<String>,
}

/// Writes a declarative sidecar next to every moved output so the
/// orchestrator composes the version itself.
///
/// The orchestrator only materializes a version when the run has at least one
/// output, so a run with no uploads gets a timestamped [`MARKER_FILENAME`].
#[derive(Debug, Clone)]
pub struct SidecarComposer {
    outputs_dir: PathBuf,
    namespace: String,
    now: DateTime<Utc>,
}

impl SidecarComposer {
    pub fn new(outputs_dir: impl Into<PathBuf>, now: DateTime<Utc>) -> Self {
        Self {
            outputs_dir: outputs_dir.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            now,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    fn write_marker(&self) -> Result<PathBuf, SyncError> {
        std::fs::create_dir_all(&self.outputs_dir).map_err(|e| io_err(&self.outputs_dir, e))?;
        let path = self.outputs_dir.join(MARKER_FILENAME);
        let stamp = self.now.to_rfc3339_opts(SecondsFormat::Secs, true);
        std::fs::write(&path, stamp).map_err(|e| io_err(&path, e))?;
        tracing::info!(path = %path.display(), "nothing to upload, wrote version marker");
        Ok(path)
    }

    fn write_sidecar(
        &self,
        output: &Path,
        instruction: &VersionInstruction,
    ) -> Result<PathBuf, SyncError> {
        let mut file_name = output
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        file_name.push(SIDECAR_SUFFIX);
        let path = output.with_file_name(file_name);

        let key = format!("{}.dataset-versions", self.namespace);
        let body = BTreeMap::from([(key, [instruction])]);
        let json = serde_json::to_string_pretty(&body)?;
        std::fs::write(&path, json).map_err(|e| io_err(&path, e))?;
        tracing::debug!(path = %path.display(), "wrote sidecar");
        Ok(path)
    }
}

impl VersionComposer for SidecarComposer {
    fn compose(&self, manifest: &Manifest, moved: &[PathBuf]) -> Result<Composition, SyncError> {
        let mut outputs = moved.to_vec();
        if outputs.is_empty() {
            outputs.push(self.write_marker()?);
        }

        let instruction = VersionInstruction {
            uri: manifest.new_version_uri.clone(),
            from: manifest.old_version_uri.clone(),
            exclude: manifest.exclude.clone(),
        };

        let mut artifacts = Vec::with_capacity(outputs.len() * 2);
        for output in outputs {
            let sidecar = self.write_sidecar(&output, &instruction)?;
            artifacts.push(output);
            artifacts.push(sidecar);
        }
        Ok(Composition::Deferred { artifacts })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
