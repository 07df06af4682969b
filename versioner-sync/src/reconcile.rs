//! Directory-vs-version reconciliation.
//!
//! Every name seen locally or in the old version gets exactly one
//! [`Decision`]:
//!
//! | local | remote | verdict     | decision                        |
//! |-------|--------|-------------|---------------------------------|
//! | yes   | no     | n/a         | `Upload { cause: New }`         |
//! | no    | yes    | n/a         | `Drop`                          |
//! | yes   | yes    | `Unchanged` | `Keep { datum }`                |
//! | yes   | yes    | `Changed`   | `Upload { cause: Changed(..) }` |
//! | yes   | yes    | `Unknown`   | `Upload { cause: Unverifiable }`|
//!
//! The upload/keep/exclude collections of the handoff manifest are derived
//! views over these decisions, so they cannot drift apart.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use versioner_core::{Datum, DatumId, ExecutionId, Manifest, VersionTarget};

use crate::change::{classify, ChangeReason, ChangeVerdict, LocalFile};
use crate::error::{io_err, SyncError};

/// Why a name is being uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadCause {
    /// Not present in the old version.
    New,
    /// Present in the old version with different content.
    Changed(ChangeReason),
    /// Present in the old version, but its record has no hash to verify against.
    Unverifiable,
}

/// What happens to one name in the new version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Carry the old datum over unchanged.
    Keep { datum: DatumId },
    /// Upload the local file as the authoritative content for this name.
    Upload { path: PathBuf, cause: UploadCause },
    /// Present in the old version only; leave it out.
    Drop,
}

impl Decision {
    /// Whether this name existed in the old version.
    pub fn replaces_old(&self) -> bool {
        !matches!(
            self,
            Decision::Upload {
                cause: UploadCause::New,
                ..
            }
        )
    }
}

/// Per-name decisions from one reconciliation run, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationResult {
    decisions: BTreeMap<String, Decision>,
}

impl ReconciliationResult {
    pub fn decisions(&self) -> &BTreeMap<String, Decision> {
        &self.decisions
    }

    pub fn get(&self, name: &str) -> Option<&Decision> {
        self.decisions.get(name)
    }

    /// Names to upload, with the local path holding each file.
    pub fn to_upload(&self) -> BTreeMap<&str, &Path> {
        self.decisions
            .iter()
            .filter_map(|(name, decision)| match decision {
                Decision::Upload { path, .. } => Some((name.as_str(), path.as_path())),
                _ => None,
            })
            .collect()
    }

    /// Unchanged old-version names and the datums backing them.
    pub fn to_keep(&self) -> BTreeMap<String, DatumId> {
        self.decisions
            .iter()
            .filter_map(|(name, decision)| match decision {
                Decision::Keep { datum } => Some((name.clone(), datum.clone())),
                _ => None,
            })
            .collect()
    }

    /// Old-version names that must not survive: dropped names plus every
    /// uploaded name that replaces an old datum.
    pub fn to_exclude(&self) -> BTreeSet<String> {
        self.decisions
            .iter()
            .filter(|(_, decision)| match decision {
                Decision::Keep { .. } => false,
                Decision::Drop => true,
                Decision::Upload { .. } => decision.replaces_old(),
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// `true` when nothing needs to be uploaded.
    pub fn nothing_to_upload(&self) -> bool {
        !self
            .decisions
            .values()
            .any(|d| matches!(d, Decision::Upload { .. }))
    }

    /// Serialize the decision into the handoff manifest.
    pub fn to_manifest(
        &self,
        target: VersionTarget,
        execution_id: Option<ExecutionId>,
    ) -> Manifest {
        Manifest::new(
            target,
            execution_id,
            self.to_keep(),
            self.to_upload().into_keys().map(str::to_owned),
            self.to_exclude(),
        )
    }
}

/// Regular files directly under `dir`, keyed by file name.
///
/// Subdirectories are not traversed. Symlinks are followed.
pub fn list_local_files(dir: &Path) -> Result<BTreeMap<String, LocalFile>, SyncError> {
    let mut files = BTreeMap::new();
    for entry in std::fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
        let path = entry.map_err(|e| io_err(dir, e))?.path();
        let meta = std::fs::metadata(&path).map_err(|e| io_err(&path, e))?;
        if !meta.is_file() {
            continue;
        }
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        files.insert(name.clone(), LocalFile::new(name, path, meta.len()));
    }
    Ok(files)
}

/// Partition `content_dir` against the old version's records.
///
/// Pass an empty iterator when the dataset has no version yet.
pub fn reconcile<'a>(
    content_dir: &Path,
    old_version_files: impl IntoIterator<Item = &'a Datum>,
) -> Result<ReconciliationResult, SyncError> {
    let local_by_name = list_local_files(content_dir)?;
    let remote_by_name: BTreeMap<&str, &Datum> = old_version_files
        .into_iter()
        .map(|datum| (datum.name.as_str(), datum))
        .collect();

    let mut decisions = BTreeMap::new();

    for (name, local) in &local_by_name {
        if !remote_by_name.contains_key(name.as_str()) {
            tracing::info!(name = %name, "new file, will upload");
            decisions.insert(
                name.clone(),
                Decision::Upload {
                    path: local.path().to_path_buf(),
                    cause: UploadCause::New,
                },
            );
        }
    }

    for (name, datum) in &remote_by_name {
        let Some(local) = local_by_name.get(*name) else {
            tracing::info!(name = %name, "not in local directory, will drop from dataset");
            decisions.insert((*name).to_string(), Decision::Drop);
            continue;
        };

        let decision = match classify(local, datum)? {
            ChangeVerdict::Unchanged => {
                tracing::info!(name = %name, datum = %datum.id, "no changes detected, keeping");
                Decision::Keep {
                    datum: datum.id.clone(),
                }
            }
            ChangeVerdict::Changed(reason) => {
                tracing::info!(name = %name, reason = %reason, "changed, will upload");
                Decision::Upload {
                    path: local.path().to_path_buf(),
                    cause: UploadCause::Changed(reason),
                }
            }
            ChangeVerdict::Unknown => {
                tracing::warn!(
                    name = %name,
                    datum = %datum.id,
                    "remote record has no content hash; re-uploading instead of keeping unverified data"
                );
                Decision::Upload {
                    path: local.path().to_path_buf(),
                    cause: UploadCause::Unverifiable,
                }
            }
        };
        decisions.insert((*name).to_string(), decision);
    }

    Ok(ReconciliationResult { decisions })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
