//! Phase entrypoints used by the CLI.
//!
//! Phase 1 order is fixed: look up the latest version, reconcile, move
//! uploads, then compose. The composer runs only after every move succeeded,
//! so a written manifest or sidecar never describes a half-moved output set.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use versioner_api::DatasetService;
use versioner_core::{DatasetId, ExecutionId, Manifest, VersionId, VersionTarget};

use crate::compose::{Composition, VersionComposer};
use crate::error::SyncError;
use crate::output::move_uploads;
use crate::publish::VersionPublisher;
use crate::reconcile::{reconcile, ReconciliationResult};
use crate::remote::latest_version;

/// Inputs of one reconcile run.
#[derive(Debug, Clone)]
pub struct ReconcileRequest<'a> {
    pub dataset_id: DatasetId,
    pub content_dir: &'a Path,
    pub outputs_dir: &'a Path,
    pub execution_id: Option<ExecutionId>,
    pub now: DateTime<Utc>,
    /// Compute the plan only; move nothing, write nothing.
    pub dry_run: bool,
}

/// What phase 1 decided and did.
#[derive(Debug, Clone)]
pub struct Phase1Report {
    pub target: VersionTarget,
    pub result: ReconciliationResult,
    pub manifest: Manifest,
    /// Destination paths of moved uploads; empty on a dry run.
    pub moved: Vec<PathBuf>,
    /// `None` on a dry run.
    pub composition: Option<Composition>,
}

/// Phase 1: reconcile `content_dir` against the dataset's latest version.
pub fn reconcile_phase<S: DatasetService + ?Sized>(
    service: &S,
    request: &ReconcileRequest<'_>,
    composer: &dyn VersionComposer,
) -> Result<Phase1Report, SyncError> {
    let latest = latest_version(service, &request.dataset_id)?;
    let target = VersionTarget::plan(&latest.dataset, latest.version.as_ref(), request.now);

    let old_files = latest.version.iter().flat_map(|v| v.datums());
    let result = reconcile(request.content_dir, old_files)?;
    let manifest = result.to_manifest(target.clone(), request.execution_id.clone());

    tracing::info!(
        new_version = %target.new_version_name,
        upload = manifest.new.len(),
        keep = manifest.keep.len(),
        exclude = manifest.exclude.len(),
        "reconciled"
    );

    if request.dry_run {
        return Ok(Phase1Report {
            target,
            result,
            manifest,
            moved: Vec::new(),
            composition: None,
        });
    }

    let moved = move_uploads(&result, request.outputs_dir)?;
    let composition = composer.compose(&manifest, &moved)?;
    Ok(Phase1Report {
        target,
        result,
        manifest,
        moved,
        composition: Some(composition),
    })
}

/// Phase 2: read the handed-off manifest from `inputs_dir` and publish it.
pub fn publish_phase<S: DatasetService + ?Sized>(
    service: &S,
    inputs_dir: &Path,
) -> Result<(Manifest, VersionId), SyncError> {
    let manifest = Manifest::read_from_inputs(inputs_dir)?;
    tracing::info!(
        dataset = %manifest.dataset_id,
        name = %manifest.new_version_name,
        "read dataset manifest"
    );
    let version_id = VersionPublisher::new(service).publish(&manifest)?;
    Ok((manifest, version_id))
}
