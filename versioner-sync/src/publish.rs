//! Phase 2: create the new version through the storage service.
//!
//! Members of the new version are the union of
//! - every data item the producing execution uploaded (minus the manifest
//!   artifact itself), fetched page by page until an empty page, and
//! - the datum ids the manifest keeps from the old version.

use std::collections::BTreeSet;
use std::path::PathBuf;

use versioner_api::{ApiError, CreateVersionRequest, DatasetService, FileEntry, PageRequest};
use versioner_core::{DatumId, ExecutionId, Manifest, VersionId, MANIFEST_FILENAME};

use crate::compose::{Composition, VersionComposer};
use crate::error::SyncError;

/// Page size for the execution-output listing.
pub const PAGE_SIZE: usize = 100;

pub struct VersionPublisher<'a, S: DatasetService + ?Sized> {
    service: &'a S,
}

impl<'a, S: DatasetService + ?Sized> VersionPublisher<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Self { service }
    }

    /// Ids of the data items `execution` produced, manifest excluded.
    ///
    /// Names listed in `expected` but missing from the listing are logged.
    pub fn uploaded_datums(
        &self,
        execution: &ExecutionId,
        expected: &[String],
    ) -> Result<BTreeSet<DatumId>, SyncError> {
        let mut ids = BTreeSet::new();
        let mut seen_names = BTreeSet::new();
        let mut page = PageRequest::first(PAGE_SIZE);
        loop {
            let items = self.service.execution_outputs(execution, page)?;
            if items.is_empty() {
                break;
            }
            for item in items {
                if item.name == MANIFEST_FILENAME {
                    continue;
                }
                seen_names.insert(item.name);
                ids.insert(item.id);
            }
            page = page.next();
        }

        for name in expected.iter().filter(|n| !seen_names.contains(*n)) {
            tracing::warn!(name = %name, execution = %execution, "expected upload not found among execution outputs");
        }
        tracing::info!(execution = %execution, count = ids.len(), "resolved uploaded data");
        Ok(ids)
    }

    /// Create the version described by `manifest` and return its id.
    pub fn publish(&self, manifest: &Manifest) -> Result<VersionId, SyncError> {
        let execution = manifest
            .execution_id
            .as_ref()
            .ok_or(SyncError::MissingExecutionId)?;

        let mut members = self.uploaded_datums(execution, &manifest.new)?;
        members.extend(manifest.keep.values().cloned());

        let request = CreateVersionRequest {
            previous_version: manifest.old_version_id.clone(),
            name: manifest.new_version_name.clone(),
            dataset: manifest.dataset_id.clone(),
            files: members
                .into_iter()
                .map(|datum| FileEntry { datum })
                .collect(),
        };
        tracing::info!(
            dataset = %request.dataset,
            name = %request.name,
            files = request.files.len(),
            "creating dataset version"
        );

        match self.service.create_dataset_version(&request) {
            Ok(created) => {
                tracing::info!(version = %created.id, "created dataset version");
                Ok(created.id)
            }
            Err(ApiError::Status { status, body, .. }) => {
                Err(SyncError::PublishFailed { status, body })
            }
            Err(other) => Err(other.into()),
        }
    }
}

impl<S: DatasetService + ?Sized> VersionComposer for VersionPublisher<'_, S> {
    fn compose(&self, manifest: &Manifest, _moved: &[PathBuf]) -> Result<Composition, SyncError> {
        let version_id = self.publish(manifest)?;
        Ok(Composition::Published { version_id })
    }
}
