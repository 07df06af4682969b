//! Latest-version lookup.

use versioner_api::DatasetService;
use versioner_core::{Dataset, DatasetId, DatasetVersion};

use crate::error::SyncError;

/// A dataset together with its latest version, if it has one.
#[derive(Debug, Clone)]
pub struct LatestVersion {
    pub dataset: Dataset,
    pub version: Option<DatasetVersion>,
}

pub fn latest_version<S: DatasetService + ?Sized>(
    service: &S,
    dataset_id: &DatasetId,
) -> Result<LatestVersion, SyncError> {
    let dataset = service.dataset(dataset_id)?;
    let version = match &dataset.latest_version {
        Some(latest) => Some(service.dataset_version(&latest.id)?),
        None => {
            tracing::info!(dataset = %dataset.id, "dataset has no versions yet");
            None
        }
    };
    if let Some(version) = &version {
        tracing::info!(
            dataset = %dataset.name,
            version = %version.name,
            files = version.files.len(),
            "fetched latest version"
        );
    }
    Ok(LatestVersion { dataset, version })
}
