//! In-memory storage service for pipeline tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;

use versioner_api::{ApiError, CreateVersionRequest, CreatedVersion, DatasetService, PageRequest};
use versioner_core::{
    DataItem, Dataset, DatasetId, DatasetVersion, Datum, DatumId, ExecutionId, HashAlgorithm,
    VersionFile, VersionId, VersionRef,
};
use versioner_sync::change::hash_file;

#[derive(Default)]
pub struct FakeService {
    pub datasets: BTreeMap<DatasetId, Dataset>,
    pub versions: BTreeMap<VersionId, DatasetVersion>,
    pub outputs: BTreeMap<ExecutionId, Vec<DataItem>>,
    /// When set, version creation fails with this status and body.
    pub reject_with: Option<(u16, String)>,
    pub pages_served: RefCell<Vec<PageRequest>>,
    pub created: RefCell<Vec<CreateVersionRequest>>,
}

impl FakeService {
    /// A dataset named `weather` whose latest version holds `files`.
    pub fn with_version(files: Vec<Datum>) -> Self {
        let mut service = Self::default();
        let version = DatasetVersion {
            id: VersionId::from("v-1"),
            name: "20240101-000000".to_string(),
            files: files.into_iter().map(|datum| VersionFile { datum }).collect(),
        };
        service.datasets.insert(
            DatasetId::from("ds-1"),
            Dataset {
                id: DatasetId::from("ds-1"),
                name: "weather".to_string(),
                latest_version: Some(VersionRef {
                    id: version.id.clone(),
                }),
            },
        );
        service.versions.insert(version.id.clone(), version);
        service
    }

    /// A dataset named `weather` with no versions.
    pub fn fresh() -> Self {
        let mut service = Self::default();
        service.datasets.insert(
            DatasetId::from("ds-1"),
            Dataset {
                id: DatasetId::from("ds-1"),
                name: "weather".to_string(),
                latest_version: None,
            },
        );
        service
    }

    fn not_found(what: &str) -> ApiError {
        ApiError::Status {
            url: what.to_string(),
            status: 404,
            body: "not found".to_string(),
        }
    }
}

impl DatasetService for FakeService {
    fn dataset(&self, id: &DatasetId) -> Result<Dataset, ApiError> {
        self.datasets
            .get(id)
            .cloned()
            .ok_or_else(|| Self::not_found(id.as_str()))
    }

    fn dataset_version(&self, id: &VersionId) -> Result<DatasetVersion, ApiError> {
        self.versions
            .get(id)
            .cloned()
            .ok_or_else(|| Self::not_found(id.as_str()))
    }

    fn execution_outputs(
        &self,
        execution: &ExecutionId,
        page: PageRequest,
    ) -> Result<Vec<DataItem>, ApiError> {
        self.pages_served.borrow_mut().push(page);
        let items = self.outputs.get(execution).cloned().unwrap_or_default();
        Ok(items.into_iter().skip(page.offset).take(page.limit).collect())
    }

    fn create_dataset_version(
        &self,
        request: &CreateVersionRequest,
    ) -> Result<CreatedVersion, ApiError> {
        self.created.borrow_mut().push(request.clone());
        match &self.reject_with {
            Some((status, body)) => Err(ApiError::Status {
                url: "/api/v0/dataset-versions/".to_string(),
                status: *status,
                body: body.clone(),
            }),
            None => Ok(CreatedVersion {
                id: VersionId::from("v-new"),
            }),
        }
    }
}

/// Remote record matching the file at `dir/name` by size and md5.
pub fn datum_matching(dir: &Path, name: &str, id: &str) -> Datum {
    let path = dir.join(name);
    Datum {
        id: DatumId::from(id),
        name: name.to_string(),
        size: std::fs::metadata(&path).expect("stat").len(),
        md5: Some(hash_file(&path, HashAlgorithm::Md5).expect("md5")),
        sha1: None,
        sha256: None,
    }
}

pub fn item(id: &str, name: &str) -> DataItem {
    DataItem {
        id: DatumId::from(id),
        name: name.to_string(),
    }
}
