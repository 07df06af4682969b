//! Request and response payloads that are specific to the service API.

use serde::{Deserialize, Serialize};

use versioner_core::{DatasetId, DatumId, VersionId};

/// Offset/limit window of a paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
}

impl PageRequest {
    pub fn first(limit: usize) -> Self {
        Self { offset: 0, limit }
    }

    /// The window directly after this one.
    pub fn next(self) -> Self {
        Self {
            offset: self.offset + self.limit,
            limit: self.limit,
        }
    }
}

/// Envelope of paginated list responses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// A single membership entry of a version-creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub datum: DatumId,
}

/// Body of `POST /api/v0/dataset-versions/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateVersionRequest {
    pub previous_version: Option<VersionId>,
    pub name: String,
    pub dataset: DatasetId,
    pub files: Vec<FileEntry>,
}

/// The subset of the created version record we report back.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedVersion {
    pub id: VersionId,
}
