//! Versioner core library: domain types, the phase handoff manifest, and
//! run parameters.
//!
//! - [`types`]: ids and the storage service's dataset records
//! - [`manifest`]: the artifact phase 1 hands to phase 2
//! - [`params`]: `parameters.json` loading
//! - [`error`]: [`ManifestError`], [`ParamsError`]

pub mod error;
pub mod manifest;
pub mod params;
pub mod types;

pub use error::{ManifestError, ParamsError};
pub use manifest::{Manifest, VersionTarget, MANIFEST_FILENAME};
pub use params::Parameters;
pub use types::{
    DataItem, Dataset, DatasetId, DatasetVersion, Datum, DatumId, ExecutionId, HashAlgorithm,
    VersionFile, VersionId, VersionRef,
};
