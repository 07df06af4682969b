//! # versioner-api
//!
//! Blocking client for the dataset storage service.
//!
//! [`DatasetService`] is the seam the reconcile and publish phases are written
//! against; [`ApiClient`] implements it over HTTP with `ureq`.

pub mod client;
pub mod error;
pub mod models;

pub use client::{ApiClient, ApiConfig, DatasetService};
pub use error::ApiError;
pub use models::{CreateVersionRequest, CreatedVersion, FileEntry, PageRequest};
