//! # versioner-sync
//!
//! Reconciles a local content directory against the latest dataset version
//! and composes the next version.
//!
//! Phase 1 ([`pipeline::reconcile_phase`]) compares, moves uploads into the
//! outputs directory and hands off through a [`VersionComposer`]. Phase 2
//! ([`pipeline::publish_phase`]) reads the manifest and publishes through the
//! storage API.

pub mod change;
pub mod compose;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod publish;
pub mod reconcile;
pub mod remote;

pub use change::{classify, ChangeReason, ChangeVerdict, LocalFile};
pub use compose::{Composition, ManifestHandoff, SidecarComposer, VersionComposer};
pub use error::SyncError;
pub use generate::generate_content;
pub use output::move_uploads;
pub use pipeline::{publish_phase, reconcile_phase, Phase1Report, ReconcileRequest};
pub use publish::VersionPublisher;
pub use reconcile::{reconcile, Decision, ReconciliationResult, UploadCause};
pub use remote::{latest_version, LatestVersion};
