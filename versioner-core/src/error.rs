//! Error types for versioner-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while writing or locating a handoff manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest exists but is not valid manifest JSON.
    #[error("failed to parse manifest at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No manifest candidate was delivered to the input directory.
    #[error("no manifest file found in {dir}")]
    NotFound { dir: PathBuf },

    /// More than one candidate was delivered; picking one would be a guess.
    #[error("expected exactly one manifest in {dir}, found {}: {}", candidates.len(), display_paths(candidates))]
    Ambiguous {
        dir: PathBuf,
        candidates: Vec<PathBuf>,
    },
}

/// Errors raised while loading run parameters.
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `parameters.json` exists but could not be parsed.
    #[error("failed to parse parameters at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No `dataset-id` parameter was supplied (or it was blank).
    #[error("no dataset ID provided")]
    MissingDatasetId,
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
