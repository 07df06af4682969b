//! Run parameters from `<config_dir>/parameters.json`.
//!
//! The file is optional. Keys are kebab-case:
//!
//! ```json
//! {
//!   "dataset-id": "0189...",
//!   "new-file-names": ["file1.csv", "file2.csv"],
//!   "new-file-contents": ["foofoo", "barbar"]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ParamsError;
use crate::types::DatasetId;

pub const PARAMETERS_FILENAME: &str = "parameters.json";

/// Parameters recognized by the reconcile phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Parameters {
    #[serde(default)]
    pub dataset_id: Option<String>,
    /// Names written by the synthetic content generator.
    #[serde(default = "default_new_file_names")]
    pub new_file_names: Vec<String>,
    /// Contents cycled over `new_file_names` by the generator.
    #[serde(default = "default_new_file_contents")]
    pub new_file_contents: Vec<String>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            dataset_id: None,
            new_file_names: default_new_file_names(),
            new_file_contents: default_new_file_contents(),
        }
    }
}

impl Parameters {
    /// `<config_dir>/parameters.json`. Pure, no I/O.
    pub fn path_in(config_dir: &Path) -> PathBuf {
        config_dir.join(PARAMETERS_FILENAME)
    }

    /// Load parameters from `config_dir`, falling back to defaults when the
    /// file does not exist.
    pub fn load_at(config_dir: &Path) -> Result<Self, ParamsError> {
        let path = Self::path_in(config_dir);
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "no parameters file, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| ParamsError::Io {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_str(&contents).map_err(|e| ParamsError::Parse { path, source: e })
    }

    /// The dataset to reconcile against; blank values count as missing.
    pub fn dataset_id(&self) -> Result<DatasetId, ParamsError> {
        match self.dataset_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Ok(DatasetId::from(id)),
            _ => Err(ParamsError::MissingDatasetId),
        }
    }
}

fn default_new_file_names() -> Vec<String> {
    vec![
        "file1.csv".to_string(),
        "file2.csv".to_string(),
        "file3.csv".to_string(),
    ]
}

fn default_new_file_contents() -> Vec<String> {
    vec!["foofoo".to_string(), "barbar".to_string()]
}
