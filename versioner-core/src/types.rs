//! Domain types for the dataset storage service.
//!
//! Records mirror the service's JSON shapes; unknown fields are ignored on
//! deserialization so newer service versions do not break older clients.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_id!(
    /// Opaque identity of a dataset.
    DatasetId
);
string_id!(
    /// Opaque identity of a dataset version.
    VersionId
);
string_id!(
    /// Opaque identity of a single stored file record.
    DatumId
);
string_id!(
    /// Identity of the execution that produced a set of outputs.
    ExecutionId
);

// ---------------------------------------------------------------------------
// Hash algorithms
// ---------------------------------------------------------------------------

/// Content hash algorithms the service may record on a [`Datum`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    /// Comparison order: the fast hash first, then progressively stronger ones.
    pub const PREFERENCE: [HashAlgorithm; 3] =
        [HashAlgorithm::Md5, HashAlgorithm::Sha1, HashAlgorithm::Sha256];

    /// Field name used by the service (`md5`, `sha1`, `sha256`).
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A remotely stored file record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datum {
    pub id: DatumId,
    /// Unique within a version.
    pub name: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl Datum {
    /// The recorded hex digest for `algorithm`, if the service has one.
    ///
    /// Empty strings are treated the same as a missing hash.
    pub fn recorded_hash(&self, algorithm: HashAlgorithm) -> Option<&str> {
        let value = match algorithm {
            HashAlgorithm::Md5 => self.md5.as_deref(),
            HashAlgorithm::Sha1 => self.sha1.as_deref(),
            HashAlgorithm::Sha256 => self.sha256.as_deref(),
        };
        value.filter(|digest| !digest.is_empty())
    }

    /// Every recorded hash, in [`HashAlgorithm::PREFERENCE`] order.
    pub fn recorded_hashes(&self) -> impl Iterator<Item = (HashAlgorithm, &str)> + '_ {
        HashAlgorithm::PREFERENCE
            .into_iter()
            .filter_map(|algo| self.recorded_hash(algo).map(|digest| (algo, digest)))
    }
}

/// One membership entry of a [`DatasetVersion`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionFile {
    pub datum: Datum,
}

/// Reference to a version by id, as embedded in other records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRef {
    pub id: VersionId,
}

/// An immutable, named snapshot of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetVersion {
    pub id: VersionId,
    pub name: String,
    #[serde(default)]
    pub files: Vec<VersionFile>,
}

impl DatasetVersion {
    /// The data records contained in this version.
    pub fn datums(&self) -> impl Iterator<Item = &Datum> + '_ {
        self.files.iter().map(|f| &f.datum)
    }
}

/// A dataset and a pointer to its latest version (absent for a fresh dataset).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: DatasetId,
    pub name: String,
    #[serde(default)]
    pub latest_version: Option<VersionRef>,
}

/// A data item as listed by the execution-output query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataItem {
    pub id: DatumId,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
