//! Whole-file change detection against a remote [`Datum`].
//!
//! Precedence, first match wins:
//! 1. `Changed(Size)` when the byte sizes differ
//! 2. `Changed(Hash(algo))` on the first recorded hash that does not match,
//!    checked in [`HashAlgorithm::PREFERENCE`] order
//! 3. `Unknown` when the size matches but the remote records no hash at all
//! 4. `Unchanged`
//!
//! Local digests are computed lazily, at most once per algorithm, by streaming
//! the file in fixed-size chunks.

use std::cell::OnceCell;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use versioner_core::{Datum, HashAlgorithm};

use crate::error::{io_err, SyncError};

const READ_CHUNK: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// LocalFile
// ---------------------------------------------------------------------------

/// A regular file in the local content directory.
#[derive(Debug)]
pub struct LocalFile {
    name: String,
    path: PathBuf,
    size: u64,
    digests: [OnceCell<String>; 3],
}

impl LocalFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            size,
            digests: Default::default(),
        }
    }

    /// Stat `path` and build a `LocalFile` named after its final component.
    pub fn from_path(path: &Path) -> Result<Self, SyncError> {
        let meta = std::fs::metadata(path).map_err(|e| io_err(path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, path, meta.len()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Lowercase hex digest of the file contents, computed on first use.
    pub fn digest(&self, algorithm: HashAlgorithm) -> Result<&str, SyncError> {
        let cell = &self.digests[slot(algorithm)];
        if let Some(digest) = cell.get() {
            return Ok(digest);
        }
        let computed = hash_file(&self.path, algorithm)?;
        Ok(cell.get_or_init(|| computed))
    }
}

fn slot(algorithm: HashAlgorithm) -> usize {
    match algorithm {
        HashAlgorithm::Md5 => 0,
        HashAlgorithm::Sha1 => 1,
        HashAlgorithm::Sha256 => 2,
    }
}

/// Stream `path` through `algorithm` and return the lowercase hex digest.
pub fn hash_file(path: &Path, algorithm: HashAlgorithm) -> Result<String, SyncError> {
    let file = File::open(path).map_err(|e| io_err(path, e))?;
    let digest = match algorithm {
        HashAlgorithm::Md5 => hash_reader::<Md5>(file),
        HashAlgorithm::Sha1 => hash_reader::<Sha1>(file),
        HashAlgorithm::Sha256 => hash_reader::<Sha256>(file),
    };
    digest.map_err(|e| io_err(path, e))
}

fn hash_reader<D: Digest>(mut reader: impl Read) -> std::io::Result<String> {
    let mut hasher = D::new();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let read = reader.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Why a local file differs from its remote record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeReason {
    Size,
    Hash(HashAlgorithm),
}

impl fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeReason::Size => f.write_str("size changed"),
            ChangeReason::Hash(algo) => write!(f, "{algo} changed"),
        }
    }
}

/// Outcome of comparing one local file with one remote record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeVerdict {
    Unchanged,
    Changed(ChangeReason),
    /// Sizes match but the remote carries no recognized hash to compare.
    Unknown,
}

/// Compare `local` against `remote`. Reads local bytes only; no network.
pub fn classify(local: &LocalFile, remote: &Datum) -> Result<ChangeVerdict, SyncError> {
    if local.size() != remote.size {
        return Ok(ChangeVerdict::Changed(ChangeReason::Size));
    }

    let mut compared = false;
    for (algorithm, recorded) in remote.recorded_hashes() {
        compared = true;
        if !local.digest(algorithm)?.eq_ignore_ascii_case(recorded) {
            return Ok(ChangeVerdict::Changed(ChangeReason::Hash(algorithm)));
        }
    }

    if compared {
        Ok(ChangeVerdict::Unchanged)
    } else {
        Ok(ChangeVerdict::Unknown)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
