//! Synthetic content generator used when no content directory is given.

use std::path::Path;

use tempfile::TempDir;

use versioner_core::Parameters;

use crate::error::{io_err, SyncError};

/// Write each of `params.new_file_names` into a fresh temporary directory,
/// cycling through `params.new_file_contents`.
///
/// The directory is removed when the returned guard drops.
pub fn generate_content(params: &Parameters) -> Result<TempDir, SyncError> {
    for name in &params.new_file_names {
        validate_name(name)?;
    }

    let dir = tempfile::Builder::new()
        .prefix("versioner-content-")
        .tempdir()
        .map_err(|e| io_err(std::env::temp_dir(), e))?;

    let contents = params.new_file_contents.iter().map(String::as_str);
    let mut cycle = contents.cycle();
    for name in &params.new_file_names {
        let body = cycle.next().unwrap_or("");
        let path = dir.path().join(name);
        std::fs::write(&path, body).map_err(|e| io_err(&path, e))?;
    }
    tracing::info!(
        dir = %dir.path().display(),
        files = params.new_file_names.len(),
        "generated content"
    );
    Ok(dir)
}

fn validate_name(name: &str) -> Result<(), SyncError> {
    let plain = Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name);
    if plain && name != "." && name != ".." {
        Ok(())
    } else {
        Err(SyncError::InvalidFileName(name.to_string()))
    }
}
