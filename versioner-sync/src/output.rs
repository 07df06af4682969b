//! Hand uploaded files over to the outputs directory.
//!
//! Files are moved, not copied: after [`move_uploads`] returns, the content
//! directory no longer holds the uploaded files and only the returned
//! destination paths are valid.

use std::path::{Path, PathBuf};

use crate::error::{io_err, SyncError};
use crate::reconcile::ReconciliationResult;

/// Move every `Upload` decision's file to `<outputs_dir>/<name>`.
///
/// Returns the destination paths in name order. Files that already live at
/// their destination are left in place.
pub fn move_uploads(
    result: &ReconciliationResult,
    outputs_dir: &Path,
) -> Result<Vec<PathBuf>, SyncError> {
    std::fs::create_dir_all(outputs_dir).map_err(|e| io_err(outputs_dir, e))?;

    let mut moved = Vec::new();
    for (name, source) in result.to_upload() {
        let destination = outputs_dir.join(name);
        if source != destination {
            move_file(source, &destination)?;
            tracing::debug!(
                from = %source.display(),
                to = %destination.display(),
                "moved upload into outputs"
            );
        }
        moved.push(destination);
    }
    Ok(moved)
}

/// Rename `from` to `to`, falling back to copy + remove when a rename is not
/// possible (e.g. the two paths are on different filesystems).
pub(crate) fn move_file(from: &Path, to: &Path) -> Result<(), SyncError> {
    let Err(rename_err) = std::fs::rename(from, to) else {
        return Ok(());
    };
    if !from.is_file() {
        return Err(io_err(from, rename_err));
    }

    if let Err(e) = std::fs::copy(from, to) {
        let _ = std::fs::remove_file(to);
        return Err(io_err(to, e));
    }
    std::fs::remove_file(from).map_err(|e| io_err(from, e))
}
