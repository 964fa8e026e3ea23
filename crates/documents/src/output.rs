use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::info;

use crate::error::DocumentError;

/// Writes `bytes` to `dir/file_name` through a temporary file in the same
/// directory, so readers only ever see a complete document.
pub fn write_atomically(
    dir: &Path,
    file_name: &str,
    bytes: &[u8],
) -> Result<PathBuf, DocumentError> {
    fs::create_dir_all(dir)?;
    let destination = dir.join(file_name);

    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    staged.persist(&destination).map_err(|error| DocumentError::Io(error.error))?;

    info!(
        event_name = "documents.output.written",
        path = %destination.display(),
        size = bytes.len(),
        "document written"
    );
    Ok(destination)
}
