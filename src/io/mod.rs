pub mod document_io;

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Prefix of the scratch files `atomic_write` leaves behind while in flight.
pub(crate) const TEMP_FILE_PREFIX: &str = ".tmp";

pub(crate) fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp_file = NamedTempFile::with_prefix_in(TEMP_FILE_PREFIX, parent)?;
    temp_file.write_all(content)?;
    temp_file.as_file().sync_all()?;

    match temp_file.persist(path) {
        Ok(_) => Ok(()),
        Err(err) => {
            if err.error.kind() == io::ErrorKind::AlreadyExists {
                std::fs::remove_file(path)?;
                err.file.persist(path).map(|_| ()).map_err(|e| e.error)
            } else {
                Err(err.error)
            }
        }
    }
}
