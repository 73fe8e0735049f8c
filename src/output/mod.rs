//! Output path allocation and atomic writes
//!
//! Every transformation result lands in the configured output directory
//! under a generated, collision-resistant name. Bytes are written to a
//! temporary file in the same directory, flushed durably, then renamed
//! into place without overwriting: a file is either fully present under
//! its final name or not present at all.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::error::{Result, ServiceError};

/// Collision retries before giving up. With 8 hex characters of a v4
/// UUID per attempt, exhausting this budget is structurally near
/// impossible; it is reported as OutputConflict rather than retried
/// forever.
const MAX_NAME_ATTEMPTS: u32 = 16;

/// Prefix of in-flight temporary files, never exposed to callers.
const TEMP_PREFIX: &str = ".tmp-";

const OUTPUT_EXTENSION: &str = "mid";

#[derive(Debug)]
pub struct OutputAllocator {
    dir: PathBuf,
}

impl OutputAllocator {
    /// Create the output directory if needed and resolve it to an
    /// absolute path; callers only ever observe absolute paths.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            ServiceError::Internal(format!(
                "failed to create output directory {}: {e}",
                dir.display()
            ))
        })?;
        let dir = dir.canonicalize().map_err(|e| {
            ServiceError::Internal(format!(
                "failed to resolve output directory {}: {e}",
                dir.display()
            ))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` under a fresh `{prefix}-{suffix}-{id}.mid` name and
    /// return the final absolute path once the atomic rename succeeded.
    pub fn allocate_and_write(
        &self,
        logical_prefix: &str,
        suffix: &str,
        bytes: &[u8],
    ) -> Result<PathBuf> {
        let mut tmp = self.write_temp(bytes)?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let final_path = self.dir.join(format!(
                "{logical_prefix}-{suffix}-{}.{OUTPUT_EXTENSION}",
                short_unique_id()
            ));
            match tmp.persist_noclobber(&final_path) {
                Ok(_) => return Ok(final_path),
                Err(err) if err.error.kind() == std::io::ErrorKind::AlreadyExists => {
                    log::warn!(
                        "output name collision at {}, retrying with a new name",
                        final_path.display()
                    );
                    tmp = err.file;
                }
                // The temp file is dropped (and deleted) on the way out,
                // so nothing half-written stays visible.
                Err(err) => {
                    return Err(ServiceError::Internal(format!(
                        "failed to finalize {}: {}",
                        final_path.display(),
                        err.error
                    )))
                }
            }
        }
        Err(ServiceError::OutputConflict(format!(
            "gave up allocating a unique name under {} after {MAX_NAME_ATTEMPTS} attempts",
            self.dir.display()
        )))
    }

    fn write_temp(&self, bytes: &[u8]) -> Result<NamedTempFile> {
        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&self.dir)
            .map_err(|e| ServiceError::Internal(format!("failed to create temp file: {e}")))?;
        fill_temp(&mut tmp, bytes)
            .map_err(|e| ServiceError::Internal(format!("failed to write output bytes: {e}")))?;
        Ok(tmp)
    }

    /// Remove leftover temporary files from crashed runs. Files younger
    /// than `max_age` may belong to an in-flight write and are left
    /// alone. Returns the number of files removed.
    pub fn sweep_stale_temp_files(&self, max_age: Duration) -> usize {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("temp sweep skipped, cannot read {}: {e}", self.dir.display());
                return 0;
            }
        };
        let mut removed = 0;
        for entry in entries.flatten() {
            let name = entry.file_name();
            if !name.to_string_lossy().starts_with(TEMP_PREFIX) {
                continue;
            }
            let stale = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .ok()
                .and_then(|modified| modified.elapsed().ok())
                .map(|age| age >= max_age)
                .unwrap_or(false);
            if stale && fs::remove_file(entry.path()).is_ok() {
                log::debug!("swept stale temp file {}", entry.path().display());
                removed += 1;
            }
        }
        removed
    }
}

/// Write, flush and durably sync before the rename makes the file visible.
fn fill_temp(tmp: &mut NamedTempFile, bytes: &[u8]) -> std::io::Result<()> {
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.as_file().sync_all()
}

fn short_unique_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}
