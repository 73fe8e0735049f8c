//! Service operations
//!
//! The four entry points the boundary layer calls with already-validated
//! in-memory parameters. Each transformation runs the same pipeline:
//! resolve input → parse → transform → serialize → allocate-and-write,
//! returning the new absolute output path. Nothing is cached; a document
//! lives for exactly one call.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::ServiceConfig;
use crate::document::{self, MidiDocument};
use crate::error::{Result, ServiceError};
use crate::output::OutputAllocator;
use crate::retrieval::{self, HardMatchReport};
use crate::transforms;

pub struct MidiToolService {
    allocator: OutputAllocator,
}

impl MidiToolService {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let allocator = OutputAllocator::new(config.output_dir)?;
        let swept =
            allocator.sweep_stale_temp_files(Duration::from_secs(config.stale_temp_max_age_secs));
        if swept > 0 {
            log::info!(
                "swept {swept} stale temp file(s) from {}",
                allocator.dir().display()
            );
        }
        Ok(Self { allocator })
    }

    /// Directory receiving all generated output files.
    pub fn output_dir(&self) -> &Path {
        self.allocator.dir()
    }

    /// Scale playback speed by `ratio` (2.0 halves the duration) and
    /// write the result as a new file.
    pub fn change_tempo(&self, path: &Path, ratio: f64) -> Result<PathBuf> {
        // Argument errors are detected before any file I/O.
        transforms::validate_ratio(ratio)?;
        log::info!("change_tempo: {} ratio={ratio}", path.display());
        let doc = load_document(path)?;
        let doc = transforms::scale_tempo(doc, ratio)?;
        self.write_output(path, "tempo", &doc)
    }

    /// Shift every note by `delta` semitones (clamped to the MIDI range)
    /// and write the result as a new file.
    pub fn transpose(&self, path: &Path, delta: i32) -> Result<PathBuf> {
        log::info!("transpose: {} delta={delta}", path.display());
        let doc = load_document(path)?;
        let doc = transforms::transpose(doc, delta);
        self.write_output(path, "transpose", &doc)
    }

    /// Convert straight eighth-note timing to swing timing and write the
    /// result as a new file.
    pub fn common_to_swing(&self, path: &Path) -> Result<PathBuf> {
        log::info!("common_to_swing: {}", path.display());
        let doc = load_document(path)?;
        let doc = transforms::to_swing(doc)?;
        self.write_output(path, "swing", &doc)
    }

    /// Find database files containing the query excerpt's note pattern.
    pub fn hard_match(&self, database_dir: &Path, query_path: &Path) -> Result<HardMatchReport> {
        log::info!(
            "hard_match: database={} query={}",
            database_dir.display(),
            query_path.display()
        );
        retrieval::ensure_database_dir(database_dir)?;
        let query = load_document(query_path)?;
        retrieval::hard_match(database_dir, &query)
    }

    fn write_output(&self, input: &Path, suffix: &str, doc: &MidiDocument) -> Result<PathBuf> {
        let bytes = document::write_bytes(doc)?;
        let prefix = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "midi".to_string());
        let output = self.allocator.allocate_and_write(&prefix, suffix, &bytes)?;
        log::info!("wrote {}", output.display());
        Ok(output)
    }
}

/// Read and parse a caller-supplied MIDI path.
fn load_document(path: &Path) -> Result<MidiDocument> {
    if !path.exists() {
        return Err(ServiceError::NotFound(format!(
            "path not found: {}",
            path.display()
        )));
    }
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            ServiceError::NotFound(format!("path not found: {}", path.display()))
        }
        _ => ServiceError::Internal(format!("failed to read {}: {e}", path.display())),
    })?;
    let doc = document::parse_bytes(&bytes)?;
    log::debug!(
        "parsed {}: {} track(s), {} note(s)",
        path.display(),
        doc.tracks.len(),
        doc.note_count()
    );
    Ok(doc)
}
