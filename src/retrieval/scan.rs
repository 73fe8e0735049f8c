//! Database directory scan and window matching
//!
//! Candidates are enumerated non-recursively in filesystem order and
//! parsed independently; a candidate that fails to parse is recorded and
//! skipped, never aborting the whole retrieval.

use std::fs;
use std::path::{Path, PathBuf};

use crate::document::{parse_bytes, MidiDocument, NoteSpan};
use crate::error::{Result, ServiceError};
use crate::retrieval::pattern::{query_pattern, relative_to, NoteTriple};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedCandidate {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HardMatchReport {
    /// Matched file paths in database enumeration order.
    pub matches: Vec<PathBuf>,
    /// Candidates that could not be scanned, with the reason each was
    /// skipped.
    pub skipped: Vec<SkippedCandidate>,
}

/// Validate the database directory precondition before any scanning.
pub fn ensure_database_dir(database_dir: &Path) -> Result<()> {
    if !database_dir.exists() {
        return Err(ServiceError::NotFound(format!(
            "database directory not found: {}",
            database_dir.display()
        )));
    }
    if !database_dir.is_dir() {
        return Err(ServiceError::InvalidArgument(format!(
            "database path is not a directory: {}",
            database_dir.display()
        )));
    }
    Ok(())
}

/// Find all database files containing the query's note pattern verbatim
/// (modulo transposition and position).
pub fn hard_match(database_dir: &Path, query: &MidiDocument) -> Result<HardMatchReport> {
    ensure_database_dir(database_dir)?;

    let mut report = HardMatchReport::default();
    let Some(pattern) = query_pattern(query) else {
        log::warn!("query contains no notes, returning no matches");
        return Ok(report);
    };

    let entries = fs::read_dir(database_dir).map_err(|e| {
        ServiceError::Internal(format!(
            "failed to enumerate {}: {e}",
            database_dir.display()
        ))
    })?;
    let mut scanned = 0usize;
    for entry in entries {
        let entry = entry.map_err(|e| {
            ServiceError::Internal(format!(
                "failed to enumerate {}: {e}",
                database_dir.display()
            ))
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue; // top-level files only
        }
        match scan_candidate(&path, &pattern) {
            Ok(matched) => {
                scanned += 1;
                if matched {
                    report.matches.push(path);
                }
            }
            Err(reason) => {
                log::warn!("skipping candidate {}: {reason}", path.display());
                report.skipped.push(SkippedCandidate { path, reason });
            }
        }
    }

    log::info!(
        "hard match: {} of {scanned} scanned candidates matched ({} skipped)",
        report.matches.len(),
        report.skipped.len()
    );
    Ok(report)
}

fn scan_candidate(path: &Path, pattern: &[NoteTriple]) -> std::result::Result<bool, String> {
    let bytes = fs::read(path).map_err(|e| format!("unreadable: {e}"))?;
    let doc = parse_bytes(&bytes).map_err(|e| e.to_string())?;
    Ok(document_contains(&doc, pattern))
}

fn document_contains(doc: &MidiDocument, pattern: &[NoteTriple]) -> bool {
    doc.tracks
        .iter()
        .any(|track| track_contains(&track.note_spans(), pattern))
}

/// Slide a window anchored at every note; one qualifying window suffices.
fn track_contains(notes: &[NoteSpan], pattern: &[NoteTriple]) -> bool {
    if pattern.is_empty() || notes.len() < pattern.len() {
        return false;
    }
    for start in 0..=(notes.len() - pattern.len()) {
        let anchor = notes[start];
        let matched = pattern
            .iter()
            .enumerate()
            .all(|(offset, want)| relative_to(&notes[start + offset], &anchor) == *want);
        if matched {
            return true;
        }
    }
    false
}
